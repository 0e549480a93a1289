//  Copyright 2024 cacheflight contributors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! Error types internal to the HTTP adapter.
//!
//! None of these ever reach a caller of [`crate::handler::Handler::handle`].
//! A malformed `Expires` header just falls back to the configured default
//! TTL. They exist so that fallible parsing inside the adapter goes
//! through `?` like everywhere else in this workspace, rather than a bare
//! `Option` chain.

use thiserror::Error;

/// Failure parsing an `Expires` response header as an HTTP-date.
#[derive(Debug, Error)]
pub enum ExpiresParseError {
    #[error("Expires header is not valid UTF-8")]
    NotUtf8,
    #[error("malformed Expires header {raw:?}: {source}")]
    Malformed { raw: String, source: httpdate::Error },
}
