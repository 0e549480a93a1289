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

//! Typed errors surfaced by this binary's own argument validation. Anything
//! coming out of a library dependency is threaded through as `anyhow::Error`
//! at the call site instead of being wrapped here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("--threads must be at least 1")]
    ZeroThreads,
    #[error("--keys must be at least 1")]
    ZeroKeys,
}
