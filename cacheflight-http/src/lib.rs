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

//! An HTTP response-caching adapter over [`cacheflight_core::Cache`].
//!
//! Wraps a downstream [`Handler`] so that repeated idempotent requests
//! within a TTL window are served from memory instead of reaching the
//! downstream handler again.

pub mod error;
pub mod handler;
pub mod response;
pub mod writer;

pub use error::ExpiresParseError;
pub use handler::{new_handler, new_middleware, CachingHandler, Handler, HandlerConfig, KeyFn};
pub use response::CachedResponse;
pub use writer::{CaptureWriter, ResponseWriter};
