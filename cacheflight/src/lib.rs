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

//! `cacheflight` is the top-level facade over the workspace: a bounded,
//! TTL'd, single-flight in-memory cache engine ([`core`]) plus an HTTP
//! response-caching adapter built on it ([`http`]).
//!
//! Most users only need the re-exports at the crate root; the module paths
//! are kept around for call sites that prefer to name them explicitly.

pub mod core {
    pub use cacheflight_core::*;
}

pub mod http {
    pub use cacheflight_http::*;
}

pub use cacheflight_core::{Cache, CacheBuilder};
pub use cacheflight_http::{new_handler, new_middleware, CachingHandler, Handler, HandlerConfig};
