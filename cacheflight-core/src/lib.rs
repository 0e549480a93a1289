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

//! A thread-safe, in-memory cache bounded by a caller-defined size metric,
//! with per-entry TTL expiration and single-flight coalescing of concurrent
//! computations for the same key.
//!
//! See [`Cache`] for the engine itself and [`CacheBuilder`] for its
//! constructor.

mod builder;
mod entry;
mod inner;

pub mod engine;

pub use builder::CacheBuilder;
pub use engine::Cache;
