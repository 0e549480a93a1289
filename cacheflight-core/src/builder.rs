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

//! A small fluent builder in front of [`Cache::new`], for call sites that
//! read better with named fields than a single positional `max_size`.

use cacheflight_common::Value;

use crate::engine::Cache;

/// Builds a [`Cache`]. `max_size` is the only required setting, and there
/// is no default.
pub struct CacheBuilder {
    max_size: usize,
}

impl CacheBuilder {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn build<V: Value>(self) -> Cache<V> {
        Cache::new(self.max_size)
    }
}
