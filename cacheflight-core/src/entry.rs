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

//! The per-key entry record and its place in the recency list.
//!
//! Entries are heap-allocated once and addressed through raw pointers for
//! the lifetime they spend indexed: a doubly-linked list threaded through
//! the entries themselves, with the [`hashbrown`] index holding the other
//! end of the same pointers. This avoids a second allocation (an
//! indirection node) per cache entry and keeps list splicing O(1).

use std::ptr::NonNull;
use std::time::Instant;

use cacheflight_common::Value;

/// A single cache slot.
///
/// `expiration == None` is the "currently being computed" sentinel: no
/// other representation of that state exists, so a computing entry is
/// simply one whose deadline has not been assigned yet.
pub(crate) struct Entry<V: Value> {
    pub(crate) key: String,
    pub(crate) value: Option<V>,
    pub(crate) expiration: Option<Instant>,
    pub(crate) size: usize,
    pub(crate) waiters: usize,
    pub(crate) prev: Option<NonNull<Entry<V>>>,
    pub(crate) next: Option<NonNull<Entry<V>>>,
}

impl<V: Value> Entry<V> {
    pub(crate) fn computing(key: String) -> Self {
        Self {
            key,
            value: None,
            expiration: None,
            size: 0,
            waiters: 1,
            prev: None,
            next: None,
        }
    }

    pub(crate) fn ready(key: String, value: V, expiration: Instant, size: usize) -> Self {
        Self {
            key,
            value: Some(value),
            expiration: Some(expiration),
            size,
            waiters: 0,
            prev: None,
            next: None,
        }
    }

    /// Whether this entry's computation has not yet completed.
    pub(crate) fn is_computing(&self) -> bool {
        self.expiration.is_none()
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expiration, Some(exp) if exp <= now)
    }
}
