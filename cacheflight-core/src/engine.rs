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

//! The cache engine: lookup-or-compute, insertion, removal, and iteration
//! over a single mutex-guarded [`Inner`], coalescing concurrent computations
//! for the same key through one shared condition variable.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use cacheflight_common::time::checked_deadline;
use cacheflight_common::Value;

use crate::inner::Inner;

/// A bounded, TTL'd, single-flight in-memory cache.
///
/// `max_size` is a capacity bound in caller-chosen units (bytes, rows, a
/// flat count of 1 per entry, the engine never interprets it, only sums
/// and compares it). `V` is opaque to the engine; see [`Value`].
pub struct Cache<V: Value> {
    inner: Mutex<Inner<V>>,
    condvar: Condvar,
}

impl<V: Value> Cache<V> {
    /// Builds an empty engine. `max_size` may be zero (every sized entry is
    /// evicted at the next sweep) or arbitrarily large; no background
    /// threads are started.
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::new(max_size)),
            condvar: Condvar::new(),
        }
    }

    /// Current aggregate size of all indexed entries.
    pub fn usage(&self) -> usize {
        self.inner.lock().used_size
    }

    /// The configured capacity bound.
    pub fn capacity(&self) -> usize {
        self.inner.lock().max_size
    }

    /// Number of indexed entries, including ones still being computed.
    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain lookup, with no compute closure to fall back on. Returns `None`
    /// on a miss without mutating any state.
    pub fn get(&self, key: &str) -> Option<V> {
        self.resolve(key, None::<fn() -> (V, Duration, usize)>)
    }

    /// Lookup-or-compute. If `key` is missing or expired, `compute` runs
    /// exactly once across however many concurrent callers race on the same
    /// key; everyone observes the same resulting value.
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> (V, Duration, usize),
    {
        self.resolve(key, Some(compute))
            .expect("a present compute closure always yields a value")
    }

    fn resolve<F>(&self, key: &str, mut compute: Option<F>) -> Option<V>
    where
        F: FnOnce() -> (V, Duration, usize),
    {
        loop {
            let mut guard = self.inner.lock();
            let now = Instant::now();

            if let Some(ptr) = guard.index.get(key).copied() {
                // SAFETY: `ptr` came from the index we're holding the lock
                // for; it stays valid for the rest of this block.
                let computing = unsafe { ptr.as_ref().is_computing() };
                if computing {
                    unsafe {
                        (&mut *ptr.as_ptr()).waiters += 1;
                    }
                    self.condvar.wait(&mut guard);
                    unsafe {
                        guard.dec_waiter_or_reap(key, ptr);
                    }
                    continue;
                }

                let expired = unsafe { ptr.as_ref().is_expired(now) };
                if expired {
                    let evicted = unsafe { guard.evict(ptr) };
                    if !evicted {
                        // An expired entry never has waiters while it sits
                        // idle, so this should be unreachable; kept as a
                        // defensive fallback rather than asserted.
                        let value = unsafe { ptr.as_ref().value.clone() };
                        return value;
                    }
                    // Fall through to the miss path below: `key` is absent now.
                } else {
                    guard.move_to_head(ptr);
                    let value = unsafe { ptr.as_ref().value.clone() };
                    return value;
                }
            }

            // Absent, or just evicted for having expired.
            let Some(f) = compute.take() else {
                return None;
            };

            let ptr = unsafe { guard.insert_computing(key) };
            drop(guard);

            match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok((value, ttl, size)) => {
                    let mut guard = self.inner.lock();
                    let now = Instant::now();
                    let waiting = unsafe {
                        let e = &mut *ptr.as_ptr();
                        e.value = Some(value.clone());
                        e.expiration = Some(checked_deadline(now, ttl));
                        e.size = size;
                        e.waiters -= 1;
                        e.waiters > 0
                    };
                    guard.used_size += size;
                    if waiting {
                        self.condvar.notify_all();
                    }
                    unsafe {
                        guard.sweep(now);
                    }
                    tracing::trace!(key, size, "cacheflight: computed and inserted entry");
                    return Some(value);
                }
                Err(payload) => {
                    let mut guard = self.inner.lock();
                    // `fail_computing` unlinks and de-indexes immediately so
                    // every future lookup sees `key` as absent; it only frees
                    // the entry itself once the last waiter has let go of it
                    // (see `dec_waiter_or_reap`), since those waiters hold
                    // the same raw pointer across their `condvar.wait`.
                    let had_other_waiters = unsafe { guard.fail_computing(key, ptr) };
                    drop(guard);
                    if had_other_waiters {
                        self.condvar.notify_all();
                    }
                    tracing::debug!(key, "cacheflight: compute panicked, entry released");
                    panic::resume_unwind(payload);
                }
            }
        }
    }

    /// Unconditional insert/overwrite. Overwrites a ready entry in place, or
    /// participates as a waiter if the key is mid-computation, then inserts.
    /// Also runs a capacity sweep afterwards, same as the compute path.
    pub fn put(&self, key: &str, value: V, size: usize, ttl: Duration) {
        loop {
            let mut guard = self.inner.lock();
            let now = Instant::now();

            if let Some(ptr) = guard.index.get(key).copied() {
                let computing = unsafe { ptr.as_ref().is_computing() };
                if computing {
                    unsafe {
                        (&mut *ptr.as_ptr()).waiters += 1;
                    }
                    self.condvar.wait(&mut guard);
                    unsafe {
                        guard.dec_waiter_or_reap(key, ptr);
                    }
                    continue;
                }

                unsafe {
                    let old_size = ptr.as_ref().size;
                    guard.used_size -= old_size;
                    let e = &mut *ptr.as_ptr();
                    e.value = Some(value);
                    e.expiration = Some(checked_deadline(now, ttl));
                    e.size = size;
                    guard.used_size += size;
                    guard.move_to_head(ptr);
                }
            } else {
                unsafe {
                    let boxed = Box::new(crate::entry::Entry::ready(
                        key.to_owned(),
                        value,
                        checked_deadline(now, ttl),
                        size,
                    ));
                    let ptr = std::ptr::NonNull::new_unchecked(Box::into_raw(boxed));
                    guard.push_front(ptr);
                    guard.index.insert(key.to_owned(), ptr);
                    guard.used_size += size;
                }
            }

            unsafe {
                guard.sweep(now);
            }
            return;
        }
    }

    /// Removes a key. Returns whether it was present *and* evictable (an
    /// entry with waiters is refused).
    pub fn remove(&self, key: &str) -> bool {
        let mut guard = self.inner.lock();
        match guard.index.get(key).copied() {
            None => false,
            Some(ptr) => unsafe { guard.evict(ptr) },
        }
    }

    /// Calls `callback` once per ready entry, in recency order, with the
    /// lock held for the whole pass. Expired entries with no waiters are
    /// evicted lazily along the way.
    pub fn for_each<F>(&self, mut callback: F)
    where
        F: FnMut(&str, &V),
    {
        let mut guard = self.inner.lock();
        let now = Instant::now();

        let mut cursor = guard.head;
        while let Some(ptr) = cursor {
            let next = unsafe { ptr.as_ref().next };
            let is_computing = unsafe { ptr.as_ref().is_computing() };
            if !is_computing {
                let expired = unsafe { ptr.as_ref().is_expired(now) };
                let waiters = unsafe { ptr.as_ref().waiters };
                if expired && waiters == 0 {
                    unsafe {
                        guard.evict(ptr);
                    }
                } else if !expired {
                    let key = unsafe { ptr.as_ref().key.clone() };
                    let value = unsafe { ptr.as_ref().value.clone().unwrap() };
                    callback(&key, &value);
                }
            }
            cursor = next;
        }

        guard.assert_invariants();
    }
}
