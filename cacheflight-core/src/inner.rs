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

//! Everything guarded by the engine's single mutex: the index, the recency
//! list, and the running size total. No method here takes a lock itself;
//! the caller in `engine.rs` holds it for the whole call.

use std::ptr::NonNull;
use std::time::Instant;

use hashbrown::HashMap;

use cacheflight_common::Value;

use crate::entry::Entry;

pub(crate) struct Inner<V: Value> {
    pub(crate) index: HashMap<String, NonNull<Entry<V>>>,
    pub(crate) head: Option<NonNull<Entry<V>>>,
    pub(crate) tail: Option<NonNull<Entry<V>>>,
    pub(crate) used_size: usize,
    pub(crate) max_size: usize,
}

// SAFETY: every `NonNull<Entry<V>>` reachable from `Inner` is exclusively owned
// by it (via `Box::into_raw`) for as long as it is indexed or listed, and all
// access to `Inner` happens through a `Mutex`, so there is never concurrent
// access to the pointee. `V: Send` is required by the `Value` bound on the
// entries those pointers address.
unsafe impl<V: Value> Send for Inner<V> {}

impl<V: Value> Inner<V> {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            index: HashMap::new(),
            head: None,
            tail: None,
            used_size: 0,
            max_size,
        }
    }

    /// Splices `ptr` in as the new recency-list head.
    pub(crate) unsafe fn push_front(&mut self, mut ptr: NonNull<Entry<V>>) {
        ptr.as_mut().prev = None;
        ptr.as_mut().next = self.head;
        if let Some(mut head) = self.head {
            head.as_mut().prev = Some(ptr);
        }
        self.head = Some(ptr);
        if self.tail.is_none() {
            self.tail = Some(ptr);
        }
    }

    /// Splices `ptr` out of the recency list. Does not touch `used_size` or
    /// the index.
    pub(crate) unsafe fn unlink(&mut self, mut ptr: NonNull<Entry<V>>) {
        let (prev, next) = {
            let e = ptr.as_ref();
            (e.prev, e.next)
        };
        match prev {
            Some(mut p) => p.as_mut().next = next,
            None => self.head = next,
        }
        match next {
            Some(mut n) => n.as_mut().prev = prev,
            None => self.tail = prev,
        }
        ptr.as_mut().prev = None;
        ptr.as_mut().next = None;
    }

    /// Moves an already-listed entry to the head, unless it is already there.
    pub(crate) unsafe fn move_to_head(&mut self, ptr: NonNull<Entry<V>>) {
        if self.head == Some(ptr) {
            return;
        }
        self.unlink(ptr);
        self.push_front(ptr);
    }

    pub(crate) unsafe fn insert_computing(&mut self, key: &str) -> NonNull<Entry<V>> {
        let boxed = Box::new(Entry::computing(key.to_owned()));
        let ptr = NonNull::new_unchecked(Box::into_raw(boxed));
        self.push_front(ptr);
        self.index.insert(key.to_owned(), ptr);
        ptr
    }

    /// Refuses (returns `false`) if the entry has waiters; otherwise unlinks
    /// it, subtracts its charge, drops it from the index, and frees the
    /// boxed entry.
    pub(crate) unsafe fn evict(&mut self, ptr: NonNull<Entry<V>>) -> bool {
        if ptr.as_ref().waiters > 0 {
            return false;
        }
        self.unlink(ptr);
        self.used_size -= ptr.as_ref().size;
        self.index.remove(ptr.as_ref().key.as_str());
        drop(Box::from_raw(ptr.as_ptr()));
        true
    }

    /// A sleeping waiter's wake-up side: decrement this entry's waiter
    /// count, then re-examine under the lock.
    ///
    /// "Re-examine" only means something if the entry we slept on is still
    /// alive. A failed compute (see [`Self::fail_computing`]) unlinks and
    /// de-indexes the entry it was running on while waiters may still be
    /// asleep referencing it through `ptr`, so it cannot free the memory out
    /// from under them. So: an entry that is no longer reachable from the
    /// index under `key` (by pointer identity, not just by key, since someone
    /// may already have inserted a fresh entry for the same key) is reaped here
    /// by whichever waiter happens to be the last to let go of it. An entry
    /// still reachable is untouched; the caller's next loop iteration will
    /// see its current (possibly now-ready) state.
    pub(crate) unsafe fn dec_waiter_or_reap(&mut self, key: &str, ptr: NonNull<Entry<V>>) {
        let still_indexed = self.index.get(key) == Some(&ptr);
        let e = &mut *ptr.as_ptr();
        e.waiters -= 1;
        if !still_indexed && e.waiters == 0 {
            drop(Box::from_raw(ptr.as_ptr()));
        }
    }

    /// The compute-panic cleanup path. Unlinks and de-indexes the entry
    /// immediately so every *future* lookup treats `key` as absent,
    /// but only frees it right away if no one is currently asleep on it;
    /// otherwise the last waiter to call [`Self::dec_waiter_or_reap`] frees
    /// it. Returns whether any other actor was (at the time of the failure)
    /// still waiting on this entry, so the caller knows whether waking the
    /// condition variable is worth the broadcast.
    pub(crate) unsafe fn fail_computing(&mut self, key: &str, ptr: NonNull<Entry<V>>) -> bool {
        self.unlink(ptr);
        self.index.remove(key);
        let e = &mut *ptr.as_ptr();
        let had_other_waiters = e.waiters > 1;
        e.waiters -= 1;
        if e.waiters == 0 {
            drop(Box::from_raw(ptr.as_ptr()));
        }
        had_other_waiters
    }

    /// Sweeps from the tail while over capacity. Evicts a candidate if it
    /// has no waiters and (it carries a nonzero charge or it is expired);
    /// otherwise moves on to its predecessor regardless.
    pub(crate) unsafe fn sweep(&mut self, now: Instant) {
        let mut cursor = self.tail;
        while self.used_size > self.max_size {
            let Some(candidate) = cursor else { break };
            let prev = candidate.as_ref().prev;
            let (waiters, size, expired) = {
                let e = candidate.as_ref();
                (e.waiters, e.size, e.is_expired(now))
            };
            if waiters == 0 && (size > 0 || expired) {
                self.evict(candidate);
            }
            cursor = prev;
        }
    }

    /// Walks the recency list checking it against the index and the running
    /// size total. A violation is an implementation bug, not a recoverable
    /// runtime state, so it aborts the process with a diagnostic instead of
    /// returning an `Err` the caller could paper over.
    pub(crate) fn assert_invariants(&self) {
        let mut count = 0usize;
        let mut size_sum = 0usize;
        let mut prev: Option<NonNull<Entry<V>>> = None;
        let mut cursor = self.head;
        while let Some(ptr) = cursor {
            // SAFETY: called with the engine lock held; every listed pointer
            // is a live, exclusively-owned entry.
            let e = unsafe { ptr.as_ref() };
            invariant(e.prev == prev, "recency list back-link broken");
            count += 1;
            size_sum += e.size;
            invariant(
                self.index.get(e.key.as_str()) == Some(&ptr),
                "listed entry missing from index",
            );
            prev = Some(ptr);
            cursor = e.next;
        }
        invariant(prev == self.tail, "recency list tail mismatch");
        invariant(count == self.index.len(), "index/list size mismatch");
        invariant(size_sum == self.used_size, "used_size mismatch");
    }
}

impl<V: Value> Drop for Inner<V> {
    fn drop(&mut self) {
        let mut cursor = self.head;
        while let Some(ptr) = cursor {
            // SAFETY: every listed entry was heap-allocated by us via
            // `Box::into_raw` and is dropped exactly once, here, as the
            // engine itself goes out of scope.
            unsafe {
                let next = ptr.as_ref().next;
                drop(Box::from_raw(ptr.as_ptr()));
                cursor = next;
            }
        }
    }
}

#[cold]
fn invariant(condition: bool, message: &str) {
    if !condition {
        eprintln!("cacheflight-core: invariant violated: {message}");
        std::process::abort();
    }
}
