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

//! End-to-end scenarios straight out of the spec's testable-properties
//! section: cache hits skipping the closure, TTL expiry, LRU eviction under
//! capacity pressure, single-flight coalescing under contention, and
//! compute-panic recovery.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use cacheflight_core::Cache;

#[test_log::test]
fn hit_skips_closure() {
    let cache: Cache<&'static str> = Cache::new(1024);

    let first = cache.get_or_compute("foo", || ("bar", Duration::from_secs(1), 0));
    assert_eq!(first, "bar");

    let second = cache.get_or_compute("foo", || {
        panic!("closure must not run on a live hit")
    });
    assert_eq!(second, "bar");
}

#[test_log::test]
fn ttl_expiry_forces_recompute() {
    let cache: Cache<&'static str> = Cache::new(1024);

    cache.get_or_compute("foo", || ("bar", Duration::from_millis(5), 0));
    cache.get_or_compute("bar", || ("foo", Duration::from_millis(20), 0));

    thread::sleep(Duration::from_millis(10));

    let refreshed = cache.get_or_compute("foo", || ("baz", Duration::from_millis(0), 0));
    assert_eq!(refreshed, "baz");

    let still_live = cache.get_or_compute("bar", || panic!("bar must still be live"));
    assert_eq!(still_live, "foo");
}

#[test_log::test]
fn lru_eviction_under_pressure() {
    let cache: Cache<&'static str> = Cache::new(100);

    cache.get_or_compute("A", || ("a", Duration::from_secs(1), 50));
    cache.get_or_compute("B", || ("b", Duration::from_secs(1), 50));
    // Touch A then B so the recency order is A, B (B most recent) before C arrives.
    cache.get("A");
    cache.get("B");
    cache.get_or_compute("C", || ("c", Duration::from_secs(1), 50));
    // Touch B then C so A is the sole least-recently-used candidate.
    cache.get("B");
    cache.get("C");

    let evicted = cache.get_or_compute("A", || ("evicted", Duration::from_secs(1), 25));
    assert_eq!(evicted, "evicted");

    let mut seen = Vec::new();
    cache.for_each(|k, _| seen.push(k.to_owned()));
    seen.sort();
    assert_eq!(seen, vec!["A".to_owned(), "C".to_owned()]);
}

#[test_log::test]
fn single_flight_under_contention() {
    let cache: Arc<Cache<&'static str>> = Arc::new(Cache::new(1024));
    let counter = Arc::new(AtomicUsize::new(0));
    let threads = 4;
    let iterations = 2000;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let counter = Arc::clone(&counter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..iterations {
                    let value = cache.get_or_compute("key", || {
                        let entering = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        assert_eq!(entering, 1, "two computations overlapped for the same key");
                        thread::sleep(Duration::from_micros(200));
                        counter.fetch_sub(1, Ordering::SeqCst);
                        ("value", Duration::from_millis(3), 1)
                    });
                    assert_eq!(value, "value");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}

#[test_log::test]
fn compute_panic_releases_the_entry() {
    let cache: Cache<String> = Cache::new(1024);

    cache.put("bar", "baz".to_owned(), 3, Duration::from_secs(60));

    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        cache.get_or_compute("foo", || -> (String, Duration, usize) {
            panic!("boom")
        })
    }));
    assert!(result.is_err());

    let bar = cache.get_or_compute("bar", || panic!("bar must still be cached"));
    assert_eq!(bar, "baz");

    // No stale computing entry should remain for "foo": the closure panics
    // again rather than hanging forever waiting on a dead computation.
    let second = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        cache.get_or_compute("foo", || -> (String, Duration, usize) {
            panic!("boom again")
        })
    }));
    assert!(second.is_err());
}

#[test_log::test]
fn miss_without_closure_is_side_effect_free() {
    let cache: Cache<&'static str> = Cache::new(1024);
    assert_eq!(cache.get("missing"), None);
    assert_eq!(cache.len(), 0);
}

#[test_log::test]
fn delete_on_missing_key_is_a_no_op() {
    let cache: Cache<&'static str> = Cache::new(1024);
    assert!(!cache.remove("missing"));
}

#[test_log::test]
fn iterate_over_empty_cache_invokes_nothing() {
    let cache: Cache<&'static str> = Cache::new(1024);
    let mut calls = 0;
    cache.for_each(|_, _| calls += 1);
    assert_eq!(calls, 0);
}

#[test_log::test]
fn zero_size_entries_survive_capacity_pressure() {
    let cache: Cache<&'static str> = Cache::new(10);
    cache.put("a", "a", 0, Duration::from_secs(60));
    cache.put("b", "b", 20, Duration::from_secs(60));

    // The oversize "b" should be swept, "a" (zero size) must survive.
    assert_eq!(cache.get("a"), Some("a"));
}
