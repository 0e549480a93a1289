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

//! A synthetic workload driver over [`cacheflight_core::Cache`]: spawn a
//! pool of threads hammering a shared keyspace with `get_or_compute`, and
//! report how many lookups actually triggered a computation once they're
//! done (the rest were served from the cache).
//!
//! This plays the same role `foyer-bench` plays for the teacher's hybrid
//! cache: a hand-turned load generator rather than a criterion benchmark,
//! so it can be pointed at a given shape of contention from the command
//! line instead of a fixed `#[bench]` body.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use bytesize::ByteSize;
use rand::Rng;

use cacheflight_core::Cache;

use crate::error::CliError;
use crate::BenchArgs;

pub fn run(args: BenchArgs) -> Result<()> {
    if args.threads == 0 {
        return Err(CliError::ZeroThreads.into());
    }
    if args.keys == 0 {
        return Err(CliError::ZeroKeys.into());
    }

    let cache: Arc<Cache<u64>> = Arc::new(Cache::new(args.max_size));
    let computes = Arc::new(AtomicU64::new(0));
    let ttl = Duration::from_millis(args.ttl_ms);

    tracing::info!(
        threads = args.threads,
        keys = args.keys,
        iterations = args.iterations,
        max_size = %ByteSize(args.max_size as u64),
        ttl_ms = args.ttl_ms,
        "cacheflight-cli: starting bench"
    );

    let started = Instant::now();
    let handles: Vec<_> = (0..args.threads)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            let computes = Arc::clone(&computes);
            let keys = args.keys;
            let iterations = args.iterations;
            thread::Builder::new()
                .name(format!("cacheflight-bench-{worker}"))
                .spawn(move || {
                    let mut rng = rand::thread_rng();
                    for _ in 0..iterations {
                        let key = format!("key-{}", rng.gen_range(0..keys));
                        let computes = Arc::clone(&computes);
                        cache.get_or_compute(&key, move || {
                            computes.fetch_add(1, Ordering::Relaxed);
                            (rand::random::<u64>(), ttl, 1)
                        });
                    }
                })
                .expect("spawning a bench worker thread")
        })
        .collect();

    for handle in handles {
        handle.join().expect("bench worker thread panicked");
    }
    let elapsed = started.elapsed();

    let total = args.threads as u64 * args.iterations as u64;
    let computed = computes.load(Ordering::Relaxed);
    println!("cacheflight bench: {total} lookups across {} threads in {elapsed:?}", args.threads);
    println!(
        "  computed: {computed} ({:.2}% of lookups)",
        100.0 * computed as f64 / total as f64
    );
    println!("  final usage: {} / {}", cache.usage(), cache.capacity());

    Ok(())
}
