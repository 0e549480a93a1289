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

//! `cacheflight`, a small demo/benchmark binary exercising the cache
//! engine and the HTTP response-caching adapter.

mod bench;
mod error;
mod http_demo;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cacheflight", about = "Exercise the cacheflight cache engine and HTTP adapter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hammer the cache engine with a concurrent synthetic workload.
    Bench(BenchArgs),
    /// Drive the HTTP response-caching adapter against an in-process origin.
    HttpDemo(HttpDemoArgs),
}

#[derive(clap::Args)]
pub struct BenchArgs {
    /// Number of worker threads.
    #[arg(long, default_value_t = 4)]
    pub threads: usize,
    /// Size of the keyspace each worker draws from.
    #[arg(long, default_value_t = 64)]
    pub keys: usize,
    /// Lookups performed by each worker.
    #[arg(long, default_value_t = 20_000)]
    pub iterations: u64,
    /// Engine capacity, in entries (one unit of size per entry here).
    #[arg(long, default_value_t = 32)]
    pub max_size: usize,
    /// Per-entry TTL, in milliseconds.
    #[arg(long, default_value_t = 5)]
    pub ttl_ms: u64,
}

#[derive(clap::Args)]
pub struct HttpDemoArgs {
    /// Engine capacity for cached response bodies, in bytes.
    #[arg(long, default_value_t = 1 << 20)]
    pub max_body_bytes: usize,
    /// Fallback TTL when the origin sends no `Expires` header, in milliseconds.
    #[arg(long, default_value_t = 60_000)]
    pub default_ttl_ms: u64,
    /// Simulated origin latency per request, in milliseconds.
    #[arg(long, default_value_t = 50)]
    pub origin_latency_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Bench(args) => bench::run(args),
        Command::HttpDemo(args) => http_demo::run(args),
    }
}
