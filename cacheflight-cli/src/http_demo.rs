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

//! Drives the HTTP response-caching adapter against an in-process
//! downstream handler, so the coalescing/TTL/eviction behaviour can be
//! watched from the command line without standing up a real listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use http::{HeaderValue, Method, Request, StatusCode};

use cacheflight_http::{new_handler, CaptureWriter, Handler, ResponseWriter};

use crate::HttpDemoArgs;

/// A downstream handler standing in for a slow origin: every request sleeps
/// a fixed amount before responding, so cache hits are visibly instant by
/// comparison.
struct SlowOrigin {
    calls: Arc<AtomicU64>,
    latency: Duration,
}

impl Handler for SlowOrigin {
    fn handle(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.latency);
        w.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        w.write_status(StatusCode::OK);
        w.write_body(format!("response for {}", req.uri()).as_bytes());
    }
}

pub fn run(args: HttpDemoArgs) -> Result<()> {
    let calls = Arc::new(AtomicU64::new(0));
    let origin = SlowOrigin {
        calls: Arc::clone(&calls),
        latency: Duration::from_millis(args.origin_latency_ms),
    };
    let handler = new_handler(
        args.max_body_bytes,
        Duration::from_millis(args.default_ttl_ms),
        origin,
    );

    for path in ["/a", "/a", "/b", "/a"] {
        let started = std::time::Instant::now();
        let req = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Bytes::new())
            .unwrap();
        let mut writer = CaptureWriter::new();
        handler.handle(&req, &mut writer);
        let elapsed = started.elapsed();
        let (status, headers, body) = writer.into_parts();
        let age = headers
            .get(http::header::AGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("?");
        println!(
            "GET {path} -> {status} age={age}s in {elapsed:?}: {}",
            String::from_utf8_lossy(&body)
        );
    }

    println!(
        "origin invoked {} time(s) across 4 requests for 2 distinct paths",
        calls.load(Ordering::SeqCst)
    );
    Ok(())
}
