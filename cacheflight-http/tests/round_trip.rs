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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderValue, Method, Request, StatusCode};

use cacheflight_http::{new_handler, CaptureWriter, Handler, ResponseWriter};

fn get(uri: &str) -> Request<Bytes> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl Handler for CountingHandler {
    fn handle(&self, _req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        w.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        w.write_status(StatusCode::OK);
        w.write_body(b"hello");
    }
}

#[test_log::test]
fn identical_get_requests_hit_the_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let downstream = CountingHandler {
        calls: Arc::clone(&calls),
    };
    let handler = new_handler(1024, Duration::from_secs(60), downstream);

    let mut first = CaptureWriter::new();
    handler.handle(&get("/hello"), &mut first);
    let (status1, _headers1, body1) = first.into_parts();

    let mut second = CaptureWriter::new();
    handler.handle(&get("/hello"), &mut second);
    let (status2, headers2, body2) = second.into_parts();

    assert_eq!(calls.load(Ordering::SeqCst), 1, "downstream should run once");
    assert_eq!(status1, StatusCode::OK);
    assert_eq!(status2, StatusCode::OK);
    assert_eq!(body1, Bytes::from_static(b"hello"));
    assert_eq!(body2, Bytes::from_static(b"hello"));

    let age: u64 = headers2
        .get(http::header::AGE)
        .expect("Age header must be present on a served hit")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(age < 60);

    let content_length: usize = headers2
        .get(http::header::CONTENT_LENGTH)
        .expect("Content-Length must be set on the cached response")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(content_length, body2.len());
}

#[test_log::test]
fn non_get_requests_always_bypass_the_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let downstream = CountingHandler {
        calls: Arc::clone(&calls),
    };
    let handler = new_handler(1024, Duration::from_secs(60), downstream);

    let post = Request::builder()
        .method(Method::POST)
        .uri("/hello")
        .body(Bytes::new())
        .unwrap();

    let mut first = CaptureWriter::new();
    handler.handle(&post, &mut first);
    let mut second = CaptureWriter::new();
    handler.handle(&post, &mut second);

    assert_eq!(calls.load(Ordering::SeqCst), 2, "POST must never be coalesced");
}

#[test_log::test]
fn distinct_keys_are_cached_independently() {
    let calls = Arc::new(AtomicUsize::new(0));
    let downstream = CountingHandler {
        calls: Arc::clone(&calls),
    };
    let handler = new_handler(1024, Duration::from_secs(60), downstream);

    let mut w = CaptureWriter::new();
    handler.handle(&get("/a"), &mut w);
    let mut w = CaptureWriter::new();
    handler.handle(&get("/b"), &mut w);
    let mut w = CaptureWriter::new();
    handler.handle(&get("/a"), &mut w);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

struct ErrorHandler;

impl Handler for ErrorHandler {
    fn handle(&self, _req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        w.write_status(StatusCode::INTERNAL_SERVER_ERROR);
        w.write_body(b"boom");
    }
}

#[test_log::test]
fn non_ok_responses_are_never_served_from_cache() {
    let handler = new_handler(1024, Duration::from_secs(60), ErrorHandler);

    let mut first = CaptureWriter::new();
    handler.handle(&get("/broken"), &mut first);
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // A second identical request must still reach the downstream handler:
    // a 500 gets TTL zero, so it is evicted and recomputed immediately.
    let mut second = CaptureWriter::new();
    handler.handle(&get("/broken"), &mut second);
    assert_eq!(second.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
