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

//! The adapter itself: wraps a downstream [`Handler`] with a
//! [`cacheflight_core::Cache`] keyed, by default, on the request URI.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{HeaderValue, Method, Request};

use cacheflight_core::Cache;

use crate::response::{determine_ttl, CachedResponse};
use crate::writer::{CaptureWriter, ResponseWriter};

/// A downstream request handler. Mirrors a transport-level "serve this
/// request, write the response to this sink" contract so the same trait
/// covers both a real handler and the adapter wrapping one.
pub trait Handler: Send + Sync {
    fn handle(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(&Request<Bytes>, &mut dyn ResponseWriter) + Send + Sync,
{
    fn handle(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        self(req, w)
    }
}

/// Derives the cache key for a request. Default is the complete request
/// URI.
pub type KeyFn = dyn Fn(&Request<Bytes>) -> String + Send + Sync;

fn default_key_fn(req: &Request<Bytes>) -> String {
    req.uri().to_string()
}

/// Settings accepted by [`new_handler`]/[`new_middleware`]: the engine's
/// capacity bound in body bytes, the fallback TTL, and the key function.
pub struct HandlerConfig {
    pub max_body_bytes: usize,
    pub default_ttl: Duration,
    pub key_fn: Arc<KeyFn>,
}

impl HandlerConfig {
    pub fn new(max_body_bytes: usize, default_ttl: Duration) -> Self {
        Self {
            max_body_bytes,
            default_ttl,
            key_fn: Arc::new(default_key_fn),
        }
    }

    pub fn key_fn<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&Request<Bytes>) -> String + Send + Sync + 'static,
    {
        self.key_fn = Arc::new(key_fn);
        self
    }
}

/// Wraps a downstream [`Handler`] with response caching. Owns a dedicated
/// engine instance sized in body bytes.
pub struct CachingHandler<H> {
    downstream: H,
    cache: Cache<CachedResponse>,
    default_ttl: Duration,
    key_fn: Arc<KeyFn>,
}

impl<H: Handler> CachingHandler<H> {
    pub fn new(config: HandlerConfig, downstream: H) -> Self {
        Self {
            downstream,
            cache: Cache::new(config.max_body_bytes),
            default_ttl: config.default_ttl,
            key_fn: config.key_fn,
        }
    }

    fn serve_cached(&self, cached: &CachedResponse, w: &mut dyn ResponseWriter) {
        let now = Instant::now();
        *w.headers_mut() = cached.headers.clone();
        w.headers_mut().insert(
            http::header::AGE,
            HeaderValue::from_str(&cached.age_secs(now).to_string())
                .expect("an integer always makes a valid header value"),
        );
        w.write_status(cached.status);
        w.write_body(&cached.body);
    }
}

impl<H: Handler> Handler for CachingHandler<H> {
    fn handle(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        // Only the idempotent retrieval method is cacheable; every other
        // method bypasses the cache entirely and must not recurse into
        // the engine.
        if req.method() != Method::GET {
            self.downstream.handle(req, w);
            return;
        }

        let key = (self.key_fn)(req);
        let downstream = &self.downstream;
        let default_ttl = self.default_ttl;
        let log_key = key.clone();
        let cached = self.cache.get_or_compute(&key, move || {
            let mut capture = CaptureWriter::new();
            downstream.handle(req, &mut capture);
            let (status, headers, body) = capture.into_parts();

            let mut headers = headers;
            headers.insert(
                http::header::CONTENT_LENGTH,
                HeaderValue::from_str(&body.len().to_string())
                    .expect("a body length always makes a valid header value"),
            );

            let ttl = determine_ttl(status, &headers, default_ttl);
            let size = body.len();
            tracing::debug!(key = %log_key, %status, size, "cacheflight-http: cache miss, captured response");

            (
                CachedResponse {
                    status,
                    headers,
                    body,
                    captured_at: Instant::now(),
                },
                ttl,
                size,
            )
        });

        tracing::trace!(%key, "cacheflight-http: serving response");
        self.serve_cached(&cached, w);
    }
}

/// Builds a [`CachingHandler`] directly in front of `downstream`.
pub fn new_handler<H: Handler>(
    max_body_bytes: usize,
    default_ttl: Duration,
    downstream: H,
) -> CachingHandler<H> {
    CachingHandler::new(HandlerConfig::new(max_body_bytes, default_ttl), downstream)
}

/// A factory that wraps any downstream [`Handler`] in a fresh
/// [`CachingHandler`] sharing the same `max_body_bytes`/`default_ttl`
/// settings, the tower-style "middleware" shape.
pub fn new_middleware(
    max_body_bytes: usize,
    default_ttl: Duration,
) -> impl Fn(Box<dyn Handler>) -> CachingHandler<Box<dyn Handler>> {
    move |downstream| {
        CachingHandler::new(
            HandlerConfig::new(max_body_bytes, default_ttl),
            downstream,
        )
    }
}

impl Handler for Box<dyn Handler> {
    fn handle(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        (**self).handle(req, w)
    }
}
