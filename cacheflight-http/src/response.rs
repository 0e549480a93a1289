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

//! The record stored in the engine for each cached response, and the TTL
//! rule that decides how long it lives there.

use std::time::{Duration, Instant, SystemTime};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::ExpiresParseError;

/// Everything the adapter needs to replay a response later: status, cloned
/// headers, the captured body, and the instant it was captured (for the
/// `Age` header on replay).
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub captured_at: Instant,
}

impl CachedResponse {
    /// Seconds elapsed since capture, for the `Age` header. Never negative;
    /// `Instant` is monotonic so this can't go backwards.
    pub fn age_secs(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.captured_at).as_secs()
    }
}

/// TTL determination: a non-200 downstream status is never cached
/// (TTL zero); otherwise a parseable `Expires` header wins over the
/// adapter's configured default.
pub fn determine_ttl(status: StatusCode, headers: &HeaderMap, default_ttl: Duration) -> Duration {
    if status != StatusCode::OK {
        return Duration::ZERO;
    }
    match expires_ttl(headers) {
        Some(Ok(ttl)) => ttl,
        Some(Err(_)) | None => default_ttl,
    }
}

/// Remaining duration until the `Expires` header's instant, if the header
/// is present and parses as an HTTP-date. `None` if the header is absent;
/// `Some(Err(_))` if present but malformed (callers fall back to the
/// default TTL either way, but the distinction is useful for logging).
fn expires_ttl(headers: &HeaderMap) -> Option<Result<Duration, ExpiresParseError>> {
    let raw = headers.get(http::header::EXPIRES)?;
    let raw = match raw.to_str() {
        Ok(raw) => raw,
        Err(_) => return Some(Err(ExpiresParseError::NotUtf8)),
    };
    let parsed = match httpdate::parse_http_date(raw) {
        Ok(parsed) => parsed,
        Err(source) => {
            return Some(Err(ExpiresParseError::Malformed {
                raw: raw.to_owned(),
                source,
            }))
        }
    };
    let ttl = parsed
        .duration_since(SystemTime::now())
        .unwrap_or(Duration::ZERO);
    Some(Ok(ttl))
}
