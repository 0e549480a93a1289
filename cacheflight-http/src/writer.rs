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

//! The response-writing side of the handler contract.
//!
//! [`ResponseWriter`] is deliberately narrow (set headers, commit a status,
//! append body bytes), so that both a real transport writer and the
//! in-memory [`CaptureWriter`] used to record a downstream handler's output
//! can implement it identically.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};

/// Destination for a handler's response. Mirrors the shape of a real
/// transport response sink: headers may be set any time before the status
/// is committed, and body bytes are appended after.
pub trait ResponseWriter {
    /// The header map to be sent. Mutate this before the first call to
    /// [`ResponseWriter::write_body`]. Once bytes have gone out, a real
    /// transport can no longer amend headers already on the wire.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status code. Writing it more than once keeps only the
    /// latest value.
    fn write_status(&mut self, status: StatusCode);

    /// Appends a chunk to the response body.
    fn write_body(&mut self, chunk: &[u8]);
}

/// A [`ResponseWriter`] that records everything written to it instead of
/// sending it anywhere. Used as the capturing sink the adapter hands to the
/// downstream handler on a cache miss, recording the status, headers, and
/// body bytes it writes.
#[derive(Debug, Default)]
pub struct CaptureWriter {
    headers: HeaderMap,
    status: Option<StatusCode>,
    body: BytesMut,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed status, or `200 OK` if the handler never called
    /// `write_status`, matching a real server's default when a handler
    /// writes a body without ever setting one explicitly.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        let status = self.status();
        (status, self.headers, self.body.freeze())
    }
}

impl ResponseWriter for CaptureWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}
