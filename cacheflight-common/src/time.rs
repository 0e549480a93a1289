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

//! Small time helpers shared by the engine and the HTTP adapter.

use std::time::{Duration, Instant};

/// `now + ttl`, saturating instead of panicking if the sum would overflow
/// `Instant`'s internal representation (a caller-supplied TTL of
/// `Duration::MAX`, say). Saturates *upward*, toward the furthest instant
/// reachable from `now` (a deadline that never quite arrives, not one that
/// has already passed).
pub fn checked_deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or_else(|| far_future(now))
}

/// Halves the requested duration until the addition no longer overflows.
/// Terminates because `Duration::ZERO` always succeeds.
fn far_future(now: Instant) -> Instant {
    let mut candidate = Duration::MAX;
    loop {
        if let Some(instant) = now.checked_add(candidate) {
            return instant;
        }
        candidate /= 2;
    }
}
