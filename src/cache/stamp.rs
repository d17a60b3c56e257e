//! Response Stamper
//!
//! Turns a network response into a storable entry carrying its capture time.

use axum::http::{header, HeaderValue};

use crate::cache::entry::{current_timestamp_ms, CAPTURED_AT_HEADER};
use crate::cache::{CacheEntry, CacheKey};
use crate::fetch::HttpResponse;

/// Stamps a response with the current time.
pub fn stamp(key: CacheKey, response: &HttpResponse) -> CacheEntry {
    stamp_at(key, response, current_timestamp_ms())
}

/// Stamps a response with an explicit capture time (Unix milliseconds).
///
/// The body is already fully drained into `Bytes`, so cloning it leaves the
/// caller's response intact and usable.
pub fn stamp_at(key: CacheKey, response: &HttpResponse, captured_at_ms: u64) -> CacheEntry {
    let mut headers = response.headers.clone();
    // Entries are replayed to every client; cookies belong to one
    headers.remove(header::SET_COOKIE);
    headers.insert(CAPTURED_AT_HEADER, HeaderValue::from(captured_at_ms));

    CacheEntry {
        key,
        status: response.status,
        headers,
        body: response.body.clone(),
    }
}
