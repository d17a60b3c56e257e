//! Cache Entry Module
//!
//! Defines request identity (`CacheKey`) and the stored form of a response
//! (`CacheEntry`). The capture time lives in a response header so it survives
//! any store round trip together with the rest of the headers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use url::Url;

use crate::fetch::HttpResponse;

/// Header holding the capture time as base-10 Unix milliseconds.
pub const CAPTURED_AT_HEADER: &str = "x-cache-captured-at";

// == Cache Key ==
/// Normalized identity of a cacheable request: method plus canonical URL.
///
/// Only GET requests have a key. The canonical URL is the parsed URL with
/// its fragment removed, so scheme/host case and default ports are folded
/// by the URL parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    url: String,
}

impl CacheKey {
    /// Builds the key for a request, or `None` when the method is not cacheable.
    pub fn for_request(method: &Method, url: &Url) -> Option<Self> {
        (*method == Method::GET).then(|| Self::get(url))
    }

    /// Shorthand for a GET key.
    pub fn get(url: &Url) -> Self {
        let mut canonical = url.clone();
        canonical.set_fragment(None);
        Self {
            method: Method::GET,
            url: canonical.to_string(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// == Cache Entry ==
/// A stored response. Entries are immutable; updates are full replacements.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Identity of the request that produced this entry
    pub key: CacheKey,
    /// Upstream status at capture time
    pub status: StatusCode,
    /// Upstream headers plus the capture-time marker
    pub headers: HeaderMap,
    /// Fully drained response body
    pub body: Bytes,
}

impl CacheEntry {
    // == Captured At ==
    /// Returns the capture time in Unix milliseconds.
    ///
    /// `None` when the marker header is missing or not a base-10 integer.
    pub fn captured_at(&self) -> Option<u64> {
        self.headers
            .get(CAPTURED_AT_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    /// Approximate number of bytes this entry occupies in the store.
    pub fn size_bytes(&self) -> usize {
        let header_bytes: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        self.key.url.len() + header_bytes + self.body.len()
    }

    /// Rebuilds a servable response from the stored parts.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::new(self.status, self.headers.clone(), self.body.clone())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
