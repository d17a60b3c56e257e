//! Response parts exchanged between the network, the cache and callers.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;

// == HTTP Response ==
/// A fully drained HTTP response.
///
/// The body is held as `Bytes`, so clones share the buffer and a response
/// can be both stored and returned.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    // == Synthetic Responses ==
    /// Empty 503, used when a tile is neither cached nor reachable.
    pub fn service_unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, HeaderMap::new(), Bytes::new())
    }

    /// 503 with an empty JSON object, used for unreachable API resources.
    pub fn service_unavailable_json() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            headers,
            Bytes::from_static(b"{}"),
        )
    }

    /// Empty 404, used for static resources with no cached copy.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, HeaderMap::new(), Bytes::new())
    }
}
