//! Outgoing request description.

use axum::http::{header, HeaderMap, Method};
use bytes::Bytes;
use url::Url;

use crate::cache::CacheKey;
use crate::error::Result;
use crate::policy::ResourceHint;

/// Request headers that would let upstream answer with a partial or
/// not-modified body, which cannot be stored as a complete entry.
const CACHE_FILL_STRIPPED: [header::HeaderName; 4] = [
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
    header::IF_RANGE,
    header::RANGE,
];

// == Fetch Request ==
/// A request as seen by the interception layer.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Declared destination of the request (script, style, image...)
    pub hint: ResourceHint,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            hint: ResourceHint::None,
        }
    }

    /// A bare GET for `url`.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parses `url` and builds a bare GET.
    pub fn parse_get(url: &str) -> Result<Self> {
        Ok(Self::get(Url::parse(url)?))
    }

    pub fn with_hint(mut self, hint: ResourceHint) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Cache identity, `None` for non-GET requests.
    pub fn cache_key(&self) -> Option<CacheKey> {
        CacheKey::for_request(&self.method, &self.url)
    }

    /// Copy of this request suitable for populating the cache: conditional
    /// and range headers are dropped so upstream returns a full body.
    pub fn for_cache_fill(&self) -> Self {
        let mut fill = self.clone();
        for name in CACHE_FILL_STRIPPED.iter() {
            fill.headers.remove(name);
        }
        fill
    }
}
