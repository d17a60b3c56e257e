//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;
use url::Url;

use swr_proxy::cache::CacheStore;
use swr_proxy::error::{CacheError, Result};
use swr_proxy::fetch::{FetchRequest, Fetcher, HttpResponse};
use swr_proxy::policy::{ClassifierRules, PolicySet, RequestClassifier};
use swr_proxy::CacheLayer;

pub const ORIGIN: &str = "http://app.test";
pub const TILE_URL: &str = "https://tile.openstreetmap.org/3/4/2.png";
pub const API_URL: &str = "http://app.test/api/points";
pub const STATIC_URL: &str = "http://app.test/static/js/app.js";

/// Scripted upstream: canned responses per URL, an offline switch and
/// per-URL call counts. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: StatusCode, body: &'static str) {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let response = HttpResponse::new(status, headers, Bytes::from_static(body.as_bytes()));
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn ok(&self, url: &str, body: &'static str) {
        self.respond(url, StatusCode::OK, body);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let url = request.url.to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Network(format!("offline: {}", url)));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(HttpResponse::not_found))
    }
}

pub fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

pub fn warm_paths(paths: &[&str]) -> Vec<Url> {
    let origin = url(ORIGIN);
    paths.iter().map(|p| origin.join(p).unwrap()).collect()
}

/// A layer over `store` and `fetcher` with the reference policies, not
/// yet activated.
pub fn build_layer(
    store: Arc<CacheStore>,
    fetcher: Arc<MockFetcher>,
    policies: PolicySet,
    warm_set: Vec<Url>,
) -> CacheLayer {
    let classifier = RequestClassifier::new(ClassifierRules::default()).unwrap();
    CacheLayer::new(store, fetcher, classifier, policies, warm_set)
}

/// An activated layer with the reference policies and no warm set.
pub fn active_layer(store: Arc<CacheStore>, fetcher: Arc<MockFetcher>) -> CacheLayer {
    let layer = build_layer(store, fetcher, PolicySet::default(), Vec::new());
    layer.activate();
    layer
}
