//! Router-level tests driven through tower's `oneshot`.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;

use swr_proxy::api::CACHE_STATUS_HEADER;
use swr_proxy::cache::CacheStore;
use swr_proxy::policy::PolicySet;
use swr_proxy::{create_router, AppState, CacheLayer};

use common::{build_layer, url, warm_paths, MockFetcher, ORIGIN};

fn create_test_app(layer: Arc<CacheLayer>) -> Router {
    create_router(AppState::new(layer, url(ORIGIN), 1024))
}

fn test_layer(fetcher: Arc<MockFetcher>) -> Arc<CacheLayer> {
    Arc::new(build_layer(
        Arc::new(CacheStore::new()),
        fetcher,
        PolicySet::default(),
        warm_paths(&["/"]),
    ))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_lifecycle() {
    let fetcher = MockFetcher::new();
    fetcher.ok("http://app.test/", "<html>");
    let layer = test_layer(fetcher);
    let app = create_test_app(Arc::clone(&layer));

    let response = app.clone().oneshot(get("/__cache/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "starting");
    assert_eq!(body["ready"], false);

    layer.initialize().await;
    layer.activate();

    let body = json_body(app.oneshot(get("/__cache/health")).await.unwrap()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active"], true);
}

#[tokio::test]
async fn test_stats_lists_every_namespace() {
    let fetcher = MockFetcher::new();
    fetcher.ok("http://app.test/", "<html>");
    let layer = test_layer(fetcher);
    layer.initialize().await;
    let app = create_test_app(layer);

    let response = app.oneshot(get("/__cache/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let namespaces = body["namespaces"].as_array().unwrap();
    assert_eq!(namespaces.len(), 3);
    assert_eq!(namespaces[0]["namespace"], "tile-cache");
    assert_eq!(namespaces[0]["max_entries"], 500);
    assert_eq!(namespaces[2]["namespace"], "static-cache");
    assert_eq!(namespaces[2]["entries"], 1);
}

#[tokio::test]
async fn test_control_clear_cache() {
    let fetcher = MockFetcher::new();
    fetcher.ok("http://app.test/", "<html>");
    let layer = test_layer(fetcher);
    layer.initialize().await;
    let app = create_test_app(layer);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/__cache/control")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"type":"CLEAR_CACHE"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["type"], "CLEAR_CACHE");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["namespaces_cleared"], 1);
}

#[tokio::test]
async fn test_control_rejects_unknown_message() {
    let app = create_test_app(test_layer(MockFetcher::new()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/__cache/control")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"type":"DROP_TABLES"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_proxy_miss_then_hit() {
    let fetcher = MockFetcher::new();
    fetcher.ok("http://app.test/static/js/app.js", "console.log(1)");
    let layer = test_layer(Arc::clone(&fetcher));
    layer.activate();
    let app = create_test_app(layer);

    let response = app.clone().oneshot(get("/static/js/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "MISS");

    let response = app.oneshot(get("/static/js/app.js")).await.unwrap();
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "HIT");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), b"console.log(1)");
    assert_eq!(fetcher.calls("http://app.test/static/js/app.js"), 1);
}

#[tokio::test]
async fn test_proxy_absolute_form_tile() {
    let fetcher = MockFetcher::new();
    fetcher.set_offline(true);
    let layer = test_layer(fetcher);
    layer.activate();
    let app = create_test_app(layer);

    let response = app
        .oneshot(get("http://tile.openstreetmap.org/3/4/2.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "SYNTHETIC");
}

#[tokio::test]
async fn test_proxy_post_bypasses_cache() {
    let fetcher = MockFetcher::new();
    fetcher.ok("http://app.test/api/points", "created");
    let layer = test_layer(Arc::clone(&fetcher));
    layer.activate();
    let app = create_test_app(Arc::clone(&layer));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/points")
                .body(Body::from(r#"{"x":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "BYPASS");
    assert!(layer.orchestrator().store().namespaces().await.is_empty());

    // Forwarding errors surface as a bad gateway
    fetcher.set_offline(true);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/points")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_proxy_rejects_oversized_body() {
    let layer = test_layer(MockFetcher::new());
    layer.activate();
    let app = create_test_app(layer);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/upload")
                .body(Body::from(vec![0u8; 4096]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
