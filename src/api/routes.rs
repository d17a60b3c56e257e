//! API Routes
//!
//! Configures the Axum router: control endpoints under `/__cache/`, every
//! other request handled by the proxy fallback.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{control_handler, health_handler, proxy_handler, stats_handler, AppState};

/// Creates the main router.
///
/// # Endpoints
/// - `POST /__cache/control` - Control messages (`CLEAR_CACHE`)
/// - `GET /__cache/stats` - Per-namespace counters and sizes
/// - `GET /__cache/health` - Readiness of the cache layer
/// - anything else - Proxied through the cache layer
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__cache/control", post(control_handler))
        .route("/__cache/stats", get(stats_handler))
        .route("/__cache/health", get(health_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
