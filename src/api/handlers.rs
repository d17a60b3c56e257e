//! API Handlers
//!
//! The proxy fallback handler that feeds every request through the cache
//! layer, plus the control, stats and health endpoints.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::HeaderName, HeaderValue, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::fetch::{strip_hop_by_hop, FetchRequest, HttpResponse};
use crate::layer::CacheLayer;
use crate::models::{ControlAck, ControlMessage, HealthResponse, NamespaceStats, StatsResponse};
use crate::policy::ResourceHint;

/// Response header naming where a proxied response came from.
pub const CACHE_STATUS_HEADER: &str = "x-cache-status";

/// Tag for responses that bypassed the cache.
const BYPASS: &str = "BYPASS";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache layer in front of the network
    pub layer: Arc<CacheLayer>,
    /// Base for origin-form request targets
    pub origin: Url,
    /// Largest request body the proxy buffers
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(layer: Arc<CacheLayer>, origin: Url, max_body_bytes: usize) -> Self {
        Self {
            layer,
            origin,
            max_body_bytes,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(layer: Arc<CacheLayer>, config: &Config) -> Result<Self> {
        Ok(Self::new(
            layer,
            config.origin_url()?,
            config.max_request_body_bytes,
        ))
    }
}

/// Fallback handler for every non-control request.
///
/// Absolute-form targets (forward proxy) are used as-is; origin-form
/// targets resolve against the application origin.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let fetch = match into_fetch_request(&state, request).await {
        Ok(fetch) => fetch,
        Err(err) => return err.into_response(),
    };

    if let Some(served) = state.layer.intercept(&fetch).await {
        return to_response(served.response, served.source.as_header_value());
    }

    debug!(method = %fetch.method, url = %fetch.url, "forwarding uncached request");
    match state.layer.forward(&fetch).await {
        Ok(response) => to_response(response, BYPASS),
        Err(err) => {
            warn!(url = %fetch.url, "forward failed: {}", err);
            err.into_response()
        }
    }
}

/// Handler for POST /__cache/control
pub async fn control_handler(
    State(state): State<AppState>,
    Json(message): Json<ControlMessage>,
) -> Json<ControlAck> {
    Json(state.layer.control(message).await)
}

/// Handler for GET /__cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let orchestrator = state.layer.orchestrator();
    let counters = orchestrator.stats();
    let store = orchestrator.store();

    let mut namespaces = Vec::with_capacity(counters.len());
    for policy in orchestrator.policies().all() {
        let stats = counters.get(&policy.namespace).cloned().unwrap_or_default();
        namespaces.push(NamespaceStats::new(
            policy.namespace.clone(),
            store.len(&policy.namespace).await,
            store.size_bytes(&policy.namespace).await,
            policy.max_entries,
            stats,
        ));
    }

    Json(StatsResponse {
        namespaces,
        pending_jobs: state.layer.jobs().pending(),
    })
}

/// Handler for GET /__cache/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(
        state.layer.is_ready(),
        state.layer.is_active(),
    ))
}

// == Helpers ==
async fn into_fetch_request(state: &AppState, request: Request) -> Result<FetchRequest> {
    let (parts, body) = request.into_parts();
    let url = resolve_target(&state.origin, &parts.uri)?;

    let hint = parts
        .headers
        .get("sec-fetch-dest")
        .and_then(|value| value.to_str().ok())
        .map(ResourceHint::from_fetch_dest)
        .unwrap_or(ResourceHint::None);

    let body = to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|err| CacheError::InvalidRequest(format!("unreadable request body: {}", err)))?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    Ok(FetchRequest::new(parts.method, url)
        .with_headers(headers)
        .with_body(body)
        .with_hint(hint))
}

/// Turns a request target into an absolute URL.
pub fn resolve_target(origin: &Url, uri: &Uri) -> Result<Url> {
    if uri.scheme().is_some() {
        return Ok(Url::parse(&uri.to_string())?);
    }
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    Ok(origin.join(path)?)
}

fn to_response(response: HttpResponse, cache_status: &'static str) -> Response {
    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = response.status;
    *out.headers_mut() = response.headers;
    out.headers_mut().insert(
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static(cache_status),
    );
    out
}
