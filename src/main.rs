//! SWR Proxy - An intercepting HTTP cache
//!
//! Binary entry point: wires configuration, the cache layer and the HTTP
//! server together.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swr_proxy::cache::CacheStore;
use swr_proxy::fetch::{Fetcher, HttpFetcher};
use swr_proxy::policy::RequestClassifier;
use swr_proxy::{create_router, AppState, CacheLayer, Config};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the store, network client and cache layer
/// 4. Warm the static namespace, then activate interception
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM stop accepting, then drain background jobs
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swr_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SWR caching proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, port={}, tile_max_entries={}, api_max_age={}s, static_max_age={}s",
        config.app_origin,
        config.server_port,
        config.tile_max_entries,
        config.api_max_age_secs,
        config.static_max_age_secs
    );

    let store = Arc::new(match config.storage_quota_bytes {
        Some(quota) => CacheStore::with_quota(quota),
        None => CacheStore::new(),
    });
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::new(config.upstream_timeout()).context("building upstream client")?,
    );
    let classifier =
        RequestClassifier::new(config.rules.clone()).context("compiling classifier rules")?;
    let warm_set = config.warm_set_urls().context("resolving warm set")?;

    let layer = Arc::new(CacheLayer::new(
        store,
        fetcher,
        classifier,
        config.policies(),
        warm_set,
    ));

    let report = layer.initialize().await;
    if !report.is_complete() {
        warn!(
            failed = report.failed.len(),
            "some warm-set resources were not cached"
        );
    }
    layer.activate();

    let state = AppState::from_config(Arc::clone(&layer), &config)
        .context("resolving application origin")?;
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    // Let in-flight refreshes and eviction passes finish
    layer.jobs().wait_idle().await;
    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
