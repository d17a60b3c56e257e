//! Cache Layer
//!
//! The interception point in front of the network. Owns the lifecycle
//! (initialize, activate) and routes each request either to the
//! orchestrator or straight to the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::Method;
use tracing::info;

use crate::cache::CacheStore;
use crate::controller::{CacheController, WarmReport};
use crate::error::Result;
use crate::fetch::{FetchRequest, Fetcher, HttpResponse};
use crate::models::{ControlAck, ControlMessage};
use crate::orchestrator::{Orchestrator, Served};
use crate::policy::{PolicySet, RequestClassifier};
use crate::tasks::BackgroundJobs;

// == Cache Layer ==
pub struct CacheLayer {
    orchestrator: Orchestrator,
    controller: CacheController,
    ready: AtomicBool,
    active: AtomicBool,
}

impl CacheLayer {
    // == Constructor ==
    pub fn new(
        store: Arc<CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        classifier: RequestClassifier,
        policies: PolicySet,
        warm_set: Vec<url::Url>,
    ) -> Self {
        let jobs = BackgroundJobs::new();
        // Warmed URLs must classify as static or their entries are never read
        let classifier = classifier.with_warm_set(&warm_set);
        let controller = CacheController::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            policies.static_assets.clone(),
            warm_set,
            jobs.clone(),
        );
        let orchestrator = Orchestrator::new(store, fetcher, classifier, policies, jobs);

        Self {
            orchestrator,
            controller,
            ready: AtomicBool::new(false),
            active: AtomicBool::new(false),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    pub fn jobs(&self) -> &BackgroundJobs {
        self.orchestrator.jobs()
    }

    // == Lifecycle ==
    /// Warms the static namespace, then marks the layer ready.
    ///
    /// Warm failures are reported but never block readiness.
    pub async fn initialize(&self) -> WarmReport {
        let report = self.controller.warm().await;
        self.ready.store(true, Ordering::SeqCst);
        info!(complete = report.is_complete(), "cache layer ready");
        report
    }

    /// Starts intercepting requests.
    pub fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
        info!("cache layer active");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    // == Intercept ==
    /// Serves a request from the cache strategies.
    ///
    /// Returns `None` when the request is not handled here: the layer is
    /// not yet active, the method is not GET, or the request is passthrough.
    pub async fn intercept(&self, request: &FetchRequest) -> Option<Served> {
        if !self.is_active() || request.method != Method::GET {
            return None;
        }
        self.orchestrator.handle(request).await
    }

    /// Sends an unhandled request to the network unchanged.
    pub async fn forward(&self, request: &FetchRequest) -> Result<HttpResponse> {
        self.orchestrator.fetcher().fetch(request).await
    }

    // == Control ==
    pub async fn control(&self, message: ControlMessage) -> ControlAck {
        self.controller.handle(message).await
    }
}
