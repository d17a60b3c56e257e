//! Cache Controller
//!
//! Out-of-band operations: startup warming of the static namespace and the
//! namespace-wide clear command.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};
use url::Url;

use crate::cache::{stamp, CacheKey, CacheStore};
use crate::fetch::{FetchRequest, Fetcher};
use crate::models::{ControlAck, ControlMessage};
use crate::policy::{Policy, ResourceHint};
use crate::tasks::BackgroundJobs;

// == Warm Report ==
/// A warm-set resource that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmFailure {
    pub url: String,
    pub reason: String,
}

/// Result of warming the static namespace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmReport {
    /// URLs now cached, sorted
    pub stored: Vec<String>,
    /// URLs that failed, sorted by URL
    pub failed: Vec<WarmFailure>,
}

impl WarmReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// == Cache Controller ==
pub struct CacheController {
    store: Arc<CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    static_policy: Policy,
    warm_set: Vec<Url>,
    /// Shared with the orchestrator; drained before a clear
    jobs: BackgroundJobs,
}

impl CacheController {
    pub fn new(
        store: Arc<CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        static_policy: Policy,
        warm_set: Vec<Url>,
        jobs: BackgroundJobs,
    ) -> Self {
        Self {
            store,
            fetcher,
            static_policy,
            warm_set,
            jobs,
        }
    }

    pub fn warm_set(&self) -> &[Url] {
        &self.warm_set
    }

    // == Warm ==
    /// Fetches every warm-set URL concurrently and stores the successful
    /// ones in the static namespace.
    ///
    /// Returns once every resource is stored or has individually failed;
    /// one failure never stops the others.
    pub async fn warm(&self) -> WarmReport {
        let mut fetches = JoinSet::new();

        for url in &self.warm_set {
            let url = url.clone();
            let store = Arc::clone(&self.store);
            let fetcher = Arc::clone(&self.fetcher);
            let namespace = self.static_policy.namespace.clone();

            fetches.spawn(async move {
                let outcome = warm_one(&store, fetcher.as_ref(), &namespace, &url).await;
                (url.to_string(), outcome)
            });
        }

        let mut report = WarmReport::default();
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((url, Ok(()))) => report.stored.push(url),
                Ok((url, Err(reason))) => {
                    warn!(%url, "warm-set resource not cached: {}", reason);
                    report.failed.push(WarmFailure { url, reason });
                }
                Err(err) => warn!("warm-set fetch task aborted: {}", err),
            }
        }

        report.stored.sort();
        report.failed.sort_by(|a, b| a.url.cmp(&b.url));
        info!(
            stored = report.stored.len(),
            failed = report.failed.len(),
            "static namespace warmed"
        );
        report
    }

    // == Clear ==
    /// Deletes every namespace. Returns how many existed.
    ///
    /// In-flight refreshes and trims finish first, so none of them can
    /// repopulate a namespace after the clear is acknowledged.
    pub async fn clear(&self) -> usize {
        self.jobs.wait_idle().await;
        let cleared = self.store.clear().await;
        info!(namespaces = cleared, "cache cleared");
        cleared
    }

    // == Handle Control Message ==
    pub async fn handle(&self, message: ControlMessage) -> ControlAck {
        match message {
            ControlMessage::ClearCache => {
                let cleared = self.clear().await;
                ControlAck::cleared(cleared)
            }
        }
    }
}

async fn warm_one(
    store: &CacheStore,
    fetcher: &dyn Fetcher,
    namespace: &str,
    url: &Url,
) -> Result<(), String> {
    let request = FetchRequest::get(url.clone()).with_hint(ResourceHint::Document);
    let response = fetcher.fetch(&request).await.map_err(|err| err.to_string())?;
    if !response.is_success() {
        return Err(format!("upstream answered {}", response.status));
    }

    let entry = stamp(CacheKey::get(url), &response);
    store
        .put(namespace, entry)
        .await
        .map_err(|err| err.to_string())
}
