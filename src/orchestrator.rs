//! Revalidation Orchestrator
//!
//! Executes the serving strategy of a request's class by composing the
//! store, the stamper, the freshness evaluator and the eviction manager.
//!
//! Every strategy makes at most one synchronous network attempt per request.
//! Store faults are logged and treated as misses; the request never fails
//! because of the cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{is_fresh, stamp, trim, CacheEntry, CacheKey, CacheStats, CacheStore};
use crate::error::Result;
use crate::fetch::{FetchRequest, Fetcher, HttpResponse};
use crate::policy::{Policy, PolicySet, RequestClassifier, ResourceClass, Strategy};
use crate::tasks::BackgroundJobs;

// == Serve Source ==
/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServeSource {
    /// Fresh cached entry
    Hit,
    /// Stale cached entry, served because the network could not answer
    Stale,
    /// Network response with no prior cached entry
    Miss,
    /// Network response that replaced a stale entry
    Revalidated,
    /// Locally fabricated failure response
    Synthetic,
}

impl ServeSource {
    /// Value for the `x-cache-status` response header.
    pub fn as_header_value(&self) -> &'static str {
        match self {
            ServeSource::Hit => "HIT",
            ServeSource::Stale => "STALE",
            ServeSource::Miss => "MISS",
            ServeSource::Revalidated => "REFRESHED",
            ServeSource::Synthetic => "SYNTHETIC",
        }
    }
}

// == Served ==
/// Outcome of an intercepted request.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: HttpResponse,
    pub source: ServeSource,
    pub class: ResourceClass,
}

// == Orchestrator ==
/// Per-request strategy executor. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<RequestClassifier>,
    policies: Arc<PolicySet>,
    jobs: BackgroundJobs,
    stats: Arc<Mutex<HashMap<String, CacheStats>>>,
    /// Serializes eviction passes so concurrent trims never over-evict
    trim_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Orchestrator {
    // == Constructor ==
    pub fn new(
        store: Arc<CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        classifier: RequestClassifier,
        policies: PolicySet,
        jobs: BackgroundJobs,
    ) -> Self {
        Self {
            store,
            fetcher,
            classifier: Arc::new(classifier),
            policies: Arc::new(policies),
            jobs,
            stats: Arc::new(Mutex::new(HashMap::new())),
            trim_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    pub fn jobs(&self) -> &BackgroundJobs {
        &self.jobs
    }

    pub fn classify(&self, request: &FetchRequest) -> ResourceClass {
        self.classifier.classify_request(request)
    }

    // == Handle ==
    /// Serves a request according to its class.
    ///
    /// Returns `None` for passthrough requests, which this layer does not
    /// handle.
    pub async fn handle(&self, request: &FetchRequest) -> Option<Served> {
        let class = self.classify(request);
        let policy = self.policies.for_class(class)?;
        let key = request.cache_key()?;

        let outcome = match policy.strategy {
            Strategy::CacheFirstBackgroundRefresh => {
                self.cache_first_background_refresh(policy, key, request).await
            }
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(policy, key, request).await
            }
            Strategy::NetworkFirstFallback => self.network_first_fallback(policy, key, request).await,
        };

        debug!(
            namespace = %policy.namespace,
            url = %request.url,
            source = outcome.source.as_header_value(),
            status = %outcome.response.status,
            "served"
        );

        Some(Served {
            response: outcome.response,
            source: outcome.source,
            class,
        })
    }

    // == Cache First + Background Refresh ==
    async fn cache_first_background_refresh(
        &self,
        policy: &Policy,
        key: CacheKey,
        request: &FetchRequest,
    ) -> Outcome {
        let cached = match self.lookup(policy, &key).await {
            Lookup::Fresh(entry) => {
                self.schedule_refresh(policy, key, request);
                return Outcome::hit(entry);
            }
            Lookup::Stale(entry) => Some(entry),
            Lookup::Absent => None,
        };

        // Absent or stale: one synchronous attempt, then any cached copy
        let had_entry = cached.is_some();
        match self.fetch_and_store(policy, key, request).await {
            Ok(response) if response.is_success() => Outcome::network(response, had_entry),
            Ok(response) => {
                debug!(url = %request.url, status = %response.status, "tile fetch unsuccessful");
                self.fallback(policy, cached)
            }
            Err(err) => {
                debug!(url = %request.url, "tile fetch failed: {}", err);
                self.fallback(policy, cached)
            }
        }
    }

    // == Stale While Revalidate ==
    async fn stale_while_revalidate(
        &self,
        policy: &Policy,
        key: CacheKey,
        request: &FetchRequest,
    ) -> Outcome {
        match self.lookup(policy, &key).await {
            Lookup::Fresh(entry) => {
                self.schedule_refresh(policy, key, request);
                Outcome::hit(entry)
            }
            // Expired: try the network, serve the stale copy on error
            Lookup::Stale(stale) => match self.fetch_and_store(policy, key, request).await {
                Ok(response) if response.is_success() => Outcome::network(response, true),
                Ok(_) => self.fallback(policy, Some(stale)),
                Err(err) => {
                    debug!(url = %request.url, "api revalidation failed: {}", err);
                    self.fallback(policy, Some(stale))
                }
            },
            // Absent: block on the network, synthetic JSON failure on error
            Lookup::Absent => match self.fetch_and_store(policy, key, request).await {
                Ok(response) if response.is_success() => Outcome::network(response, false),
                Ok(response) => {
                    debug!(url = %request.url, status = %response.status, "api fetch unsuccessful");
                    self.fallback(policy, None)
                }
                Err(err) => {
                    debug!(url = %request.url, "api fetch failed: {}", err);
                    self.fallback(policy, None)
                }
            },
        }
    }

    // == Network First + Fallback ==
    async fn network_first_fallback(
        &self,
        policy: &Policy,
        key: CacheKey,
        request: &FetchRequest,
    ) -> Outcome {
        let cached = match self.lookup(policy, &key).await {
            Lookup::Fresh(entry) => return Outcome::hit(entry),
            Lookup::Stale(entry) => Some(entry),
            Lookup::Absent => None,
        };

        let had_entry = cached.is_some();
        match self.fetch_and_store(policy, key, request).await {
            Ok(response) if response.is_success() => Outcome::network(response, had_entry),
            Ok(_) => self.fallback(policy, cached),
            Err(err) => {
                debug!(url = %request.url, "static fetch failed: {}", err);
                self.fallback(policy, cached)
            }
        }
    }

    // == Helpers ==
    /// Store lookup classified against the policy's freshness window.
    async fn lookup(&self, policy: &Policy, key: &CacheKey) -> Lookup {
        let lookup = match self.store.get(&policy.namespace, key).await {
            Some(entry) if is_fresh(Some(&entry), policy.max_age) => Lookup::Fresh(entry),
            Some(entry) => Lookup::Stale(entry),
            None => Lookup::Absent,
        };
        match lookup {
            Lookup::Fresh(_) => self.record(&policy.namespace, CacheStats::record_hit),
            _ => self.record(&policy.namespace, CacheStats::record_miss),
        }
        lookup
    }

    /// Picks the answer when the network could not provide a usable one,
    /// either a transport error or a non-success status: the cached copy if
    /// any, else the strategy's synthetic failure.
    fn fallback(&self, policy: &Policy, cached: Option<CacheEntry>) -> Outcome {
        if let Some(entry) = cached {
            self.record(&policy.namespace, CacheStats::record_stale_hit);
            return Outcome {
                response: entry.to_response(),
                source: ServeSource::Stale,
            };
        }
        self.record(&policy.namespace, CacheStats::record_synthetic);
        Outcome {
            response: policy.strategy.synthetic_response(),
            source: ServeSource::Synthetic,
        }
    }

    /// One network attempt; successful responses are stamped and stored.
    async fn fetch_and_store(
        &self,
        policy: &Policy,
        key: CacheKey,
        request: &FetchRequest,
    ) -> Result<HttpResponse> {
        let response = self.fetcher.fetch(&request.for_cache_fill()).await?;
        if response.is_success() {
            self.record(&policy.namespace, CacheStats::record_network_fetch);
            self.store_response(policy, key, &response).await;
        }
        Ok(response)
    }

    /// Stamps and stores a response, then schedules eviction for bounded
    /// namespaces. Store faults are swallowed.
    async fn store_response(&self, policy: &Policy, key: CacheKey, response: &HttpResponse) {
        let entry = stamp(key, response);
        let label = entry.key.to_string();

        match self.store.put(&policy.namespace, entry).await {
            Ok(()) => {
                if let Some(max_entries) = policy.max_entries {
                    self.schedule_trim(&policy.namespace, max_entries);
                }
            }
            Err(err) => {
                warn!(namespace = %policy.namespace, key = %label, "cache write skipped: {}", err);
                self.record(&policy.namespace, CacheStats::record_store_failure);
            }
        }
    }

    /// Fire-and-forget refresh of an entry that was just served.
    ///
    /// At most one refresh per namespace and key runs at a time.
    fn schedule_refresh(&self, policy: &Policy, key: CacheKey, request: &FetchRequest) {
        if !policy.strategy.refreshes_on_hit() {
            return;
        }
        let job_key = format!("refresh:{}:{}", policy.namespace, key);
        let this = self.clone();
        let policy = policy.clone();
        let request = request.for_cache_fill();

        self.jobs.spawn_unique(job_key, async move {
            match this.fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    this.store_response(&policy, key, &response).await;
                    this.record(&policy.namespace, CacheStats::record_background_refresh);
                }
                Ok(response) => {
                    debug!(url = %request.url, status = %response.status, "background refresh not stored");
                }
                Err(err) => {
                    debug!(url = %request.url, "background refresh failed: {}", err);
                }
            }
        });
    }

    /// Best-effort eviction pass after a write to a bounded namespace.
    fn schedule_trim(&self, namespace: &str, max_entries: usize) {
        let this = self.clone();
        let namespace = namespace.to_string();

        self.jobs.spawn(async move {
            let _serialized = this.trim_lock.lock().await;
            let evicted = trim(&this.store, &namespace, max_entries).await;
            if evicted > 0 {
                debug!(%namespace, evicted, "namespace trimmed");
                this.record(&namespace, |stats| stats.record_evictions(evicted));
            }
        });
    }

    fn record(&self, namespace: &str, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(stats.entry(namespace.to_string()).or_default());
    }

    // == Stats ==
    /// Snapshot of the counters of every configured namespace.
    pub fn stats(&self) -> BTreeMap<String, CacheStats> {
        let stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        self.policies
            .all()
            .iter()
            .map(|policy| {
                let counters = stats.get(&policy.namespace).cloned().unwrap_or_default();
                (policy.namespace.clone(), counters)
            })
            .collect()
    }
}

/// State of a key in its namespace at lookup time.
enum Lookup {
    Fresh(CacheEntry),
    Stale(CacheEntry),
    Absent,
}

/// A strategy's answer before it is tagged with the request class.
struct Outcome {
    response: HttpResponse,
    source: ServeSource,
}

impl Outcome {
    fn hit(entry: CacheEntry) -> Self {
        Self {
            response: entry.to_response(),
            source: ServeSource::Hit,
        }
    }

    fn network(response: HttpResponse, replaced_stale: bool) -> Self {
        let source = if replaced_stale {
            ServeSource::Revalidated
        } else {
            ServeSource::Miss
        };
        Self { response, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_header_values() {
        assert_eq!(ServeSource::Hit.as_header_value(), "HIT");
        assert_eq!(ServeSource::Stale.as_header_value(), "STALE");
        assert_eq!(ServeSource::Miss.as_header_value(), "MISS");
        assert_eq!(ServeSource::Revalidated.as_header_value(), "REFRESHED");
        assert_eq!(ServeSource::Synthetic.as_header_value(), "SYNTHETIC");
    }

    #[test]
    fn test_outcome_network_source() {
        let response = HttpResponse::not_found();
        assert_eq!(
            Outcome::network(response.clone(), false).source,
            ServeSource::Miss
        );
        assert_eq!(
            Outcome::network(response, true).source,
            ServeSource::Revalidated
        );
    }
}
