//! Cache Statistics Module
//!
//! Per-namespace counters describing how requests were served.

use serde::Serialize;

// == Cache Stats ==
/// Tracks how a namespace's requests were answered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Served from a fresh entry
    pub hits: u64,
    /// Served from a stale entry after the network failed
    pub stale_hits: u64,
    /// No usable entry; the network was consulted
    pub misses: u64,
    /// Synchronous network fetches that succeeded
    pub network_fetches: u64,
    /// Synthetic failure responses returned
    pub synthetic: u64,
    /// Entries removed by the eviction manager
    pub evictions: u64,
    /// Background refreshes that stored a new entry
    pub background_refreshes: u64,
    /// Store writes that failed and were skipped
    pub store_failures: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the fresh hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    /// Stale fallbacks are a subset of misses and do not count as hits.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_stale_hit(&mut self) {
        self.stale_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_network_fetch(&mut self) {
        self.network_fetches += 1;
    }

    pub fn record_synthetic(&mut self) {
        self.synthetic += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_background_refresh(&mut self) {
        self.background_refreshes += 1;
    }

    pub fn record_store_failure(&mut self) {
        self.store_failures += 1;
    }
}
