//! Response DTOs for the control API
//!
//! Defines the structure of outgoing JSON bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Acknowledgement of a control message.
#[derive(Debug, Clone, Serialize)]
pub struct ControlAck {
    /// Echo of the message type
    #[serde(rename = "type")]
    pub kind: String,
    /// Always "ok" once the command completed
    pub status: String,
    /// Namespaces deleted by a clear
    pub namespaces_cleared: usize,
}

impl ControlAck {
    /// Acknowledges a completed CLEAR_CACHE.
    pub fn cleared(namespaces_cleared: usize) -> Self {
        Self {
            kind: "CLEAR_CACHE".to_string(),
            status: "ok".to_string(),
            namespaces_cleared,
        }
    }
}

/// Counters and size of one namespace.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStats {
    pub namespace: String,
    /// Current number of entries
    pub entries: usize,
    /// Approximate bytes held
    pub bytes: usize,
    /// Entry cap, if the namespace is bounded
    pub max_entries: Option<usize>,
    /// Fresh hits / (hits + misses)
    pub hit_rate: f64,
    #[serde(flatten)]
    pub counters: CacheStats,
}

impl NamespaceStats {
    pub fn new(
        namespace: impl Into<String>,
        entries: usize,
        bytes: usize,
        max_entries: Option<usize>,
        counters: CacheStats,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            entries,
            bytes,
            max_entries,
            hit_rate: counters.hit_rate(),
            counters,
        }
    }
}

/// Response body for `GET /__cache/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub namespaces: Vec<NamespaceStats>,
    /// Background jobs not yet reaped
    pub pending_jobs: usize,
}

/// Response body for `GET /__cache/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" once initialized, "starting" before
    pub status: String,
    pub ready: bool,
    pub active: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(ready: bool, active: bool) -> Self {
        let status = if ready { "healthy" } else { "starting" };
        Self {
            status: status.to_string(),
            ready,
            active,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
