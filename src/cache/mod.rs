//! Cache Module
//!
//! Namespaced response storage with capture-time stamping, freshness checks
//! and insertion-order eviction.

mod entry;
mod eviction;
mod freshness;
mod order;
mod stamp;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, CacheKey, CAPTURED_AT_HEADER};
pub use eviction::trim;
pub use freshness::{age_ms, is_fresh, is_fresh_at};
pub use order::InsertionOrder;
pub use stamp::{stamp, stamp_at};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Namespace Names ==
/// Namespace holding map tiles
pub const TILE_NAMESPACE: &str = "tile-cache";

/// Namespace holding API and geo-data responses
pub const API_NAMESPACE: &str = "api-cache";

/// Namespace holding scripts, styles and documents
pub const STATIC_NAMESPACE: &str = "static-cache";
