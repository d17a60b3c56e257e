//! Per-namespace caching policies and the URL rules that select them.

use std::time::Duration;

use serde::Serialize;

use crate::cache::{API_NAMESPACE, STATIC_NAMESPACE, TILE_NAMESPACE};
use crate::fetch::HttpResponse;

/// Tile freshness window in the reference policy set (30 days)
pub const DEFAULT_TILE_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Tile namespace entry cap in the reference policy set
pub const DEFAULT_TILE_MAX_ENTRIES: usize = 500;
/// API freshness window in the reference policy set (5 minutes)
pub const DEFAULT_API_MAX_AGE: Duration = Duration::from_secs(5 * 60);
/// Static freshness window in the reference policy set (24 hours)
pub const DEFAULT_STATIC_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Tile paths look like `/{z}/{x}/{y}.png`.
pub const DEFAULT_TILE_PATH_PATTERN: &str = r"^/\d+/\d+/\d+\.png$";

// == Resource Class ==
/// What kind of resource a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Tile,
    Api,
    Static,
    /// Not cacheable; forwarded untouched
    Passthrough,
}

// == Strategy ==
/// How a namespace balances cached and network responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    /// Serve fresh entries and refresh them in the background; otherwise
    /// go to the network and fall back to any cached copy.
    CacheFirstBackgroundRefresh,
    /// Like cache-first, but an absent entry yields an empty JSON failure.
    StaleWhileRevalidate,
    /// Serve fresh entries without touching the network; otherwise try the
    /// network and fall back to any cached copy.
    NetworkFirstFallback,
}

impl Strategy {
    /// Response returned when neither cache nor network can answer.
    pub fn synthetic_response(&self) -> HttpResponse {
        match self {
            Strategy::CacheFirstBackgroundRefresh => HttpResponse::service_unavailable(),
            Strategy::StaleWhileRevalidate => HttpResponse::service_unavailable_json(),
            Strategy::NetworkFirstFallback => HttpResponse::not_found(),
        }
    }

    /// Whether a fresh hit also schedules a background refresh.
    pub fn refreshes_on_hit(&self) -> bool {
        matches!(
            self,
            Strategy::CacheFirstBackgroundRefresh | Strategy::StaleWhileRevalidate
        )
    }
}

// == Policy ==
/// Caching rules for one namespace.
#[derive(Debug, Clone)]
pub struct Policy {
    pub namespace: String,
    pub max_age: Duration,
    /// Hard cap on entries, enforced after every write. None = unbounded.
    pub max_entries: Option<usize>,
    pub strategy: Strategy,
}

// == Policy Set ==
/// The policy for each cacheable class.
#[derive(Debug, Clone)]
pub struct PolicySet {
    pub tile: Policy,
    pub api: Policy,
    pub static_assets: Policy,
}

impl PolicySet {
    /// Builds a set with the given windows and tile cap.
    pub fn new(
        tile_max_age: Duration,
        tile_max_entries: usize,
        api_max_age: Duration,
        static_max_age: Duration,
    ) -> Self {
        Self {
            tile: Policy {
                namespace: TILE_NAMESPACE.to_string(),
                max_age: tile_max_age,
                max_entries: Some(tile_max_entries),
                strategy: Strategy::CacheFirstBackgroundRefresh,
            },
            api: Policy {
                namespace: API_NAMESPACE.to_string(),
                max_age: api_max_age,
                max_entries: None,
                strategy: Strategy::StaleWhileRevalidate,
            },
            static_assets: Policy {
                namespace: STATIC_NAMESPACE.to_string(),
                max_age: static_max_age,
                max_entries: None,
                strategy: Strategy::NetworkFirstFallback,
            },
        }
    }

    /// Policy for a class; `None` for passthrough.
    pub fn for_class(&self, class: ResourceClass) -> Option<&Policy> {
        match class {
            ResourceClass::Tile => Some(&self.tile),
            ResourceClass::Api => Some(&self.api),
            ResourceClass::Static => Some(&self.static_assets),
            ResourceClass::Passthrough => None,
        }
    }

    /// Every policy, tile first.
    pub fn all(&self) -> [&Policy; 3] {
        [&self.tile, &self.api, &self.static_assets]
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::new(
            DEFAULT_TILE_MAX_AGE,
            DEFAULT_TILE_MAX_ENTRIES,
            DEFAULT_API_MAX_AGE,
            DEFAULT_STATIC_MAX_AGE,
        )
    }
}

// == Classifier Rules ==
/// URL pattern sets deciding which namespace a request belongs to.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    /// Tile servers allowed into the tile namespace
    pub tile_hosts: Vec<String>,
    /// Regex the tile path must match
    pub tile_path_pattern: String,
    pub api_path_prefixes: Vec<String>,
    pub api_path_suffixes: Vec<String>,
    pub static_path_prefixes: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            tile_hosts: [
                "tile.openstreetmap.org",
                "a.tile.openstreetmap.org",
                "b.tile.openstreetmap.org",
                "c.tile.openstreetmap.org",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            tile_path_pattern: DEFAULT_TILE_PATH_PATTERN.to_string(),
            api_path_prefixes: vec!["/api/".to_string()],
            api_path_suffixes: vec![".geojson".to_string()],
            static_path_prefixes: vec!["/static/".to_string(), "/assets/".to_string()],
        }
    }
}
