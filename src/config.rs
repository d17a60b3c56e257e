//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::policy::{
    ClassifierRules, PolicySet, DEFAULT_API_MAX_AGE, DEFAULT_STATIC_MAX_AGE,
    DEFAULT_TILE_MAX_AGE, DEFAULT_TILE_MAX_ENTRIES,
};

/// Application shell resources cached at startup.
const DEFAULT_WARM_SET: [&str; 5] = [
    "/",
    "/index.html",
    "/manifest.json",
    "/static/css/app.css",
    "/static/js/app.js",
];

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin the application shell is served from; relative request URIs
    /// and warm-set paths resolve against it
    pub app_origin: String,
    /// Upstream request timeout in milliseconds
    pub upstream_timeout_ms: u64,
    /// Tile freshness window in seconds
    pub tile_max_age_secs: u64,
    /// Tile namespace entry cap
    pub tile_max_entries: usize,
    /// API freshness window in seconds
    pub api_max_age_secs: u64,
    /// Static freshness window in seconds
    pub static_max_age_secs: u64,
    /// URL rules selecting each namespace
    pub rules: ClassifierRules,
    /// Paths or absolute URLs warmed into the static namespace
    pub warm_set: Vec<String>,
    /// Total bytes the store may hold; unset means unbounded
    pub storage_quota_bytes: Option<usize>,
    /// Largest request body accepted by the proxy
    pub max_request_body_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `APP_ORIGIN` - Application origin (default: http://localhost:8080)
    /// - `UPSTREAM_TIMEOUT_MS` - Upstream timeout (default: 15000)
    /// - `TILE_MAX_AGE_SECS` - Tile freshness (default: 2592000)
    /// - `TILE_MAX_ENTRIES` - Tile cap (default: 500)
    /// - `API_MAX_AGE_SECS` - API freshness (default: 300)
    /// - `STATIC_MAX_AGE_SECS` - Static freshness (default: 86400)
    /// - `TILE_HOSTS` - Comma-separated tile server hosts
    /// - `TILE_PATH_PATTERN` - Regex for tile paths
    /// - `API_PATH_PREFIXES` / `API_PATH_SUFFIXES` - API path rules
    /// - `STATIC_PATH_PREFIXES` - Static path rules
    /// - `WARM_SET` - Comma-separated warm-set paths
    /// - `STORAGE_QUOTA_BYTES` - Store quota (default: unbounded)
    /// - `MAX_REQUEST_BODY_BYTES` - Request body limit (default: 10485760)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let rules = ClassifierRules {
            tile_hosts: env_list("TILE_HOSTS").unwrap_or(defaults.rules.tile_hosts),
            tile_path_pattern: env::var("TILE_PATH_PATTERN")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.rules.tile_path_pattern),
            api_path_prefixes: env_list("API_PATH_PREFIXES")
                .unwrap_or(defaults.rules.api_path_prefixes),
            api_path_suffixes: env_list("API_PATH_SUFFIXES")
                .unwrap_or(defaults.rules.api_path_suffixes),
            static_path_prefixes: env_list("STATIC_PATH_PREFIXES")
                .unwrap_or(defaults.rules.static_path_prefixes),
        };

        Self {
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            app_origin: env::var("APP_ORIGIN")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.app_origin),
            upstream_timeout_ms: env_parse("UPSTREAM_TIMEOUT_MS")
                .unwrap_or(defaults.upstream_timeout_ms),
            tile_max_age_secs: env_parse("TILE_MAX_AGE_SECS").unwrap_or(defaults.tile_max_age_secs),
            tile_max_entries: env_parse("TILE_MAX_ENTRIES").unwrap_or(defaults.tile_max_entries),
            api_max_age_secs: env_parse("API_MAX_AGE_SECS").unwrap_or(defaults.api_max_age_secs),
            static_max_age_secs: env_parse("STATIC_MAX_AGE_SECS")
                .unwrap_or(defaults.static_max_age_secs),
            rules,
            warm_set: env_list("WARM_SET").unwrap_or(defaults.warm_set),
            storage_quota_bytes: env_parse("STORAGE_QUOTA_BYTES"),
            max_request_body_bytes: env_parse("MAX_REQUEST_BODY_BYTES")
                .unwrap_or(defaults.max_request_body_bytes),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Per-namespace policies built from the configured windows.
    pub fn policies(&self) -> PolicySet {
        PolicySet::new(
            Duration::from_secs(self.tile_max_age_secs),
            self.tile_max_entries,
            Duration::from_secs(self.api_max_age_secs),
            Duration::from_secs(self.static_max_age_secs),
        )
    }

    pub fn origin_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.app_origin)?)
    }

    /// Warm-set entries resolved against the application origin.
    pub fn warm_set_urls(&self) -> Result<Vec<Url>> {
        let origin = self.origin_url()?;
        self.warm_set
            .iter()
            .map(|path| Ok(origin.join(path)?))
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            app_origin: "http://localhost:8080".to_string(),
            upstream_timeout_ms: 15_000,
            tile_max_age_secs: DEFAULT_TILE_MAX_AGE.as_secs(),
            tile_max_entries: DEFAULT_TILE_MAX_ENTRIES,
            api_max_age_secs: DEFAULT_API_MAX_AGE.as_secs(),
            static_max_age_secs: DEFAULT_STATIC_MAX_AGE.as_secs(),
            rules: ClassifierRules::default(),
            warm_set: DEFAULT_WARM_SET.iter().map(|p| p.to_string()).collect(),
            storage_quota_bytes: None,
            max_request_body_bytes: 10 * 1024 * 1024,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Comma-separated list; `None` when unset or empty.
fn env_list(name: &str) -> Option<Vec<String>> {
    let items: Vec<String> = env::var(name)
        .ok()?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}
