//! SWR Proxy - An intercepting HTTP cache
//!
//! Serves map tiles, API responses and static assets from namespaced caches
//! with per-class freshness windows, background refresh and offline
//! fallbacks.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod layer;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use controller::{CacheController, WarmReport};
pub use error::{CacheError, Result};
pub use layer::CacheLayer;
pub use orchestrator::{Orchestrator, ServeSource, Served};
