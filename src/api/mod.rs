//! API Module
//!
//! HTTP surface of the proxy.
//!
//! # Endpoints
//! - `POST /__cache/control` - Clear the cache
//! - `GET /__cache/stats` - Cache statistics
//! - `GET /__cache/health` - Health check endpoint
//! - fallback - Every other request goes through the cache layer

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
