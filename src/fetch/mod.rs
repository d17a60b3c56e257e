//! Fetch Module
//!
//! Request/response types and the network boundary.

mod client;
mod request;
mod response;

pub use client::{strip_hop_by_hop, Fetcher, HttpFetcher};
pub use request::FetchRequest;
pub use response::HttpResponse;
