//! Request and Response models for the control API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing control and admin bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::ControlMessage;
pub use responses::{ControlAck, ErrorResponse, HealthResponse, NamespaceStats, StatsResponse};
