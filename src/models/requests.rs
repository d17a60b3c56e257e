//! Request DTOs for the control API
//!
//! Defines the structure of incoming control messages.

use serde::Deserialize;

/// Control message accepted by `POST /__cache/control`.
///
/// Messages are tagged by `type`, e.g. `{"type": "CLEAR_CACHE"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Delete every namespace
    ClearCache,
}
