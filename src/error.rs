//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the caching proxy.
///
/// Only a handful of these ever reach a client: the orchestrator recovers
/// store and network faults locally and answers with cached or synthetic
/// responses instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store has no room left for the entry
    #[error("Storage exhausted: {0}")]
    StorageExhausted(String),

    /// Upstream fetch failed at the transport level
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Network(err.to_string())
    }
}

impl From<url::ParseError> for CacheError {
    fn from(err: url::ParseError) -> Self {
        CacheError::InvalidRequest(format!("unparseable URL: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::StorageExhausted(msg) => (StatusCode::INSUFFICIENT_STORAGE, msg.clone()),
            CacheError::Network(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching proxy.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                CacheError::StorageExhausted("full".into()),
                StatusCode::INSUFFICIENT_STORAGE,
            ),
            (CacheError::Network("down".into()), StatusCode::BAD_GATEWAY),
            (
                CacheError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::Internal("oops".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_url_parse_error_is_invalid_request() {
        let err: CacheError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, CacheError::InvalidRequest(_)));
    }
}
