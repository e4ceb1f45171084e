//! Error types for the cache and monitor
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
/// Unified error type for cache operations.
///
/// Only `InvalidArgument` is meant to reach callers of the command surface;
/// the other variants are absorbed by the fail-open layers and logged.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Non-positive TTL, empty key, malformed pattern, non-integer counter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Key not found in cache (HTTP surface only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Value could not be serialized or deserialized at the client boundary
    #[error("Serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Monitor Error Enum ==
/// Failures while gathering figures for a health snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// A system-wide figure (connections, memory, hit rate) was unavailable
    #[error("Probe failure: {0}")]
    Probe(String),

    /// Statistics for a single collection could not be computed
    #[error("Collection '{collection}' failed: {message}")]
    Collection { collection: String, message: String },
}
