//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for SETEX (PUT /cache)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: TTL in seconds; there is no default and no "forever"
#[derive(Debug, Clone, Deserialize)]
pub struct SetexRequest {
    pub key: String,
    pub value: Value,
    pub ttl: u64,
}

impl SetexRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.ttl == 0 {
            return Some("TTL must be a positive number of seconds".to_string());
        }
        None
    }
}

/// Request body for POST /cache/:key/expire
#[derive(Debug, Clone, Deserialize)]
pub struct ExpireRequest {
    pub ttl: u64,
}

/// Request body for POST /mget
#[derive(Debug, Clone, Deserialize)]
pub struct MgetRequest {
    pub keys: Vec<String>,
}

/// Request body for POST /invalidate
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum InvalidateRequest {
    User {
        id: String,
    },
    Post {
        id: String,
        #[serde(default)]
        author_id: Option<String>,
    },
    Location {
        id: String,
    },
    Pattern {
        pattern: String,
    },
}

/// Query string for GET /keys
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysQuery {
    pub pattern: Option<String>,
}

/// Query string for GET /info
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoQuery {
    pub section: Option<String>,
}

/// Query string for GET /metrics/slow-queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlowQueryParams {
    pub limit: Option<usize>,
}
