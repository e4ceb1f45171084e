//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /cache` - SETEX a JSON value with a TTL
//! - `GET /cache/:key` - Retrieve a value and its remaining TTL
//! - `DELETE /cache/:key` - Delete a key
//! - `POST /cache/:key/incr` / `POST /cache/:key/expire`
//! - `POST /mget`, `GET /keys`, `GET /info`, `GET /ping`, `GET /stats`
//! - `POST /invalidate` - Entity invalidation recipes
//! - `GET /health` - Health verdict from the query monitor
//! - `GET /metrics/*` - Slow queries, per-collection latency, snapshot history

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
