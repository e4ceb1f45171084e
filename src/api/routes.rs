//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    collections_handler, delete_handler, expire_handler, get_handler, health_handler,
    history_handler, incr_handler, info_handler, invalidate_handler, keys_handler, mget_handler,
    ping_handler, set_handler, slow_queries_handler, stats_handler, track_requests, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health verdict, latest snapshot and recommendations
/// - `GET /ping`, `GET /info`, `GET /stats`, `GET /keys?pattern=`
/// - `PUT /cache` - SETEX with a JSON value and mandatory TTL
/// - `GET|DELETE /cache/:key`
/// - `POST /cache/:key/incr`, `POST /cache/:key/expire`
/// - `POST /mget` - Batch get
/// - `POST /invalidate` - Entity or pattern invalidation
/// - `GET /metrics/slow-queries|collections|history`
///
/// Every matched route is timed into the query monitor.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ping", get(ping_handler))
        .route("/info", get(info_handler))
        .route("/stats", get(stats_handler))
        .route("/keys", get(keys_handler))
        .route("/mget", post(mget_handler))
        .route("/cache", put(set_handler))
        .route("/cache/:key", get(get_handler).delete(delete_handler))
        .route("/cache/:key/incr", post(incr_handler))
        .route("/cache/:key/expire", post(expire_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/metrics/slow-queries", get(slow_queries_handler))
        .route("/metrics/collections", get(collections_handler))
        .route("/metrics/history", get(history_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
