//! API Handlers
//!
//! HTTP request handlers over the cache client, the invalidation recipes
//! and the query monitor.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};

use crate::cache::{CacheClient, CacheStore, InProcessCache, Invalidator, SharedStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, ExpireRequest, ExpireResponse, GetResponse, IncrResponse, InfoQuery,
    InvalidateRequest, InvalidateResponse, KeysQuery, KeysResponse, MgetRequest, MgetResponse,
    SetResponse, SetexRequest, SlowQueriesResponse, SlowQueryParams, StatsResponse,
};
use crate::monitor::{
    CollectionPerformance, ConnectionGauge, HealthReport, HealthSnapshot, QueryMonitor,
    SharedMonitor,
};

/// Default number of slow queries returned by the slow-query endpoint
const DEFAULT_SLOW_QUERY_LIMIT: usize = 10;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The TTL store, for statistics and TTL lookups
    pub cache: SharedStore,
    /// Command surface every data operation goes through
    pub client: Arc<dyn CacheClient>,
    pub invalidator: Invalidator,
    pub monitor: SharedMonitor,
    /// Requests currently in flight
    pub connections: ConnectionGauge,
    pub started_at: Instant,
}

impl AppState {
    /// Creates a new AppState around the given store and monitor.
    pub fn new(cache: CacheStore, monitor: QueryMonitor) -> Self {
        let cache = cache.shared();
        Self {
            client: Arc::new(InProcessCache::new(cache.clone())),
            invalidator: Invalidator::new(cache.clone()),
            cache,
            monitor: monitor.shared(),
            connections: ConnectionGauge::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CacheStore::new(config.default_ttl),
            QueryMonitor::new(config.monitor_settings()),
        )
    }
}

/// Middleware counting in-flight requests and recording each request's
/// latency as a sample in the `api` collection.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let _connection = state.connections.enter();
    let name = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    state
        .monitor
        .write()
        .await
        .log_query(&name, elapsed_ms, "api", &method);
    response
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let (value, ttl) = state
        .cache
        .write()
        .await
        .get_with_ttl(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value, Some(ttl))))
}

/// Handler for PUT /cache
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetexRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    let result = state
        .client
        .setex(&req.key, req.ttl, &req.value.to_string())
        .await?;

    Ok(Json(SetResponse::new(result, req.key)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let removed = state.client.del(&key).await;
    Json(DeleteResponse { key, removed })
}

/// Handler for POST /cache/:key/incr
pub async fn incr_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<IncrResponse>> {
    let value = state.client.incr(&key).await?;
    Ok(Json(IncrResponse { key, value }))
}

/// Handler for POST /cache/:key/expire
pub async fn expire_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ExpireRequest>,
) -> Result<Json<ExpireResponse>> {
    let updated = state.client.expire(&key, req.ttl).await?;
    Ok(Json(ExpireResponse { key, updated }))
}

/// Handler for POST /mget
pub async fn mget_handler(
    State(state): State<AppState>,
    Json(req): Json<MgetRequest>,
) -> Json<MgetResponse> {
    let values = state
        .client
        .mget(&req.keys)
        .await
        .into_iter()
        .map(|raw| raw.and_then(|text| serde_json::from_str(&text).ok()))
        .collect();
    Json(MgetResponse { values })
}

/// Handler for GET /keys
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Result<Json<KeysResponse>> {
    let pattern = query.pattern.unwrap_or_else(|| "*".to_string());
    let keys = state.client.keys(&pattern).await?;
    Ok(Json(KeysResponse { pattern, keys }))
}

/// Handler for GET /info
pub async fn info_handler(State(state): State<AppState>, Query(query): Query<InfoQuery>) -> String {
    state.client.info(query.section.as_deref()).await
}

/// Handler for GET /ping
pub async fn ping_handler(State(state): State<AppState>) -> String {
    state.client.ping().await
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(StatsResponse::from(stats))
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    let removed = match req {
        InvalidateRequest::User { id } => state.invalidator.invalidate_user(id).await?,
        InvalidateRequest::Post { id, author_id } => {
            state
                .invalidator
                .invalidate_post(id, author_id.as_deref())
                .await?
        }
        InvalidateRequest::Location { id } => state.invalidator.invalidate_location(id).await?,
        InvalidateRequest::Pattern { pattern } => {
            state.invalidator.invalidate_pattern(&pattern).await?
        }
    };
    Ok(Json(InvalidateResponse { removed }))
}

/// Handler for GET /health
///
/// Responds 503 while the monitor reports unhealthy, with the same payload.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let uptime = state.started_at.elapsed().as_secs();
    let report = state.monitor.read().await.health_report(uptime);
    let status = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Handler for GET /metrics/slow-queries
pub async fn slow_queries_handler(
    State(state): State<AppState>,
    Query(params): Query<SlowQueryParams>,
) -> Json<SlowQueriesResponse> {
    let monitor = state.monitor.read().await;
    Json(SlowQueriesResponse {
        threshold_ms: monitor.settings().slow_query_threshold_ms,
        queries: monitor.slow_queries(params.limit.unwrap_or(DEFAULT_SLOW_QUERY_LIMIT)),
    })
}

/// Handler for GET /metrics/collections
pub async fn collections_handler(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, CollectionPerformance>> {
    Json(state.monitor.read().await.performance_by_collection())
}

/// Handler for GET /metrics/history
pub async fn history_handler(State(state): State<AppState>) -> Json<Vec<HealthSnapshot>> {
    Json(state.monitor.read().await.history())
}
