//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use discovery_cache::{
    api::create_router,
    cache::CacheStore,
    monitor::{MonitorSettings, QueryMonitor, SystemFigures},
    AppState,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_test::assert_ok;
use tower::ServiceExt;

// == Helper Functions ==

fn test_state() -> AppState {
    AppState::new(CacheStore::new(300), QueryMonitor::new(MonitorSettings::default()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn setex(app: &Router, key: &str, value: Value, ttl: u64) {
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            json!({"key": key, "value": value, "ttl": ttl}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// == SETEX / GET ==

#[tokio::test]
async fn test_setex_then_get_round_trip() {
    let app = create_router(test_state());

    setex(&app, "user:profile:7", json!({"name": "ada", "posts": 3}), 60).await;

    let response = app
        .clone()
        .oneshot(get_request("/cache/user:profile:7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "user:profile:7");
    assert_eq!(json["value"]["name"], "ada");
    assert!(json["ttl"].as_u64().unwrap() <= 60);
}

#[tokio::test]
async fn test_setex_reports_ok() {
    let app = create_router(test_state());

    let response = app
        .oneshot(json_request("PUT", "/cache", json!({"key": "k", "value": 1, "ttl": 5})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["result"], "OK");
}

#[tokio::test]
async fn test_setex_rejects_zero_ttl() {
    let app = create_router(test_state());

    let response = app
        .oneshot(json_request("PUT", "/cache", json!({"key": "k", "value": 1, "ttl": 0})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("TTL"));
}

#[tokio::test]
async fn test_setex_rejects_missing_ttl() {
    let app = create_router(test_state());

    let response = app
        .oneshot(json_request("PUT", "/cache", json!({"key": "k", "value": 1})))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let app = create_router(test_state());

    setex(&app, "short", json!("lived"), 1).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = app.oneshot(get_request("/cache/short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == DEL / INCR / EXPIRE ==

#[tokio::test]
async fn test_delete_twice_reports_counts() {
    let app = create_router(test_state());
    setex(&app, "gone", json!(true), 60).await;

    let first = app
        .clone()
        .oneshot(Request::builder().method("DELETE").uri("/cache/gone").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let second = app
        .oneshot(Request::builder().method("DELETE").uri("/cache/gone").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(body_to_json(first.into_body()).await["removed"], 1);
    assert_eq!(body_to_json(second.into_body()).await["removed"], 0);
}

#[tokio::test]
async fn test_incr_counts_up() {
    let app = create_router(test_state());

    for expected in 1..=3 {
        let response = app
            .clone()
            .oneshot(Request::builder().method("POST").uri("/cache/views/incr").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_to_json(response.into_body()).await["value"], expected);
    }
}

#[tokio::test]
async fn test_incr_non_integer_is_bad_request() {
    let app = create_router(test_state());
    setex(&app, "name", json!("ada"), 60).await;

    let response = app
        .oneshot(Request::builder().method("POST").uri("/cache/name/incr").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expire_existing_and_missing() {
    let app = create_router(test_state());
    setex(&app, "session", json!("s"), 600).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/cache/session/expire", json!({"ttl": 10})))
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["updated"], 1);

    let response = app
        .clone()
        .oneshot(get_request("/cache/session"))
        .await
        .unwrap();
    assert!(body_to_json(response.into_body()).await["ttl"].as_u64().unwrap() <= 10);

    let response = app
        .oneshot(json_request("POST", "/cache/missing/expire", json!({"ttl": 10})))
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["updated"], 0);
}

// == MGET / KEYS / INFO / PING / STATS ==

#[tokio::test]
async fn test_mget_preserves_order() {
    let app = create_router(test_state());
    setex(&app, "a", json!(1), 60).await;
    setex(&app, "c", json!({"n": 3}), 60).await;

    let response = app
        .oneshot(json_request("POST", "/mget", json!({"keys": ["a", "b", "c"]})))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["values"], json!([1, null, {"n": 3}]));
}

#[tokio::test]
async fn test_keys_with_pattern() {
    let app = create_router(test_state());
    setex(&app, "search:cats:all:1", json!([]), 60).await;
    setex(&app, "search:dogs:all:1", json!([]), 60).await;
    setex(&app, "user:1", json!({}), 60).await;

    let response = app
        .oneshot(get_request("/keys?pattern=search:*"))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["keys"], json!(["search:cats:all:1", "search:dogs:all:1"]));
}

#[tokio::test]
async fn test_keys_empty_pattern_is_bad_request() {
    let app = create_router(test_state());

    let response = app.oneshot(get_request("/keys?pattern=")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_info_sections() {
    let app = create_router(test_state());
    setex(&app, "k", json!(1), 60).await;

    let response = app.clone().oneshot(get_request("/info")).await.unwrap();
    let text = body_to_string(response.into_body()).await;
    assert!(text.contains("# Server"));
    assert!(text.contains("keys:1"));

    let response = app.oneshot(get_request("/info?section=memory")).await.unwrap();
    let text = body_to_string(response.into_body()).await;
    assert!(text.contains("# Memory"));
    assert!(!text.contains("# Server"));
}

#[tokio::test]
async fn test_ping_returns_pong() {
    let app = create_router(test_state());

    let response = app.oneshot(get_request("/ping")).await.unwrap();

    assert_eq!(body_to_string(response.into_body()).await, "PONG");
}

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let app = create_router(test_state());
    setex(&app, "k", json!(1), 60).await;

    app.clone().oneshot(get_request("/cache/k")).await.unwrap();
    app.clone().oneshot(get_request("/cache/other")).await.unwrap();

    let response = app.oneshot(get_request("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
}

// == Invalidation ==

#[tokio::test]
async fn test_invalidate_user_spares_similar_ids() {
    let app = create_router(test_state());
    setex(&app, "user:42", json!({}), 60).await;
    setex(&app, "user:profile:42", json!({}), 60).await;
    setex(&app, "user:posts:42:1", json!([]), 60).await;
    setex(&app, "user:posts:421:1", json!([]), 60).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/invalidate", json!({"entity": "user", "id": "42"})))
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["removed"], 3);

    let response = app.oneshot(get_request("/keys")).await.unwrap();
    assert_eq!(
        body_to_json(response.into_body()).await["keys"],
        json!(["user:posts:421:1"])
    );
}

#[tokio::test]
async fn test_invalidate_post_with_author() {
    let app = create_router(test_state());
    setex(&app, "post:p1", json!({}), 60).await;
    setex(&app, "posts:trending:10", json!([]), 60).await;
    setex(&app, "feed:posts:42:1", json!([]), 60).await;
    setex(&app, "user:posts:42:1", json!([]), 60).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/invalidate",
            json!({"entity": "post", "id": "p1", "author_id": "42"}),
        ))
        .await
        .unwrap();

    assert_eq!(body_to_json(response.into_body()).await["removed"], 4);
}

#[tokio::test]
async fn test_invalidate_wildcard_id_rejected() {
    let app = create_router(test_state());
    setex(&app, "user:42", json!({}), 60).await;
    setex(&app, "user:posts:42:1", json!([]), 60).await;
    setex(&app, "user:7", json!({}), 60).await;

    for id in ["*", "4*"] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/invalidate", json!({"entity": "user", "id": id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app.oneshot(get_request("/keys")).await.unwrap();
    assert_eq!(
        body_to_json(response.into_body()).await["keys"],
        json!(["user:42", "user:7", "user:posts:42:1"])
    );
}

#[tokio::test]
async fn test_invalidate_unknown_entity_rejected() {
    let app = create_router(test_state());

    let response = app
        .oneshot(json_request("POST", "/invalidate", json!({"entity": "event", "id": "1"})))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == Health / Metrics ==

#[tokio::test]
async fn test_health_unavailable_before_first_snapshot() {
    let app = create_router(test_state());

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["healthy"], false);
    assert!(json.get("uptimeSeconds").is_some());
}

#[tokio::test]
async fn test_health_reports_low_hit_rate() {
    let state = test_state();
    state.monitor.write().await.collect_snapshot(SystemFigures {
        connection_count: 2,
        cache_hit_rate: 0.5,
        ..Default::default()
    });
    let app = create_router(state);

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["metrics"]["cacheHitRate"], 0.5);
    let recommendations = json["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert!(recommendations[0].as_str().unwrap().contains("TTL"));
}

#[tokio::test]
async fn test_slow_queries_endpoint() {
    let state = test_state();
    {
        let mut monitor = state.monitor.write().await;
        monitor.log_query("feed", 1500.0, "posts", "find");
        monitor.log_query("profile", 20.0, "users", "findOne");
        monitor.log_query("nearby", 2500.0, "locations", "aggregate");
    }
    let app = create_router(state);

    let response = app
        .oneshot(get_request("/metrics/slow-queries?limit=5"))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    let queries = json["queries"].as_array().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0]["operationName"], "nearby");
    assert_eq!(json["threshold_ms"], 1000.0);
}

#[tokio::test]
async fn test_collections_include_api_requests() {
    let app = create_router(test_state());
    app.clone().oneshot(get_request("/ping")).await.unwrap();

    let response = app
        .oneshot(get_request("/metrics/collections"))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["api"]["count"], 1);
}

#[tokio::test]
async fn test_history_lists_snapshots() {
    let state = test_state();
    state
        .monitor
        .write()
        .await
        .collect_snapshot(SystemFigures::default());
    let app = create_router(state);

    let response = app.oneshot(get_request("/metrics/history")).await.unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// == Real Server ==

#[tokio::test]
async fn test_served_over_tcp() {
    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, create_router(test_state())).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = assert_ok!(
        client
            .put(format!("{}/cache", base))
            .json(&json!({"key": "tcp", "value": [1, 2], "ttl": 30}))
            .send()
            .await
    );
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = assert_ok!(
        assert_ok!(client.get(format!("{}/cache/tcp", base)).send().await)
            .json()
            .await
    );
    assert_eq!(body["value"], json!([1, 2]));

    server.abort();
}
