//! HTTP Route Tests
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`:
//! - Scenario endpoints return reports, and reject bad bodies with 400 before
//!   touching the store
//! - Playback hands out every step once and answers 404 afterwards
//! - Cluster status degrades instead of failing
//! - Health, metrics and OpenAPI endpoints respond

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use driftlab_api::telemetry::TelemetryConfig;
use driftlab_api::{create_api_router, ApiConfig, AppState};
use driftlab_test_utils::fixtures::{fixture_engine, Fixture, FAST_PROPAGATION};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// HELPERS
// ============================================================================

fn app(fx: &Fixture) -> Router {
    create_api_router(
        AppState::new(fx.engine.clone()),
        &ApiConfig::default(),
        &TelemetryConfig::default(),
    )
    .expect("router builds in development mode")
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(text) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(text)),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    (status, bytes.to_vec())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, body.map(|b| b.to_string())).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON response")
    };
    (status, value)
}

fn step_codes(report: &Value) -> Vec<String> {
    report["steps"]
        .as_array()
        .expect("steps array")
        .iter()
        .map(|s| s["code"].as_str().expect("step code").to_string())
        .collect()
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_invalidation_returns_report() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, report) = send(
        &app,
        Method::POST,
        "/scenario/near-cache/invalidation",
        Some(json!({"key": "k1", "initialValue": "v1", "updatedValue": "v2", "awaitMillis": 300})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["scenarioCode"], "near-cache-csc-invalidation");
    assert_eq!(
        step_codes(&report),
        vec![
            "warm-local",
            "baseline-remote",
            "publish-update",
            "verify-after-window",
            "eventual-check"
        ]
    );
    assert_eq!(report["context"]["updatedValue"], "v2");
}

#[tokio::test(start_paused = true)]
async fn test_blank_key_is_rejected_before_store_access() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, error) = send(
        &app,
        Method::POST,
        "/scenario/near-cache/invalidation",
        Some(json!({"key": "   ", "initialValue": "v1", "updatedValue": "v2"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_FAILED");
    assert!(error["message"].as_str().unwrap_or_default().contains("key"));
    assert_eq!(fx.store.len().expect("store readable"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_body_is_bad_request() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, bytes) = send_raw(
        &app,
        Method::POST,
        "/scenario/event-storm",
        Some("{\"key\": ".to_string()),
    )
    .await;
    let error: Value = serde_json::from_slice(&bytes).expect("JSON error body");

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_INPUT");
}

#[tokio::test(start_paused = true)]
async fn test_wrongly_typed_field_is_bad_request() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, error) = send(
        &app,
        Method::POST,
        "/scenario/near-cache/ttl-drift",
        Some(json!({"key": "k", "value": "v", "redisTtlSeconds": "five"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_FAILED");
}

#[tokio::test(start_paused = true)]
async fn test_event_storm_final_value_matches_iterations() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, report) = send(
        &app,
        Method::POST,
        "/scenario/event-storm",
        Some(json!({"key": "storm", "initialValue": "base", "iterations": 7})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let last = report["steps"]
        .as_array()
        .and_then(|steps| steps.last())
        .expect("at least one step");
    assert_eq!(last["observations"]["remote"], "base#7");
}

#[tokio::test(start_paused = true)]
async fn test_warmup_then_state() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, _) = send(
        &app,
        Method::POST,
        "/scenario/csc/warmup",
        Some(json!({"value": "warm", "ttlSeconds": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, report) = send(&app, Method::GET, "/scenario/csc/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["scenarioCode"], "client-side-cache-state");
    assert_eq!(report["context"]["localValue"], "warm");
}

#[tokio::test(start_paused = true)]
async fn test_cluster_topology_needs_no_body() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, report) = send(&app, Method::POST, "/scenario/cluster/topology", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(step_codes(&report), vec!["masters", "replicas"]);
}

// ============================================================================
// PLAYBACK
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_playback_walks_every_step_then_404() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, start) = send(
        &app,
        Method::POST,
        "/scenario/playback/start",
        Some(json!({
            "scenario": "invalidation",
            "parameters": {"key": "k1", "initialValue": "v1", "updatedValue": "v2", "awaitMillis": 300}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(start["scenarioCode"], "near-cache-csc-invalidation");
    assert_eq!(start["totalSteps"], 5);
    let token = start["token"].as_str().expect("token").to_string();

    let mut codes = Vec::new();
    for i in 0..5u64 {
        let (status, next) = send(
            &app,
            Method::POST,
            "/scenario/playback/next",
            Some(json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(next["remainingSteps"], 4 - i);
        assert_eq!(next["completed"], i == 4);
        codes.push(next["step"]["code"].as_str().expect("step").to_string());
    }
    assert_eq!(codes[0], "warm-local");
    assert_eq!(codes[4], "eventual-check");

    let (status, error) = send(
        &app,
        Method::POST,
        "/scenario/playback/next",
        Some(json!({"token": token})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "SESSION_NOT_FOUND");
}

#[tokio::test(start_paused = true)]
async fn test_playback_unknown_scenario_is_bad_request() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, error) = send(
        &app,
        Method::POST,
        "/scenario/playback/start",
        Some(json!({"scenario": "meltdown"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "UNKNOWN_SCENARIO");
}

#[tokio::test(start_paused = true)]
async fn test_playback_reset_is_idempotent() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (_, start) = send(
        &app,
        Method::POST,
        "/scenario/playback/start",
        Some(json!({"scenario": "cluster-topology"})),
    )
    .await;
    let token = start["token"].clone();

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            Method::POST,
            "/scenario/playback/reset",
            Some(json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/scenario/playback/next",
        Some(json!({"token": token})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_token_is_not_found() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, _) = send(
        &app,
        Method::POST,
        "/scenario/playback/next",
        Some(json!({"token": "no-such-token"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// CLUSTER AND HEALTH
// ============================================================================

#[tokio::test]
async fn test_cluster_status_reports_outage_in_body() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, body) = send(&app, Method::GET, "/cluster/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["online"], true);
    assert_eq!(body["masterCount"], 3);
    assert_eq!(body["replicaCount"], 3);

    fx.cluster.set_available(false);
    let (status, body) = send(&app, Method::GET, "/cluster/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["online"], false);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_health_endpoints() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, bytes) = send_raw(&app, Method::GET, "/health/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"pong");

    let (status, body) = send(&app, Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["store"]["status"], "healthy");
    assert_eq!(body["details"]["playbackSessions"], 0);
}

#[tokio::test]
async fn test_readiness_degrades_when_cluster_is_down() {
    let fx = fixture_engine(FAST_PROPAGATION);
    fx.cluster.set_available(false);
    let app = app(&fx);

    let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["details"]["cluster"]["status"], "degraded");
}

#[tokio::test]
async fn test_metrics_and_openapi_are_served() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let _ = send(&app, Method::GET, "/health/live", None).await;
    let (status, bytes) = send_raw(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).expect("utf-8 metrics");
    assert!(text.contains("driftlab_http_requests_total"));

    let (status, doc) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/scenario/playback/next"].is_object());
}

#[tokio::test]
async fn test_openapi_document_is_served_once_with_default_features() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, doc) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "DRIFTLAB API");
}

#[cfg(feature = "swagger-ui")]
#[tokio::test]
async fn test_swagger_ui_is_mounted() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let (status, bytes) = send_raw(&app, Method::GET, "/swagger-ui/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!bytes.is_empty());
}

#[tokio::test]
async fn test_cors_preflight_passes_through_trace_layer() {
    let fx = fixture_engine(FAST_PROPAGATION);
    let app = app(&fx);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/scenario/event-storm")
        .header(header::ORIGIN, "https://lab.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("request builds");
    let response = app.oneshot(request).await.expect("router is infallible");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
