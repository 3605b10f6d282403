//! Scenario REST API Routes
//!
//! One endpoint per catalog scenario. Each handler validates its body,
//! runs the scenario to completion and returns the recorded report.

use std::future::Future;
use std::time::Instant;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use driftlab_core::{
    DriftResult, EventStormParams, EventStormRequest, ExpirationParams, ExpirationRequest,
    HashInvalidationParams, HashInvalidationRequest, InvalidationParams, InvalidationRequest,
    NearCacheStatusParams, NearCacheStatusRequest, ScenarioReport, StringChurnParams,
    StringChurnRequest, TtlDriftParams, TtlDriftRequest, WarmupParams, WarmupRequest,
};
use driftlab_scenarios::{ScenarioEngine, ScenarioKind};

use crate::{
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    state::AppState,
    telemetry::METRICS,
};

// ============================================================================
// RUN HELPER
// ============================================================================

/// Await a scenario run, recording its duration and outcome.
pub(crate) async fn recorded<F>(kind: ScenarioKind, run: F) -> ApiResult<Json<ScenarioReport>>
where
    F: Future<Output = DriftResult<ScenarioReport>>,
{
    let start = Instant::now();
    let result = run.await;
    let elapsed = start.elapsed();

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_scenario_run(kind.name(), result.is_ok(), elapsed.as_secs_f64());
    }

    match result {
        Ok(report) => {
            tracing::info!(
                scenario = kind.name(),
                steps = report.steps().len(),
                duration_ms = elapsed.as_millis(),
                "Scenario completed"
            );
            Ok(Json(report))
        }
        Err(e) => {
            tracing::warn!(scenario = kind.name(), error = %e, "Scenario failed");
            Err(ApiError::from(e))
        }
    }
}

// ============================================================================
// NEAR-CACHE HANDLERS
// ============================================================================

/// POST /scenario/near-cache/invalidation - Remote write vs. near-cache copy
#[utoipa::path(
    post,
    path = "/scenario/near-cache/invalidation",
    tag = "Scenarios",
    request_body = InvalidationParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn invalidation(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<InvalidationRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::Invalidation, engine.invalidation(&request)).await
}

/// POST /scenario/near-cache/ttl-drift - Local copy outliving the remote TTL
#[utoipa::path(
    post,
    path = "/scenario/near-cache/ttl-drift",
    tag = "Scenarios",
    request_body = TtlDriftParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn ttl_drift(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<TtlDriftRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::TtlDrift, engine.ttl_drift(&request)).await
}

/// POST /scenario/near-cache/hash-invalidation - Single field rewrite
#[utoipa::path(
    post,
    path = "/scenario/near-cache/hash-invalidation",
    tag = "Scenarios",
    request_body = HashInvalidationParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn hash_invalidation(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<HashInvalidationRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(
        ScenarioKind::HashInvalidation,
        engine.hash_invalidation(&request),
    )
    .await
}

/// POST /scenario/near-cache/status - Side-by-side local and remote view
#[utoipa::path(
    post,
    path = "/scenario/near-cache/status",
    tag = "Scenarios",
    request_body = NearCacheStatusParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
)]
pub async fn near_cache_status(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<NearCacheStatusRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(
        ScenarioKind::NearCacheStatus,
        engine.near_cache_status(&request),
    )
    .await
}

/// POST /scenario/event-storm - Burst of remote rewrites
#[utoipa::path(
    post,
    path = "/scenario/event-storm",
    tag = "Scenarios",
    request_body = EventStormParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn event_storm(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<EventStormRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::EventStorm, engine.event_storm(&request)).await
}

/// POST /scenario/string-churn - Keyspace churn with memory sampling
#[utoipa::path(
    post,
    path = "/scenario/string-churn",
    tag = "Scenarios",
    request_body = StringChurnParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn string_churn(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<StringChurnRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::StringChurn, engine.string_churn(&request)).await
}

// ============================================================================
// BUCKET HANDLERS
// ============================================================================

/// POST /scenario/expire-policy - Poll a TTL'd key until it disappears
#[utoipa::path(
    post,
    path = "/scenario/expire-policy",
    tag = "Scenarios",
    request_body = ExpirationParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn expire_policy(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<ExpirationRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::ExpirePolicy, engine.expire_policy(&request)).await
}

/// POST /scenario/csc/warmup - Write the bucket and read it back locally
#[utoipa::path(
    post,
    path = "/scenario/csc/warmup",
    tag = "Scenarios",
    request_body = WarmupParams,
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn csc_warmup(
    State(engine): State<ScenarioEngine>,
    ValidatedJson(request): ValidatedJson<WarmupRequest>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::CscWarmup, engine.warmup(&request)).await
}

/// GET /scenario/csc/state - Current bucket value and remaining TTL
#[utoipa::path(
    get,
    path = "/scenario/csc/state",
    tag = "Scenarios",
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn csc_state(State(engine): State<ScenarioEngine>) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::CscState, engine.csc_state()).await
}

// ============================================================================
// CLUSTER HANDLERS
// ============================================================================

/// POST /scenario/cluster/topology - Probe every master and replica
#[utoipa::path(
    post,
    path = "/scenario/cluster/topology",
    tag = "Scenarios",
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
    ),
)]
pub async fn cluster_topology(
    State(engine): State<ScenarioEngine>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::ClusterTopology, engine.cluster_topology()).await
}

/// POST /scenario/cluster/replica-readiness - Check replicas are reachable
#[utoipa::path(
    post,
    path = "/scenario/cluster/replica-readiness",
    tag = "Scenarios",
    responses(
        (status = 200, description = "Recorded scenario report", body = ScenarioReport),
    ),
)]
pub async fn replica_readiness(
    State(engine): State<ScenarioEngine>,
) -> ApiResult<Json<ScenarioReport>> {
    recorded(ScenarioKind::ReplicaReadiness, engine.replica_readiness()).await
}

// ============================================================================
// ROUTER
// ============================================================================

/// Scenario routes, mounted under `/scenario`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/near-cache/invalidation", post(invalidation))
        .route("/near-cache/ttl-drift", post(ttl_drift))
        .route("/near-cache/hash-invalidation", post(hash_invalidation))
        .route("/near-cache/status", post(near_cache_status))
        .route("/event-storm", post(event_storm))
        .route("/string-churn", post(string_churn))
        .route("/expire-policy", post(expire_policy))
        .route("/csc/warmup", post(csc_warmup))
        .route("/csc/state", get(csc_state))
        .route("/cluster/topology", post(cluster_topology))
        .route("/cluster/replica-readiness", post(replica_readiness))
        .nest("/playback", super::playback::create_router())
}
