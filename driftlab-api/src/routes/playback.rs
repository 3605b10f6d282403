//! Playback REST API Routes
//!
//! Start a scenario as a steppable session, pull its steps one at a time,
//! and drop it. Tokens travel in the request body.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use driftlab_core::{PlaybackNext, PlaybackStart, PlaybackStartRequest, PlaybackTokenRequest};
use driftlab_scenarios::{PlaybackManager, ScenarioKind};

use crate::{
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    state::AppState,
    telemetry::METRICS,
};

fn publish_session_count(manager: &PlaybackManager) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.set_playback_sessions(manager.active_sessions());
    }
}

/// POST /scenario/playback/start - Run a scenario and open a session
#[utoipa::path(
    post,
    path = "/scenario/playback/start",
    tag = "Playback",
    request_body = PlaybackStartRequest,
    responses(
        (status = 200, description = "Session opened", body = PlaybackStart),
        (status = 400, description = "Unknown scenario or invalid parameters", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError),
    ),
)]
pub async fn start_playback(
    State(manager): State<PlaybackManager>,
    ValidatedJson(req): ValidatedJson<PlaybackStartRequest>,
) -> ApiResult<Json<PlaybackStart>> {
    let started = Instant::now();
    let result = manager.start(&req.scenario, req.parameters).await;

    // Unknown names never reach the metrics, keeping the label set closed.
    if let (Ok(kind), Ok(metrics)) = (ScenarioKind::parse(&req.scenario), METRICS.as_ref()) {
        metrics.record_scenario_run(kind.name(), result.is_ok(), started.elapsed().as_secs_f64());
    }
    publish_session_count(&manager);

    result.map(Json).map_err(|e| {
        tracing::warn!(scenario = %req.scenario, error = %e, "Playback start rejected");
        ApiError::from(e)
    })
}

/// POST /scenario/playback/next - Pull the next step of a session
#[utoipa::path(
    post,
    path = "/scenario/playback/next",
    tag = "Playback",
    request_body = PlaybackTokenRequest,
    responses(
        (status = 200, description = "Next step", body = PlaybackNext),
        (status = 404, description = "Unknown or exhausted token", body = ApiError),
    ),
)]
pub async fn next_step(
    State(manager): State<PlaybackManager>,
    ValidatedJson(req): ValidatedJson<PlaybackTokenRequest>,
) -> ApiResult<Json<PlaybackNext>> {
    let next = manager.next(&req.token);
    if next.completed {
        publish_session_count(&manager);
    }
    if next.is_missing() {
        return Err(ApiError::session_not_found());
    }
    Ok(Json(next))
}

/// POST /scenario/playback/reset - Drop a session
#[utoipa::path(
    post,
    path = "/scenario/playback/reset",
    tag = "Playback",
    request_body = PlaybackTokenRequest,
    responses(
        (status = 200, description = "Session dropped, or never existed"),
    ),
)]
pub async fn reset_playback(
    State(manager): State<PlaybackManager>,
    ValidatedJson(req): ValidatedJson<PlaybackTokenRequest>,
) -> StatusCode {
    manager.reset(&req.token);
    publish_session_count(&manager);
    StatusCode::OK
}

/// Playback routes, mounted under `/scenario/playback`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_playback))
        .route("/next", post(next_step))
        .route("/reset", post(reset_playback))
}
