//! OpenAPI Specification for the DRIFTLAB API
//!
//! Generated by utoipa from the route annotations and the `ToSchema`
//! derives on the wire types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{HealthDetails, HealthResponse};
use crate::routes::{cluster, health, playback, scenario};
use crate::telemetry::metrics;

use driftlab_core::{
    ClusterStatus, EventStormParams, ExpirationParams, HashInvalidationParams, HealthCheck,
    HealthStatus, InvalidationParams, NearCacheStatusParams, NodeRole, NodeSnapshot, NodeStatus,
    PlaybackNext, PlaybackStart, PlaybackStartRequest, PlaybackTokenRequest, ScenarioReport,
    ScenarioStep, StringChurnParams, TtlDriftParams, WarmupParams,
};

/// OpenAPI document for the DRIFTLAB API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DRIFTLAB API",
        version = "0.4.0",
        description = "Near-cache consistency scenarios with step-by-step playback",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Scenarios", description = "Run a consistency scenario and return its full report"),
        (name = "Playback", description = "Step through a scenario report one step at a time"),
        (name = "Cluster", description = "Cluster reachability"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Scenario Routes ===
        scenario::invalidation,
        scenario::ttl_drift,
        scenario::hash_invalidation,
        scenario::near_cache_status,
        scenario::event_storm,
        scenario::string_churn,
        scenario::expire_policy,
        scenario::csc_warmup,
        scenario::csc_state,
        scenario::cluster_topology,
        scenario::replica_readiness,

        // === Playback Routes ===
        playback::start_playback,
        playback::next_step,
        playback::reset_playback,

        // === Cluster / Health / Metrics ===
        cluster::cluster_status,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            ApiError, ErrorCode,

            // === Scenario Types ===
            ScenarioReport, ScenarioStep,
            InvalidationParams, TtlDriftParams, HashInvalidationParams, NearCacheStatusParams,
            EventStormParams, StringChurnParams, ExpirationParams, WarmupParams,

            // === Playback Types ===
            PlaybackStartRequest, PlaybackTokenRequest, PlaybackStart, PlaybackNext,

            // === Cluster Types ===
            ClusterStatus, NodeStatus, NodeSnapshot, NodeRole,

            // === Health Types ===
            HealthResponse, HealthDetails, HealthCheck, HealthStatus
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
