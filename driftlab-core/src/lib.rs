//! DRIFTLAB Core - Shared Types
//!
//! Data types shared by every DRIFTLAB crate: the scenario report model,
//! validated request types, playback and topology wire types, and the
//! error taxonomy. This crate contains no store access and no timing logic.

pub mod error;
pub mod health;
pub mod playback;
pub mod report;
pub mod request;
pub mod topology;

pub use error::{
    ClusterError, DriftError, DriftResult, ScenarioError, StoreError, ValidationError,
};
pub use health::{HealthCheck, HealthStatus};
pub use playback::{PlaybackNext, PlaybackStart, PlaybackStartRequest, PlaybackTokenRequest};
pub use report::{observation_value, Observations, ScenarioReport, ScenarioStep};
pub use request::{
    EventStormParams, EventStormRequest, ExpirationParams, ExpirationRequest,
    HashInvalidationParams, HashInvalidationRequest, InvalidationParams, InvalidationRequest,
    NearCacheStatusParams, NearCacheStatusRequest, StringChurnParams, StringChurnRequest,
    TtlDriftParams, TtlDriftRequest, WarmupParams, WarmupRequest,
};
pub use topology::{ClusterStatus, NodeInfo, NodeRole, NodeSnapshot, NodeStatus};

// ============================================================================
// RESERVED NAMES
// ============================================================================

/// String map backing the invalidation, drift, status and storm scenarios.
pub const SCENARIO_MAP_NAME: &str = "scenario:csc-map";

/// Map of field maps backing the hash invalidation scenario.
pub const SCENARIO_HASH_NAME: &str = "scenario:csc-hash";

/// Single-value bucket backing the warmup, state and expiration scenarios.
pub const SCENARIO_BUCKET_NAME: &str = "scenario:csc-bucket";
