//! DRIFTLAB API - HTTP Layer
//!
//! Exposes the scenario engine over REST: one endpoint per scenario, a
//! playback surface for stepping through recorded traces, cluster status,
//! health probes, Prometheus metrics and the OpenAPI document.

pub mod config;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::{
    cluster_config_from_env, cluster_config_from_lookup, ApiConfig, ConfigError, StoreSettings,
};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use extractors::ValidatedJson;
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
