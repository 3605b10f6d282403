//! REST API Routes Module
//!
//! Route handlers grouped by surface:
//! - Scenario endpoints under /scenario/*
//! - Playback sessions under /scenario/playback/*
//! - Cluster status under /cluster/*
//! - Health check endpoints (Kubernetes-compatible)
//! - Metrics and OpenAPI documents

pub mod cluster;
pub mod health;
pub mod playback;
pub mod scenario;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware, TelemetryConfig};

pub use cluster::create_router as cluster_router;
pub use health::create_router as health_router;
pub use playback::create_router as playback_router;
pub use scenario::create_router as scenario_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json when Swagger UI is not compiled in.
#[cfg(not(feature = "swagger-ui"))]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

fn is_production(telemetry: &TelemetryConfig) -> bool {
    matches!(
        telemetry.environment.to_lowercase().as_str(),
        "production" | "prod"
    )
}

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set DRIFTLAB_CORS_ORIGINS.",
        ));
    }
    Ok(())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// Empty origins allow everything; otherwise only the configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// - Scenario endpoints at /scenario/*
/// - Playback at /scenario/playback/*
/// - Cluster status at /cluster/status
/// - Health checks at /health/*
/// - Metrics at /metrics (when enabled)
/// - OpenAPI spec at /openapi.json
/// - Swagger UI at /swagger-ui (when the swagger-ui feature is enabled)
///
/// In production, refuses to start without explicit CORS origins.
pub fn create_api_router(
    state: AppState,
    api_config: &ApiConfig,
    telemetry: &TelemetryConfig,
) -> ApiResult<Router> {
    if is_production(telemetry) {
        validate_api_config_for_production(api_config)?;
    }

    let mut router = Router::new()
        .nest("/scenario", scenario::create_router())
        .nest("/cluster", cluster::create_router())
        .nest("/health", health::create_router());

    if telemetry.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Swagger UI serves /openapi.json itself; registering it twice panics.
    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()));
    }
    #[cfg(not(feature = "swagger-ui"))]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }

    let mut router = router.with_state(state);
    if telemetry.metrics_enabled {
        router = router.layer(from_fn(observability_middleware));
    }

    // Execution order: HTTP trace -> CORS -> observability -> handler.
    // CORS needs a `Default` response body, which the trace body lacks.
    Ok(router
        .layer(build_cors_layer(api_config))
        .layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_requires_cors_origins() {
        let telemetry = TelemetryConfig {
            environment: "Production".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(is_production(&telemetry));
        assert!(validate_api_config_for_production(&ApiConfig::default()).is_err());

        let config = ApiConfig {
            cors_origins: vec!["https://lab.example.com".to_string()],
            ..ApiConfig::default()
        };
        assert!(validate_api_config_for_production(&config).is_ok());
    }

    #[test]
    fn test_development_is_not_production() {
        assert!(!is_production(&TelemetryConfig::default()));
    }
}
