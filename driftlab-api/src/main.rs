//! DRIFTLAB API Server Entry Point
//!
//! Bootstraps configuration, wires the in-memory store, near-caches and
//! cluster directory, and starts the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use driftlab_api::{
    cluster_config_from_env, create_api_router, ApiConfig, ApiError, ApiResult, AppState,
    StoreSettings,
};
use driftlab_scenarios::ScenarioEngine;
use driftlab_storage::{InMemoryRemoteStore, RemoteStore, StaticClusterDirectory, StoreAdapter};

use driftlab_api::telemetry::{init_tracer, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let store_settings = StoreSettings::from_env();
    let cluster_config = cluster_config_from_env()?;

    let store = Arc::new(InMemoryRemoteStore::with_tracking_capacity(
        store_settings.tracking_capacity,
    ));
    let reaper = store.spawn_reaper(store_settings.reaper_interval);

    let shared: Arc<dyn RemoteStore> = store.clone();
    let adapter = Arc::new(StoreAdapter::connect(shared, &store_settings.near_cache));
    let cluster = Arc::new(StaticClusterDirectory::new(&cluster_config));
    tracing::info!(
        nodes = cluster_config.nodes.len(),
        propagation_ms = store_settings.near_cache.map.propagation_delay.as_millis(),
        noloop = store_settings.near_cache.map.noloop,
        "Store and cluster directory ready"
    );

    let engine = ScenarioEngine::new(adapter, cluster);
    let app: Router = create_api_router(AppState::new(engine), &api_config, &telemetry_config)?;

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting DRIFTLAB API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    reaper.abort();
    Ok(())
}
