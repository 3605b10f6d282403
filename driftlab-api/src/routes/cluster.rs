//! Cluster status route.

use axum::{extract::State, routing::get, Json, Router};
use driftlab_core::ClusterStatus;
use driftlab_scenarios::TopologyInspector;

use crate::state::AppState;

/// GET /cluster/status - Reachability summary of every node
///
/// Always 200; an unreachable directory is reported in the body.
#[utoipa::path(
    get,
    path = "/cluster/status",
    tag = "Cluster",
    responses(
        (status = 200, description = "Cluster status, possibly offline", body = ClusterStatus),
    ),
)]
pub async fn cluster_status(State(inspector): State<TopologyInspector>) -> Json<ClusterStatus> {
    Json(inspector.status().await)
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/status", get(cluster_status))
}
