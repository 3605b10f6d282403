//! Topology inspection.
//!
//! Read-only and best-effort: a node that fails its ping is reported with
//! `ping = false`, a failed diagnostic probe is simply omitted, and a
//! directory that cannot be listed degrades to an empty node list.

use std::sync::Arc;

use driftlab_core::{
    observations, ClusterStatus, DriftError, DriftResult, NodeRole, NodeSnapshot, NodeStatus,
    Observations, ScenarioReport,
};
use driftlab_storage::{ClusterDirectory, ClusterNode};

use crate::engine::{step, ScenarioEngine};

pub const CLUSTER_TOPOLOGY_CODE: &str = "cluster-topology-inspection";
pub const REPLICA_READINESS_CODE: &str = "replica-readiness";

/// Node listing for one role, with the listing error if there was one.
#[derive(Debug, Clone, Default)]
pub struct RoleListing {
    pub nodes: Vec<NodeSnapshot>,
    pub error: Option<String>,
}

impl RoleListing {
    /// Observations keyed by `label`, plus `error` when the listing failed.
    fn into_observations(self, label: &str) -> Observations {
        let mut obs = observations! { label => self.nodes };
        if let Some(error) = self.error {
            obs.insert("error".into(), error.into());
        }
        obs
    }
}

/// Best-effort reader over a [`ClusterDirectory`].
#[derive(Clone)]
pub struct TopologyInspector {
    directory: Arc<dyn ClusterDirectory>,
}

impl TopologyInspector {
    pub fn new(directory: Arc<dyn ClusterDirectory>) -> Self {
        Self { directory }
    }

    /// Snapshot every node with `role`. Never fails.
    pub async fn list(&self, role: NodeRole) -> RoleListing {
        match self.directory.nodes(role).await {
            Ok(nodes) => {
                let mut snapshots = Vec::with_capacity(nodes.len());
                for node in &nodes {
                    snapshots.push(snapshot(node.as_ref()).await);
                }
                RoleListing {
                    nodes: snapshots,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "Cluster directory listing failed");
                RoleListing {
                    nodes: Vec::new(),
                    error: Some(e.summary()),
                }
            }
        }
    }

    /// Reachability summary across masters and replicas.
    pub async fn status(&self) -> ClusterStatus {
        match self.statuses().await {
            Ok(nodes) => ClusterStatus::online(nodes),
            Err(e) => {
                tracing::warn!(error = %e, "Cluster status check failed");
                ClusterStatus::offline(e.summary())
            }
        }
    }

    async fn statuses(&self) -> Result<Vec<NodeStatus>, DriftError> {
        let mut statuses = Vec::new();
        for role in [NodeRole::Master, NodeRole::Replica] {
            for node in self.directory.nodes(role).await? {
                statuses.push(NodeStatus {
                    address: node.address().to_string(),
                    node_type: node.role(),
                    ping: ping(node.as_ref()).await,
                });
            }
        }
        Ok(statuses)
    }
}

async fn ping(node: &dyn ClusterNode) -> bool {
    match node.ping().await {
        Ok(up) => up,
        Err(e) => {
            tracing::debug!(address = node.address(), error = %e, "Node ping failed");
            false
        }
    }
}

async fn snapshot(node: &dyn ClusterNode) -> NodeSnapshot {
    let cluster_info = match node.cluster_info().await {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::debug!(address = node.address(), error = %e, "Cluster info probe failed");
            None
        }
    };
    let server_info = match node.server_info().await {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::debug!(address = node.address(), error = %e, "Server info probe failed");
            None
        }
    };
    NodeSnapshot {
        address: node.address().to_string(),
        node_type: node.role(),
        ping: ping(node).await,
        cluster_info,
        server_info,
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

impl ScenarioEngine {
    pub async fn cluster_topology(&self) -> DriftResult<ScenarioReport> {
        let masters = self.inspector.list(NodeRole::Master).await;
        let replicas = self.inspector.list(NodeRole::Replica).await;
        let master_count = masters.nodes.len();
        let replica_count = replicas.nodes.len();

        tracing::info!(master_count, replica_count, "Cluster topology inspected");

        Ok(ScenarioReport::new(
            CLUSTER_TOPOLOGY_CODE,
            vec![
                step(
                    "masters",
                    "Enumerate cluster master nodes",
                    masters.into_observations("masters"),
                ),
                step(
                    "replicas",
                    "Enumerate cluster replica nodes",
                    replicas.into_observations("replicas"),
                ),
            ],
            observations! {
                "masterCount" => master_count,
                "replicaCount" => replica_count,
            },
        ))
    }

    pub async fn replica_readiness(&self) -> DriftResult<ScenarioReport> {
        let replicas = self.inspector.list(NodeRole::Replica).await;
        let replica_count = replicas.nodes.len();

        let mut steps = vec![step(
            "replica-status",
            "List replica nodes and their health info",
            replicas.into_observations("replicas"),
        )];
        if replica_count == 0 {
            tracing::warn!("No replica nodes detected");
            steps.push(step(
                "replica-missing",
                "No replica nodes detected in the cluster",
                Observations::new(),
            ));
        }

        Ok(ScenarioReport::new(
            REPLICA_READINESS_CODE,
            steps,
            observations! { "replicaCount" => replica_count },
        ))
    }
}
