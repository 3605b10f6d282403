//! Cluster topology types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a node in the remote cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeRole {
    Master,
    Replica,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Master => "MASTER",
            NodeRole::Replica => "REPLICA",
        }
    }

    /// Parse a role name. Accepts the legacy `slave` spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "master" | "primary" => Some(NodeRole::Master),
            "replica" | "slave" => Some(NodeRole::Replica),
            _ => None,
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value diagnostic block returned by a node probe.
pub type NodeInfo = BTreeMap<String, String>;

/// Full diagnostic view of one node, as recorded by topology scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub address: String,
    pub node_type: NodeRole,
    pub ping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_info: Option<NodeInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<NodeInfo>,
}

/// Compact per-node entry of [`ClusterStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub address: String,
    pub node_type: NodeRole,
    pub ping: bool,
}

/// Cluster reachability summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    pub online: bool,
    pub master_count: usize,
    pub replica_count: usize,
    pub nodes: Vec<NodeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterStatus {
    pub fn online(nodes: Vec<NodeStatus>) -> Self {
        let master_count = nodes.iter().filter(|n| n.node_type == NodeRole::Master).count();
        let replica_count = nodes.iter().filter(|n| n.node_type == NodeRole::Replica).count();
        Self {
            online: true,
            master_count,
            replica_count,
            nodes,
            error: None,
        }
    }

    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            online: false,
            master_count: 0,
            replica_count: 0,
            nodes: Vec::new(),
            error: Some(error.into()),
        }
    }
}
