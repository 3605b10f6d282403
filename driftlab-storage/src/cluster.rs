//! Cluster directory capability.
//!
//! [`ClusterDirectory`] enumerates the nodes of the remote deployment by
//! role; each [`ClusterNode`] answers ping and diagnostic probes. The
//! in-memory [`StaticClusterDirectory`] is seeded from a node list and lets
//! tests take individual nodes (or the whole directory) offline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use driftlab_core::{ClusterError, DriftResult, NodeInfo, NodeRole, ValidationError};

// ============================================================================
// CAPABILITY
// ============================================================================

#[async_trait]
pub trait ClusterNode: Send + Sync {
    fn address(&self) -> &str;

    fn role(&self) -> NodeRole;

    async fn ping(&self) -> DriftResult<bool>;

    /// Cluster-level diagnostic block (`CLUSTER INFO` style).
    async fn cluster_info(&self) -> DriftResult<NodeInfo>;

    /// Server-level diagnostic block (`INFO server` style).
    async fn server_info(&self) -> DriftResult<NodeInfo>;
}

#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// Nodes currently known with the given role.
    async fn nodes(&self, role: NodeRole) -> DriftResult<Vec<Arc<dyn ClusterNode>>>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// One configured node: `host:port@role`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub address: String,
    pub role: NodeRole,
}

impl NodeSpec {
    pub fn new(address: impl Into<String>, role: NodeRole) -> Self {
        Self {
            address: address.into(),
            role,
        }
    }

    /// Parse `host:port@role`.
    pub fn parse(entry: &str) -> Result<Self, ValidationError> {
        let (address, role) = entry
            .trim()
            .rsplit_once('@')
            .ok_or_else(|| ValidationError::invalid("clusterNodes", format!("'{entry}' is not address@role")))?;
        if address.trim().is_empty() {
            return Err(ValidationError::invalid(
                "clusterNodes",
                format!("'{entry}' has an empty address"),
            ));
        }
        let role = NodeRole::parse(role).ok_or_else(|| {
            ValidationError::invalid("clusterNodes", format!("unknown role '{role}'"))
        })?;
        Ok(Self::new(address.trim(), role))
    }
}

/// Node list for the static directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub nodes: Vec<NodeSpec>,
}

impl Default for ClusterConfig {
    /// Three masters on 7000-7002 and three replicas on 7003-7005.
    fn default() -> Self {
        let nodes = (0..6)
            .map(|i| {
                let role = if i < 3 { NodeRole::Master } else { NodeRole::Replica };
                NodeSpec::new(format!("127.0.0.1:{}", 7000 + i), role)
            })
            .collect();
        Self { nodes }
    }
}

impl ClusterConfig {
    /// Parse a comma-separated `addr@role` list. Blank entries are skipped.
    pub fn parse_list(raw: &str) -> Result<Self, ValidationError> {
        let nodes = raw
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(NodeSpec::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { nodes })
    }
}

// ============================================================================
// IN-MEMORY DIRECTORY
// ============================================================================

/// Simulated node whose reachability can be toggled.
#[derive(Debug)]
pub struct SimulatedNode {
    address: String,
    role: NodeRole,
    started_at: Instant,
    reachable: AtomicBool,
    info_available: AtomicBool,
}

impl SimulatedNode {
    pub fn new(spec: &NodeSpec) -> Self {
        Self {
            address: spec.address.clone(),
            role: spec.role,
            started_at: Instant::now(),
            reachable: AtomicBool::new(true),
            info_available: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Make diagnostic probes fail while ping keeps working.
    pub fn set_info_available(&self, available: bool) {
        self.info_available.store(available, Ordering::SeqCst);
    }

    fn probe(&self) -> DriftResult<()> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(ClusterError::NodeUnreachable {
                address: self.address.clone(),
                reason: "connection refused".to_string(),
            }
            .into());
        }
        if !self.info_available.load(Ordering::SeqCst) {
            return Err(ClusterError::NodeUnreachable {
                address: self.address.clone(),
                reason: "diagnostics disabled".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn port(&self) -> &str {
        self.address.rsplit_once(':').map(|(_, p)| p).unwrap_or("")
    }
}

#[async_trait]
impl ClusterNode for SimulatedNode {
    fn address(&self) -> &str {
        &self.address
    }

    fn role(&self) -> NodeRole {
        self.role
    }

    async fn ping(&self) -> DriftResult<bool> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(true)
        } else {
            Err(ClusterError::NodeUnreachable {
                address: self.address.clone(),
                reason: "connection refused".to_string(),
            }
            .into())
        }
    }

    async fn cluster_info(&self) -> DriftResult<NodeInfo> {
        self.probe()?;
        let mut info = NodeInfo::new();
        info.insert("cluster_enabled".into(), "1".into());
        info.insert("cluster_state".into(), "ok".into());
        info.insert("cluster_slots_assigned".into(), "16384".into());
        Ok(info)
    }

    async fn server_info(&self) -> DriftResult<NodeInfo> {
        self.probe()?;
        let mut info = NodeInfo::new();
        let role = match self.role {
            NodeRole::Master => "master",
            NodeRole::Replica => "slave",
        };
        info.insert("role".into(), role.into());
        info.insert("tcp_port".into(), self.port().into());
        info.insert(
            "uptime_in_seconds".into(),
            self.started_at.elapsed().as_secs().to_string(),
        );
        Ok(info)
    }
}

/// Directory over a fixed set of simulated nodes.
#[derive(Debug)]
pub struct StaticClusterDirectory {
    nodes: Vec<Arc<SimulatedNode>>,
    available: AtomicBool,
}

impl StaticClusterDirectory {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            nodes: config
                .nodes
                .iter()
                .map(|spec| Arc::new(SimulatedNode::new(spec)))
                .collect(),
            available: AtomicBool::new(true),
        }
    }

    /// Make every listing fail with `DirectoryUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn node(&self, address: &str) -> Option<Arc<SimulatedNode>> {
        self.nodes.iter().find(|n| n.address == address).cloned()
    }
}

#[async_trait]
impl ClusterDirectory for StaticClusterDirectory {
    async fn nodes(&self, role: NodeRole) -> DriftResult<Vec<Arc<dyn ClusterNode>>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(ClusterError::DirectoryUnavailable {
                reason: "cluster not reachable".to_string(),
            }
            .into());
        }
        let start = Instant::now();
        let nodes: Vec<Arc<dyn ClusterNode>> = self
            .nodes
            .iter()
            .filter(|n| n.role == role)
            .map(|n| Arc::clone(n) as Arc<dyn ClusterNode>)
            .collect();
        tracing::debug!(
            role = %role,
            count = nodes.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Listed cluster nodes"
        );
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_spec_parse() {
        let spec = NodeSpec::parse(" 10.0.0.1:7001@slave ").unwrap();
        assert_eq!(spec.address, "10.0.0.1:7001");
        assert_eq!(spec.role, NodeRole::Replica);

        assert!(NodeSpec::parse("10.0.0.1:7001").is_err());
        assert!(NodeSpec::parse("@master").is_err());
        assert!(NodeSpec::parse("10.0.0.1:7001@arbiter").is_err());
    }

    #[test]
    fn test_cluster_config_default_layout() {
        let config = ClusterConfig::default();
        assert_eq!(config.nodes.len(), 6);
        assert_eq!(config.nodes[0].address, "127.0.0.1:7000");
        assert_eq!(config.nodes[5].address, "127.0.0.1:7005");
        assert_eq!(
            config.nodes.iter().filter(|n| n.role == NodeRole::Replica).count(),
            3
        );
    }

    #[test]
    fn test_parse_list_skips_blank_entries() {
        let config = ClusterConfig::parse_list("a:1@master, ,b:2@replica,").unwrap();
        assert_eq!(config.nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_directory_filters_by_role() {
        let directory = StaticClusterDirectory::new(&ClusterConfig::default());
        let masters = directory.nodes(NodeRole::Master).await.unwrap();
        assert_eq!(masters.len(), 3);
        assert!(masters.iter().all(|n| n.role() == NodeRole::Master));
    }

    #[tokio::test]
    async fn test_unreachable_node_fails_probes() {
        let directory = StaticClusterDirectory::new(&ClusterConfig::default());
        let node = directory.node("127.0.0.1:7003").unwrap();
        node.set_reachable(false);
        assert!(node.ping().await.is_err());
        assert!(node.server_info().await.is_err());

        node.set_reachable(true);
        node.set_info_available(false);
        assert!(node.ping().await.unwrap());
        assert!(node.cluster_info().await.is_err());
    }

    #[tokio::test]
    async fn test_directory_unavailable() {
        let directory = StaticClusterDirectory::new(&ClusterConfig::default());
        directory.set_available(false);
        let err = directory
            .nodes(NodeRole::Replica)
            .await
            .err()
            .expect("directory offline");
        assert_eq!(err.kind(), "ClusterError");
    }

    #[tokio::test]
    async fn test_server_info_reports_port_and_role() {
        let node = SimulatedNode::new(&NodeSpec::new("127.0.0.1:7004", NodeRole::Replica));
        let info = node.server_info().await.unwrap();
        assert_eq!(info.get("tcp_port").map(String::as_str), Some("7004"));
        assert_eq!(info.get("role").map(String::as_str), Some("slave"));
    }
}
