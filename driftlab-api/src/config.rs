//! API Configuration Module
//!
//! Server, store and cluster settings. Everything is loaded from environment
//! variables with defaults suitable for a local run.

use std::net::SocketAddr;
use std::time::Duration;

use driftlab_core::ValidationError;
use driftlab_storage::{ClusterConfig, StoreConfig, DEFAULT_TRACKING_CAPACITY};
use thiserror::Error;

use crate::error::ApiError;

/// Configuration loading errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port value: {0}")]
    InvalidPort(String),

    #[error("Invalid bind address {addr}: {reason}")]
    InvalidBindAddress { addr: String, reason: String },

    #[error("Invalid cluster node list: {0}")]
    InvalidClusterNodes(#[from] ValidationError),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

/// Parse `key` as `T`, falling back to `default` when unset or malformed.
fn parsed_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn flag_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins. Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    pub bind_host: String,

    /// Raw port string, validated by [`ApiConfig::bind_addr`].
    pub port: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            bind_host: "0.0.0.0".to_string(),
            port: "8080".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `DRIFTLAB_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `DRIFTLAB_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `DRIFTLAB_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `DRIFTLAB_API_BIND`: Listen host (default: 0.0.0.0)
    /// - `PORT` or `DRIFTLAB_API_PORT`: Listen port (default: 8080)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = lookup("DRIFTLAB_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cors_origins,
            cors_allow_credentials: flag_or(&lookup, "DRIFTLAB_CORS_ALLOW_CREDENTIALS", false),
            cors_max_age_secs: parsed_or(
                &lookup,
                "DRIFTLAB_CORS_MAX_AGE_SECS",
                defaults.cors_max_age_secs,
            ),
            bind_host: lookup("DRIFTLAB_API_BIND").unwrap_or(defaults.bind_host),
            port: lookup("PORT")
                .or_else(|| lookup("DRIFTLAB_API_PORT"))
                .unwrap_or(defaults.port),
        }
    }

    /// Resolve the listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let port = self
            .port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(self.port.clone()))?;

        let addr = format!("{}:{}", self.bind_host, port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddress {
                addr: addr.clone(),
                reason: e.to_string(),
            })
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

// ============================================================================
// STORE CONFIGURATION
// ============================================================================

/// In-memory store and near-cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub near_cache: StoreConfig,
    pub reaper_interval: Duration,
    pub tracking_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            near_cache: StoreConfig::default(),
            reaper_interval: Duration::from_millis(50),
            tracking_capacity: DEFAULT_TRACKING_CAPACITY,
        }
    }
}

impl StoreSettings {
    /// Environment variables:
    /// - `DRIFTLAB_PROPAGATION_DELAY_MS`: Invalidation delivery delay (default: 25)
    /// - `DRIFTLAB_REAPER_INTERVAL_MS`: Expiry reaper period (default: 50)
    /// - `DRIFTLAB_TRACKING_CAPACITY`: Invalidation channel capacity (default: 4096)
    /// - `DRIFTLAB_NOLOOP`: Ignore self-originated invalidations (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let propagation = parsed_or(&lookup, "DRIFTLAB_PROPAGATION_DELAY_MS", 25u64);
        let reaper = parsed_or(&lookup, "DRIFTLAB_REAPER_INTERVAL_MS", 50u64).max(1);
        let noloop = flag_or(&lookup, "DRIFTLAB_NOLOOP", true);

        Self {
            near_cache: StoreConfig::default()
                .with_propagation_delay(Duration::from_millis(propagation))
                .with_noloop(noloop),
            reaper_interval: Duration::from_millis(reaper),
            tracking_capacity: parsed_or(
                &lookup,
                "DRIFTLAB_TRACKING_CAPACITY",
                DEFAULT_TRACKING_CAPACITY,
            ),
        }
    }
}

// ============================================================================
// CLUSTER CONFIGURATION
// ============================================================================

/// Load the node list from `DRIFTLAB_CLUSTER_NODES` (`addr@role,...`).
///
/// Unset or blank falls back to the default six-node layout.
pub fn cluster_config_from_env() -> Result<ClusterConfig, ConfigError> {
    cluster_config_from_lookup(|key| std::env::var(key).ok())
}

pub fn cluster_config_from_lookup<F>(lookup: F) -> Result<ClusterConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("DRIFTLAB_CLUSTER_NODES") {
        Some(raw) if !raw.trim().is_empty() => Ok(ClusterConfig::parse_list(&raw)?),
        _ => Ok(ClusterConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::from_lookup(env(&[]));
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.bind_addr(), Ok("0.0.0.0:8080".parse().expect("addr")));
    }

    #[test]
    fn test_port_prefers_platform_variable() {
        let config = ApiConfig::from_lookup(env(&[("PORT", "9000"), ("DRIFTLAB_API_PORT", "9001")]));
        assert_eq!(config.port, "9000");

        let config = ApiConfig::from_lookup(env(&[("DRIFTLAB_API_PORT", "9001")]));
        assert_eq!(config.port, "9001");
    }

    #[test]
    fn test_bad_port_is_reported() {
        let config = ApiConfig::from_lookup(env(&[("PORT", "eighty")]));
        assert_eq!(
            config.bind_addr(),
            Err(ConfigError::InvalidPort("eighty".to_string()))
        );
    }

    #[test]
    fn test_origin_allowed() {
        let config = ApiConfig::from_lookup(env(&[(
            "DRIFTLAB_CORS_ORIGINS",
            "https://lab.example.com, ,http://localhost:3000",
        )]));
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.is_origin_allowed("http://localhost:3000"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(ApiConfig::default().is_origin_allowed("https://anything.com"));
    }

    #[test]
    fn test_store_settings_from_lookup() {
        let settings = StoreSettings::from_lookup(env(&[
            ("DRIFTLAB_PROPAGATION_DELAY_MS", "250"),
            ("DRIFTLAB_NOLOOP", "false"),
            ("DRIFTLAB_REAPER_INTERVAL_MS", "0"),
        ]));
        assert_eq!(settings.near_cache.map.propagation_delay, Duration::from_millis(250));
        assert_eq!(settings.near_cache.bucket.propagation_delay, Duration::from_millis(250));
        assert!(!settings.near_cache.hash.noloop);
        assert_eq!(settings.reaper_interval, Duration::from_millis(1));
        assert_eq!(settings.tracking_capacity, DEFAULT_TRACKING_CAPACITY);
    }

    #[test]
    fn test_store_settings_defaults() {
        assert_eq!(StoreSettings::from_lookup(env(&[])), StoreSettings::default());
    }

    #[test]
    fn test_cluster_nodes_from_lookup() -> Result<(), ConfigError> {
        let config = cluster_config_from_lookup(env(&[(
            "DRIFTLAB_CLUSTER_NODES",
            "10.0.0.1:7000@master,10.0.0.2:7000@replica",
        )]))?;
        assert_eq!(config.nodes.len(), 2);

        assert_eq!(cluster_config_from_lookup(env(&[]))?, ClusterConfig::default());
        assert_eq!(
            cluster_config_from_lookup(env(&[("DRIFTLAB_CLUSTER_NODES", "  ")]))?,
            ClusterConfig::default()
        );
        Ok(())
    }

    #[test]
    fn test_cluster_nodes_reject_unknown_role() {
        let result = cluster_config_from_lookup(env(&[("DRIFTLAB_CLUSTER_NODES", "10.0.0.1:7000@leader")]));
        assert!(matches!(result, Err(ConfigError::InvalidClusterNodes(_))));
    }
}
