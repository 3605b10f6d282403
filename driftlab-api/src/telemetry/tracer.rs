//! Tracing Subscriber Initialization
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` plus either JSON
//! or human-readable line output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "driftlab_api=debug,driftlab_scenarios=info,tower_http=debug,info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// `text`/`pretty` select line output; anything else is JSON.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "text" | "pretty" | "plain" => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Service name stamped on the startup event
    pub service_name: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Expose /metrics and record request metrics
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "driftlab-api".to_string(),
            environment: "development".to_string(),
            metrics_enabled: true,
            log_format: LogFormat::Json,
        }
    }
}

impl TelemetryConfig {
    /// Environment variables:
    /// - `DRIFTLAB_SERVICE_NAME` (default: driftlab-api)
    /// - `DRIFTLAB_ENVIRONMENT` (default: development)
    /// - `DRIFTLAB_METRICS_ENABLED`: "true"/"1" (default: true)
    /// - `DRIFTLAB_LOG_FORMAT`: "json" or "text" (default: json)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: lookup("DRIFTLAB_SERVICE_NAME").unwrap_or(defaults.service_name),
            environment: lookup("DRIFTLAB_ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: lookup("DRIFTLAB_METRICS_ENABLED")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.metrics_enabled),
            log_format: lookup("DRIFTLAB_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.log_format),
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracer(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    installed.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        environment = %config.environment,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" Text "), LogFormat::Text);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = TelemetryConfig::from_lookup(|key| match key {
            "DRIFTLAB_LOG_FORMAT" => Some("text".to_string()),
            "DRIFTLAB_METRICS_ENABLED" => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.metrics_enabled);
        assert_eq!(config.service_name, "driftlab-api");
    }

    #[test]
    fn test_defaults_without_environment() {
        assert_eq!(TelemetryConfig::from_lookup(|_| None), TelemetryConfig::default());
    }
}
