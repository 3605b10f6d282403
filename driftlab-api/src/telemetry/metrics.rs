//! Prometheus Metrics Definitions
//!
//! Defines all DRIFTLAB metrics with their labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Scenario run buckets (seconds). Scenarios wait on purpose, so these reach further.
const SCENARIO_DURATION_BUCKETS: &[f64] = &[
    0.010, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0,
];

/// Global metrics instance - initialized once at first use
pub static METRICS: Lazy<ApiResult<DriftlabMetrics>> = Lazy::new(DriftlabMetrics::new);

/// Container for all DRIFTLAB metrics.
#[derive(Clone)]
pub struct DriftlabMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Scenario run counter - labels: scenario, outcome
    pub scenario_runs_total: CounterVec,

    /// Scenario run duration histogram - labels: scenario
    pub scenario_duration_seconds: HistogramVec,

    /// Live playback sessions
    pub playback_sessions: Gauge,
}

fn registration_error(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

impl DriftlabMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "driftlab_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "driftlab_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            scenario_runs_total: register_counter_vec!(
                "driftlab_scenario_runs_total",
                "Total number of scenario runs",
                &["scenario", "outcome"]
            )
            .map_err(|e| registration_error("scenario_runs_total", e))?,

            scenario_duration_seconds: register_histogram_vec!(
                "driftlab_scenario_duration_seconds",
                "Scenario run duration in seconds",
                &["scenario"],
                SCENARIO_DURATION_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("scenario_duration_seconds", e))?,

            playback_sessions: register_gauge!(
                "driftlab_playback_sessions",
                "Current number of live playback sessions"
            )
            .map_err(|e| registration_error("playback_sessions", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record one finished scenario run.
    pub fn record_scenario_run(&self, scenario: &str, success: bool, duration_secs: f64) {
        let outcome = if success { "success" } else { "error" };
        self.scenario_runs_total
            .with_label_values(&[scenario, outcome])
            .inc();
        self.scenario_duration_seconds
            .with_label_values(&[scenario])
            .observe(duration_secs);
    }

    pub fn set_playback_sessions(&self, count: usize) {
        self.playback_sessions.set(count as f64);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so an idle process still exports the families.
    if let Err(e) = METRICS.as_ref() {
        tracing::error!(error = %e, "Metrics registry unavailable");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
