//! DRIFTLAB Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus metrics for the HTTP
//! layer and scenario runs.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, DriftlabMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracer, LogFormat, TelemetryConfig};
