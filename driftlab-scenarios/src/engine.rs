//! Scenario engine.
//!
//! One async procedure per scenario kind. Each procedure reads and writes
//! through the [`StoreAdapter`], inserts deliberate wait windows, and records
//! one [`ScenarioStep`] before starting the next. The procedures themselves
//! live next to the collections they exercise:
//!
//! - [`crate::near_cache`] - map invalidation, TTL drift, hash fields, status, event storm
//! - [`crate::bucket`] - warmup, state inspection, expiration polling
//! - [`crate::churn`] - string churn load
//! - [`crate::topology`] - cluster topology and replica readiness

use std::sync::Arc;
use std::time::Duration;

use driftlab_core::{Observations, ScenarioStep};
use driftlab_storage::{ClusterDirectory, FieldMap, StoreAdapter, StoredValue};

use crate::topology::TopologyInspector;
use crate::verifier::ConsistencyVerifier;

/// Drives the scenario catalog against one store and one cluster directory.
#[derive(Clone)]
pub struct ScenarioEngine {
    pub(crate) adapter: Arc<StoreAdapter>,
    pub(crate) inspector: TopologyInspector,
    pub(crate) verifier: ConsistencyVerifier,
}

impl ScenarioEngine {
    pub fn new(adapter: Arc<StoreAdapter>, cluster: Arc<dyn ClusterDirectory>) -> Self {
        Self {
            adapter,
            inspector: TopologyInspector::new(cluster),
            verifier: ConsistencyVerifier::new(),
        }
    }

    pub fn adapter(&self) -> &Arc<StoreAdapter> {
        &self.adapter
    }

    pub fn inspector(&self) -> &TopologyInspector {
        &self.inspector
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Sleep for `duration`; zero returns immediately.
pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

pub(crate) async fn pause_millis(millis: u64) {
    pause(Duration::from_millis(millis)).await;
}

pub(crate) fn step(code: &str, description: &str, observations: Observations) -> ScenarioStep {
    ScenarioStep::new(code, description, observations)
}

pub(crate) fn text(value: Option<StoredValue>) -> Option<String> {
    value.and_then(StoredValue::into_text)
}

/// Milliseconds since `start`, fractional.
pub(crate) fn elapsed_millis_f64(start: tokio::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}

/// Coerce a stored hash payload into a field map.
///
/// Field maps are taken as-is. Text is parsed as a JSON object whose values
/// are stringified; anything else yields an empty map.
pub(crate) fn coerce_to_fields(raw: Option<StoredValue>) -> FieldMap {
    match raw {
        None => FieldMap::new(),
        Some(StoredValue::Fields(fields)) => fields,
        Some(StoredValue::Text(text)) => {
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&text) {
                Ok(parsed) => parsed
                    .into_iter()
                    .map(|(k, v)| {
                        let v = match v {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (k, v)
                    })
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Unable to parse hash payload, using empty map");
                    FieldMap::new()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_field_map_passthrough() {
        let mut fields = FieldMap::new();
        fields.insert("f".into(), "v".into());
        assert_eq!(coerce_to_fields(Some(StoredValue::Fields(fields.clone()))), fields);
    }

    #[test]
    fn test_coerce_json_text() {
        let coerced = coerce_to_fields(Some(StoredValue::text(r#"{"f":"v","n":3,"b":true}"#)));
        assert_eq!(coerced.get("f").map(String::as_str), Some("v"));
        assert_eq!(coerced.get("n").map(String::as_str), Some("3"));
        assert_eq!(coerced.get("b").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_coerce_malformed_or_absent_is_empty() {
        assert!(coerce_to_fields(Some(StoredValue::text("not json"))).is_empty());
        assert!(coerce_to_fields(Some(StoredValue::text("[1,2]"))).is_empty());
        assert!(coerce_to_fields(None).is_empty());
    }
}
