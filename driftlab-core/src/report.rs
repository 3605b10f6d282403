//! Scenario report model.
//!
//! A [`ScenarioReport`] is an immutable trace of one scenario run: the ordered
//! [`ScenarioStep`]s it recorded plus a summary context. Reports own their
//! data outright and hold no handle back into the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered observation map recorded by a step or carried as report context.
pub type Observations = serde_json::Map<String, serde_json::Value>;

/// Convert any serializable value into an observation value.
///
/// Values that cannot be represented as JSON are recorded as `null`.
pub fn observation_value<T: Serialize + ?Sized>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Build an [`Observations`] map from `key => value` pairs, preserving order.
///
/// ```ignore
/// let obs = observations! { "local" => local, "remote" => remote };
/// ```
#[macro_export]
macro_rules! observations {
    () => {
        $crate::Observations::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Observations::new();
        $(
            map.insert(::std::string::String::from($key), $crate::observation_value(&$value));
        )+
        map
    }};
}

// ============================================================================
// STEP
// ============================================================================

/// One recorded step of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    code: String,
    description: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    observations: Observations,
}

impl ScenarioStep {
    /// Record a step. The observation map is moved in, so later edits to the
    /// caller's copy cannot reach the recorded step.
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        observations: Observations,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            observations,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    /// Look up a single observation by key.
    pub fn observation(&self, key: &str) -> Option<&serde_json::Value> {
        self.observations.get(key)
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Complete result of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    scenario_code: String,
    executed_at: DateTime<Utc>,
    steps: Vec<ScenarioStep>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    context: Observations,
}

impl ScenarioReport {
    /// Build a report stamped with the current time.
    pub fn new(
        scenario_code: impl Into<String>,
        steps: Vec<ScenarioStep>,
        context: Observations,
    ) -> Self {
        Self {
            scenario_code: scenario_code.into(),
            executed_at: Utc::now(),
            steps,
            context,
        }
    }

    /// Override the execution timestamp.
    pub fn with_executed_at(mut self, executed_at: DateTime<Utc>) -> Self {
        self.executed_at = executed_at;
        self
    }

    pub fn scenario_code(&self) -> &str {
        &self.scenario_code
    }

    pub fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }

    pub fn steps(&self) -> &[ScenarioStep] {
        &self.steps
    }

    pub fn context(&self) -> &Observations {
        &self.context
    }

    /// Codes of all steps in recording order.
    pub fn step_codes(&self) -> Vec<&str> {
        self.steps.iter().map(ScenarioStep::code).collect()
    }

    /// Find the first step with the given code.
    pub fn step(&self, code: &str) -> Option<&ScenarioStep> {
        self.steps.iter().find(|s| s.code == code)
    }

    /// Split the report into its owned parts.
    pub fn into_parts(self) -> (String, DateTime<Utc>, Vec<ScenarioStep>, Observations) {
        (self.scenario_code, self.executed_at, self.steps, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observations_macro_preserves_order() {
        let obs = observations! {
            "zeta" => 1,
            "alpha" => "two",
            "mid" => Option::<String>::None,
        };
        let keys: Vec<&str> = obs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(obs["mid"], serde_json::Value::Null);
    }

    #[test]
    fn test_step_owns_its_observations() {
        let mut source = observations! { "local" => "v1" };
        let step = ScenarioStep::new("warm-local", "prime", source.clone());
        source.insert("local".to_string(), serde_json::json!("mutated"));

        assert_eq!(step.observation("local"), Some(&serde_json::json!("v1")));
    }

    #[test]
    fn test_report_defaults_executed_at_to_now() {
        let before = Utc::now();
        let report = ScenarioReport::new("near-cache-status", vec![], Observations::new());
        assert!(report.executed_at() >= before);
        assert!(report.executed_at() <= Utc::now());
    }

    #[test]
    fn test_report_serializes_camel_case() -> Result<(), serde_json::Error> {
        let report = ScenarioReport::new(
            "client-side-cache-state",
            vec![ScenarioStep::new("inspect", "snapshot", observations! { "localValue" => "x" })],
            observations! { "bucketName" => "scenario:csc-bucket" },
        );
        let json = serde_json::to_value(&report)?;
        assert_eq!(json["scenarioCode"], "client-side-cache-state");
        assert!(json.get("executedAt").is_some());
        assert_eq!(json["steps"][0]["observations"]["localValue"], "x");
        Ok(())
    }

    #[test]
    fn test_step_lookup_and_codes() {
        let report = ScenarioReport::new(
            "x",
            vec![
                ScenarioStep::new("a", "", Observations::new()),
                ScenarioStep::new("b", "", Observations::new()),
            ],
            Observations::new(),
        );
        assert_eq!(report.step_codes(), vec!["a", "b"]);
        assert!(report.step("b").is_some());
        assert!(report.step("c").is_none());
    }
}
