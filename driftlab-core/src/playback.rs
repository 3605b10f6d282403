//! Playback wire types.

use serde::{Deserialize, Serialize};

use crate::report::{Observations, ScenarioStep};

/// Request to start a playback session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStartRequest {
    /// Playback name of the scenario, e.g. `invalidation` or `event-storm`.
    pub scenario: String,
    /// Scenario parameters in the same shape the scenario's own route accepts.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub parameters: Option<Observations>,
}

/// Request addressing an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlaybackTokenRequest {
    pub token: String,
}

/// Returned once a scenario has run and its trace is ready to step through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStart {
    pub token: String,
    pub scenario_code: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub context: Observations,
    pub total_steps: usize,
}

/// Result of advancing a session by one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlaybackNext {
    /// Absent only for the missing result.
    pub scenario_code: Option<String>,
    pub step: Option<ScenarioStep>,
    pub remaining_steps: usize,
    pub completed: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub context: Observations,
}

impl PlaybackNext {
    /// Result for a token that names no live session.
    pub fn missing() -> Self {
        Self {
            scenario_code: None,
            step: None,
            remaining_steps: 0,
            completed: true,
            context: Observations::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.scenario_code.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_shape() {
        let next = PlaybackNext::missing();
        assert!(next.is_missing());
        assert!(next.step.is_none());
        assert!(next.completed);
        assert_eq!(next.remaining_steps, 0);
        assert!(next.context.is_empty());
    }

    #[test]
    fn test_start_request_parameters_optional() -> Result<(), serde_json::Error> {
        let req: PlaybackStartRequest = serde_json::from_str(r#"{"scenario":"csc-state"}"#)?;
        assert_eq!(req.scenario, "csc-state");
        assert!(req.parameters.is_none());
        Ok(())
    }
}
