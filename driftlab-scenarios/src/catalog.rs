//! Scenario catalog: name lookup and parameter-driven dispatch.

use std::fmt;
use std::str::FromStr;

use driftlab_core::{
    DriftResult, EventStormRequest, ExpirationRequest, HashInvalidationRequest,
    InvalidationRequest, NearCacheStatusRequest, Observations, ScenarioError, ScenarioReport,
    StringChurnRequest, TtlDriftRequest, WarmupRequest,
};
use serde::de::DeserializeOwned;

use crate::bucket::{EXPIRE_POLICY_CODE, STATE_CODE, WARMUP_CODE};
use crate::churn::STRING_CHURN_CODE;
use crate::engine::ScenarioEngine;
use crate::near_cache::{
    EVENT_STORM_CODE, HASH_INVALIDATION_CODE, INVALIDATION_CODE, NEAR_CACHE_STATUS_CODE,
    TTL_DRIFT_CODE,
};
use crate::topology::{CLUSTER_TOPOLOGY_CODE, REPLICA_READINESS_CODE};

/// Every scenario the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioKind {
    Invalidation,
    TtlDrift,
    HashInvalidation,
    CscState,
    CscWarmup,
    ExpirePolicy,
    EventStorm,
    ClusterTopology,
    ReplicaReadiness,
    StringChurn,
    NearCacheStatus,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 11] = [
        ScenarioKind::Invalidation,
        ScenarioKind::TtlDrift,
        ScenarioKind::HashInvalidation,
        ScenarioKind::CscState,
        ScenarioKind::CscWarmup,
        ScenarioKind::ExpirePolicy,
        ScenarioKind::EventStorm,
        ScenarioKind::ClusterTopology,
        ScenarioKind::ReplicaReadiness,
        ScenarioKind::StringChurn,
        ScenarioKind::NearCacheStatus,
    ];

    /// Name accepted by playback `start`.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Invalidation => "invalidation",
            ScenarioKind::TtlDrift => "ttl-drift",
            ScenarioKind::HashInvalidation => "hash-invalidation",
            ScenarioKind::CscState => "csc-state",
            ScenarioKind::CscWarmup => "csc-warmup",
            ScenarioKind::ExpirePolicy => "expire-policy",
            ScenarioKind::EventStorm => "event-storm",
            ScenarioKind::ClusterTopology => "cluster-topology",
            ScenarioKind::ReplicaReadiness => "replica-readiness",
            ScenarioKind::StringChurn => "string-churn",
            ScenarioKind::NearCacheStatus => "near-cache-status",
        }
    }

    /// Scenario code stamped on the report.
    pub fn code(&self) -> &'static str {
        match self {
            ScenarioKind::Invalidation => INVALIDATION_CODE,
            ScenarioKind::TtlDrift => TTL_DRIFT_CODE,
            ScenarioKind::HashInvalidation => HASH_INVALIDATION_CODE,
            ScenarioKind::CscState => STATE_CODE,
            ScenarioKind::CscWarmup => WARMUP_CODE,
            ScenarioKind::ExpirePolicy => EXPIRE_POLICY_CODE,
            ScenarioKind::EventStorm => EVENT_STORM_CODE,
            ScenarioKind::ClusterTopology => CLUSTER_TOPOLOGY_CODE,
            ScenarioKind::ReplicaReadiness => REPLICA_READINESS_CODE,
            ScenarioKind::StringChurn => STRING_CHURN_CODE,
            ScenarioKind::NearCacheStatus => NEAR_CACHE_STATUS_CODE,
        }
    }

    pub fn parse(name: &str) -> Result<Self, ScenarioError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ScenarioError::UnknownScenario {
                name: name.to_string(),
            })
    }

    /// Decode a parameter map into this scenario's validated request.
    fn request<T: DeserializeOwned>(&self, parameters: Option<Observations>) -> Result<T, ScenarioError> {
        let value = serde_json::Value::Object(parameters.unwrap_or_default());
        serde_json::from_value(value).map_err(|e| ScenarioError::InvalidParameters {
            scenario: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl ScenarioEngine {
    /// Run `kind` with loosely typed parameters, as playback does.
    ///
    /// Parameters are validated before any store interaction.
    pub async fn run(
        &self,
        kind: ScenarioKind,
        parameters: Option<Observations>,
    ) -> DriftResult<ScenarioReport> {
        match kind {
            ScenarioKind::Invalidation => {
                let request: InvalidationRequest = kind.request(parameters)?;
                self.invalidation(&request).await
            }
            ScenarioKind::TtlDrift => {
                let request: TtlDriftRequest = kind.request(parameters)?;
                self.ttl_drift(&request).await
            }
            ScenarioKind::HashInvalidation => {
                let request: HashInvalidationRequest = kind.request(parameters)?;
                self.hash_invalidation(&request).await
            }
            ScenarioKind::CscState => self.csc_state().await,
            ScenarioKind::CscWarmup => {
                let request: WarmupRequest = kind.request(parameters)?;
                self.warmup(&request).await
            }
            ScenarioKind::ExpirePolicy => {
                let request: ExpirationRequest = kind.request(parameters)?;
                self.expire_policy(&request).await
            }
            ScenarioKind::EventStorm => {
                let request: EventStormRequest = kind.request(parameters)?;
                self.event_storm(&request).await
            }
            ScenarioKind::ClusterTopology => self.cluster_topology().await,
            ScenarioKind::ReplicaReadiness => self.replica_readiness().await,
            ScenarioKind::StringChurn => {
                let request: StringChurnRequest = kind.request(parameters)?;
                self.string_churn(&request).await
            }
            ScenarioKind::NearCacheStatus => {
                let request: NearCacheStatusRequest = kind.request(parameters)?;
                self.near_cache_status(&request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftlab_core::observations;

    #[test]
    fn test_names_round_trip() {
        for kind in ScenarioKind::ALL {
            assert_eq!(ScenarioKind::parse(kind.name()), Ok(kind));
            assert_eq!(kind.to_string().parse::<ScenarioKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = ScenarioKind::parse("flood").unwrap_err();
        assert_eq!(
            err,
            ScenarioError::UnknownScenario {
                name: "flood".to_string()
            }
        );
        assert!(ScenarioKind::parse("Invalidation").is_err());
    }

    #[test]
    fn test_request_decoding_applies_defaults() {
        let params = observations! { "key" => "k1", "initialValue" => "v1", "updatedValue" => "v2" };
        let request: InvalidationRequest = ScenarioKind::Invalidation.request(Some(params)).unwrap();
        assert_eq!(request.await_millis(), 300);

        let churn: StringChurnRequest = ScenarioKind::StringChurn.request(None).unwrap();
        assert_eq!(churn.prefix(), "load:key");
    }

    #[test]
    fn test_request_decoding_rejects_missing_fields() {
        let result: Result<InvalidationRequest, _> = ScenarioKind::Invalidation.request(None);
        assert!(matches!(
            result,
            Err(ScenarioError::InvalidParameters { ref scenario, .. }) if scenario == "invalidation"
        ));
    }
}
