//! Scenarios over the near-cached maps.

use std::time::Duration;

use async_trait::async_trait;
use driftlab_core::{
    observations, DriftResult, EventStormRequest, HashInvalidationRequest, InvalidationRequest,
    NearCacheStatusRequest, ScenarioReport, TtlDriftRequest, SCENARIO_HASH_NAME,
    SCENARIO_MAP_NAME,
};
use driftlab_storage::{FieldMap, NearCachedMap, StoredValue};
use tokio::time::Instant;

use crate::engine::{
    coerce_to_fields, elapsed_millis_f64, pause_millis, step, text, ScenarioEngine,
};
use crate::verifier::ConvergenceProbe;

pub const INVALIDATION_CODE: &str = "near-cache-csc-invalidation";
pub const TTL_DRIFT_CODE: &str = "ttl-drift-between-local-and-redis";
pub const HASH_INVALIDATION_CODE: &str = "near-cache-csc-hash-invalidation";
pub const NEAR_CACHE_STATUS_CODE: &str = "near-cache-status";
pub const EVENT_STORM_CODE: &str = "event-storm-simulation";

// ============================================================================
// PROBES
// ============================================================================

/// String entry of the scenario map.
struct TextEntryProbe<'a> {
    map: &'a NearCachedMap,
    key: &'a str,
}

#[async_trait]
impl ConvergenceProbe for TextEntryProbe<'_> {
    type Value = String;

    async fn local(&self) -> DriftResult<Option<String>> {
        Ok(text(self.map.get(self.key).await?))
    }

    async fn reload(&self) -> DriftResult<Option<String>> {
        let mut all = self.map.read_all().await?;
        Ok(text(all.remove(self.key)))
    }
}

/// Field-map entry of the scenario hash. Absent reads coerce to an empty map.
struct FieldEntryProbe<'a> {
    map: &'a NearCachedMap,
    key: &'a str,
}

#[async_trait]
impl ConvergenceProbe for FieldEntryProbe<'_> {
    type Value = FieldMap;

    async fn local(&self) -> DriftResult<Option<FieldMap>> {
        Ok(Some(coerce_to_fields(self.map.get(self.key).await?)))
    }

    async fn reload(&self) -> DriftResult<Option<FieldMap>> {
        let mut all = self.map.read_all().await?;
        Ok(Some(coerce_to_fields(all.remove(self.key))))
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

impl ScenarioEngine {
    /// Write through the near-cache, update the remote copy behind its back,
    /// and watch the invalidation arrive.
    pub async fn invalidation(&self, request: &InvalidationRequest) -> DriftResult<ScenarioReport> {
        let map = self.adapter.map();
        let remote = self.adapter.remote();
        let key = request.key();
        let mut steps = Vec::with_capacity(5);

        map.put(key, request.initial_value()).await?;
        let local = text(map.get(key).await?);
        steps.push(step(
            "warm-local",
            "Prime the near-cached map with the initial value and build the local copy",
            observations! { "local" => local },
        ));

        let baseline = text(remote.hget(SCENARIO_MAP_NAME, key).await?);
        steps.push(step(
            "baseline-remote",
            "Verify the remote value matches the local snapshot",
            observations! { "remote" => baseline },
        ));

        remote
            .hset(SCENARIO_MAP_NAME, key, StoredValue::text(request.updated_value()))
            .await?;
        steps.push(step(
            "publish-update",
            "Simulate another instance updating the remote store to trigger invalidation",
            observations! { "updatedValue" => request.updated_value() },
        ));

        pause_millis(request.await_millis()).await;

        let local_after = text(map.get(key).await?);
        let remote_after = text(remote.hget(SCENARIO_MAP_NAME, key).await?);
        steps.push(step(
            "verify-after-window",
            "After the wait window compare local and remote values",
            observations! { "local" => local_after, "remote" => remote_after },
        ));

        let probe = TextEntryProbe { map, key };
        let verification = self
            .verifier
            .verify(&probe, key, remote_after, local_after.clone(), request.await_millis())
            .await?;
        steps.push(step(
            "eventual-check",
            "Re-check consistency after an optional extra wait to show eventual convergence",
            verification.observations,
        ));

        tracing::info!(
            key,
            initial = request.initial_value(),
            updated = request.updated_value(),
            local_after = ?local_after,
            convergence = ?verification.convergence,
            "Invalidation scenario finished"
        );

        Ok(ScenarioReport::new(
            INVALIDATION_CODE,
            steps,
            observations! {
                "mapName" => SCENARIO_MAP_NAME,
                "awaitMillis" => request.await_millis(),
                "updatedValue" => request.updated_value(),
            },
        ))
    }

    /// Expire the remote map sooner than the local copy and compare after a wait.
    pub async fn ttl_drift(&self, request: &TtlDriftRequest) -> DriftResult<ScenarioReport> {
        let map = self.adapter.map();
        let remote = self.adapter.remote();
        let key = request.key();
        let mut steps = Vec::with_capacity(3);

        map.put(key, request.value()).await?;
        steps.push(step(
            "warm-local",
            "Insert the value through the near-cached map",
            observations! { "local" => text(map.get(key).await?) },
        ));

        remote
            .expire(SCENARIO_MAP_NAME, Duration::from_secs(request.redis_ttl_seconds()))
            .await?;
        steps.push(step(
            "apply-redis-ttl",
            "Set a remote TTL on the map to expire it faster on the server side",
            observations! { "redisTTLSeconds" => request.redis_ttl_seconds() },
        ));

        pause_millis(request.wait_millis()).await;

        let local_after = text(map.get(key).await?);
        let remote_after = text(remote.hget(SCENARIO_MAP_NAME, key).await?);
        let remaining = remote.remaining_ttl_millis(SCENARIO_MAP_NAME).await?;
        steps.push(step(
            "compare-after-wait",
            "Compare the local copy with the remote state after the wait window",
            observations! {
                "local" => local_after,
                "remote" => remote_after,
                "remainTimeToLiveMillis" => remaining,
            },
        ));

        tracing::info!(
            key,
            ttl_seconds = request.redis_ttl_seconds(),
            remaining_ttl_ms = remaining,
            "TTL drift scenario finished"
        );

        Ok(ScenarioReport::new(
            TTL_DRIFT_CODE,
            steps,
            observations! {
                "nearCacheName" => map.name(),
                "waitMillis" => request.wait_millis(),
            },
        ))
    }

    /// Mutate one field of a field-map value remotely and verify the near-cache follows.
    pub async fn hash_invalidation(
        &self,
        request: &HashInvalidationRequest,
    ) -> DriftResult<ScenarioReport> {
        let hash = self.adapter.hash();
        let remote = self.adapter.remote();
        let key = request.key();
        let field = request.field();
        let mut steps = Vec::with_capacity(6);

        let mut initial = FieldMap::new();
        initial.insert(field.to_string(), request.initial_value().to_string());
        hash.put(key, initial).await?;
        let baseline_local = coerce_to_fields(hash.get(key).await?);
        steps.push(step(
            "warm-local",
            "Insert a field map into the near-cached hash and cache it locally",
            observations! { "local" => baseline_local },
        ));

        let baseline_remote = match remote.hget(SCENARIO_HASH_NAME, key).await {
            Ok(raw) => coerce_to_fields(raw),
            Err(e) => {
                tracing::warn!(key, error = %e, "Remote hash read failed, using empty baseline");
                FieldMap::new()
            }
        };
        steps.push(step(
            "baseline-remote",
            "Verify the remote hash mirrors the local snapshot",
            observations! { "remote" => baseline_remote },
        ));

        let mut mutation = baseline_remote;
        mutation.insert(field.to_string(), request.updated_value().to_string());
        remote
            .hset(SCENARIO_HASH_NAME, key, StoredValue::Fields(mutation))
            .await?;
        steps.push(step(
            "remote-mutation",
            "Simulate another node updating a hash field directly in the remote store",
            observations! {
                "mutatedField" => field,
                "updatedValue" => request.updated_value(),
            },
        ));

        pause_millis(request.await_millis()).await;

        let local_after = coerce_to_fields(hash.get(key).await?);
        let remote_after = coerce_to_fields(remote.hget(SCENARIO_HASH_NAME, key).await?);
        steps.push(step(
            "verify-after-window",
            "After the wait window compare local and remote field maps",
            observations! {
                "local" => local_after,
                "remote" => remote_after,
                "observedField" => field,
            },
        ));

        let probe = FieldEntryProbe { map: hash, key };
        let verification = self
            .verifier
            .verify(
                &probe,
                key,
                Some(remote_after),
                Some(local_after),
                request.await_millis(),
            )
            .await?;
        steps.push(step(
            "eventual-check",
            "Re-check field map consistency after an optional extra wait",
            verification.observations,
        ));

        tracing::info!(
            key,
            field,
            convergence = ?verification.convergence,
            "Hash invalidation scenario finished"
        );

        Ok(ScenarioReport::new(
            HASH_INVALIDATION_CODE,
            steps,
            observations! {
                "hashName" => SCENARIO_HASH_NAME,
                "field" => field,
                "awaitMillis" => request.await_millis(),
            },
        ))
    }

    /// Snapshot local and remote values for one key of the scenario map.
    pub async fn near_cache_status(
        &self,
        request: &NearCacheStatusRequest,
    ) -> DriftResult<ScenarioReport> {
        let key = request.key();
        let local = text(self.adapter.map().get(key).await?);
        let remote = text(self.adapter.remote().hget(SCENARIO_MAP_NAME, key).await?);
        let observation = observations! {
            "key" => key,
            "localPresent" => local.is_some(),
            "remotePresent" => remote.is_some(),
            "local" => local,
            "remote" => remote,
        };

        Ok(ScenarioReport::new(
            NEAR_CACHE_STATUS_CODE,
            vec![step(
                "snapshot",
                "Compare the near-cache local copy with the remote value for the key",
                observation.clone(),
            )],
            observation,
        ))
    }

    /// Burst of remote-only writes, then compare what the near-cache settled on.
    pub async fn event_storm(&self, request: &EventStormRequest) -> DriftResult<ScenarioReport> {
        let map = self.adapter.map();
        let remote = self.adapter.remote();
        let key = request.key();
        let mut steps = Vec::with_capacity(3);

        map.put(key, request.initial_value()).await?;
        steps.push(step(
            "warm-local",
            "Prime the near-cached map before the burst",
            observations! { "local" => text(map.get(key).await?) },
        ));

        let start = Instant::now();
        for i in 1..=request.iterations() {
            let value = format!("{}#{}", request.initial_value(), i);
            remote
                .hset(SCENARIO_MAP_NAME, key, StoredValue::text(value))
                .await?;
            pause_millis(request.pause_millis()).await;
        }
        let duration_millis = elapsed_millis_f64(start);
        steps.push(step(
            "storm-executed",
            "Executed a burst of remote mutations to trigger invalidations",
            observations! {
                "iterations" => request.iterations(),
                "durationMillis" => duration_millis,
                "pauseMillis" => request.pause_millis(),
            },
        ));

        let local_after = text(map.get(key).await?);
        let remote_after = text(remote.hget(SCENARIO_MAP_NAME, key).await?);
        let consistent = local_after == remote_after;
        steps.push(step(
            "verify-after-storm",
            "Capture local versus remote value after the burst",
            observations! {
                "local" => local_after,
                "remote" => remote_after,
                "consistent" => consistent,
            },
        ));

        tracing::info!(
            key,
            iterations = request.iterations(),
            duration_ms = duration_millis,
            consistent,
            "Event storm scenario finished"
        );

        Ok(ScenarioReport::new(
            EVENT_STORM_CODE,
            steps,
            observations! {
                "mapName" => SCENARIO_MAP_NAME,
                "iterations" => request.iterations(),
            },
        ))
    }
}
