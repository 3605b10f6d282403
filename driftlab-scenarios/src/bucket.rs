//! Scenarios over the near-cached bucket.

use std::time::Duration;

use driftlab_core::{
    observations, DriftResult, ExpirationRequest, Observations, ScenarioReport, WarmupRequest,
};
use tokio::time::Instant;

use crate::engine::{pause_millis, step, ScenarioEngine};

pub const WARMUP_CODE: &str = "client-side-cache-warmup";
pub const STATE_CODE: &str = "client-side-cache-state";
pub const EXPIRE_POLICY_CODE: &str = "expire-policy-verification";

impl ScenarioEngine {
    /// Write the bucket with a TTL and read it straight back.
    pub async fn warmup(&self, request: &WarmupRequest) -> DriftResult<ScenarioReport> {
        let bucket = self.adapter.bucket();
        bucket
            .set(request.value(), Some(Duration::from_secs(request.ttl_seconds())))
            .await?;
        let local = bucket.get().await?;
        let remaining = bucket.remaining_ttl_millis().await?;

        tracing::info!(ttl_seconds = request.ttl_seconds(), remaining_ttl_ms = remaining, "Bucket warmed");

        Ok(ScenarioReport::new(
            WARMUP_CODE,
            vec![step(
                "warmup-csc",
                "Warm up the near-cached bucket with a TTL ahead of failover or network drills",
                observations! {
                    "localValue" => local,
                    "remainingTtlMillis" => remaining,
                },
            )],
            observations! {
                "bucketName" => bucket.name(),
                "ttlSeconds" => request.ttl_seconds(),
            },
        ))
    }

    /// Current bucket snapshot as seen through the near-cache.
    pub async fn csc_state(&self) -> DriftResult<ScenarioReport> {
        let bucket = self.adapter.bucket();
        let context = observations! {
            "bucketName" => bucket.name(),
            "localValue" => bucket.get().await?,
            "remainingTtlMillis" => bucket.remaining_ttl_millis().await?,
        };

        Ok(ScenarioReport::new(
            STATE_CODE,
            vec![step(
                "inspect",
                "Inspect the current near-cached bucket snapshot",
                context.clone(),
            )],
            context,
        ))
    }

    /// Poll a TTL'd bucket until it expires or the observation window closes.
    ///
    /// The bucket is deleted afterwards whether or not it expired in time.
    pub async fn expire_policy(&self, request: &ExpirationRequest) -> DriftResult<ScenarioReport> {
        let bucket = self.adapter.bucket();
        let mut steps = Vec::with_capacity(3);

        bucket
            .set(request.value(), Some(Duration::from_secs(request.ttl_seconds())))
            .await?;
        steps.push(step(
            "set-with-ttl",
            "Set the value with the requested TTL and prime the local copy",
            observations! {
                "key" => request.key(),
                "value" => request.value(),
                "ttlSeconds" => request.ttl_seconds(),
            },
        ));

        let max_wait = Duration::from_millis(request.max_wait_millis());
        let start = Instant::now();
        let polled = self.poll_bucket(start, max_wait, request.poll_interval_millis()).await;
        let deleted = bucket.delete().await;
        let (samples, expired) = polled?;
        deleted?;

        steps.push(step(
            "polling-window",
            "Observed TTL decay samples",
            observations! { "samples" => samples },
        ));

        let observed_millis = start.elapsed().as_millis() as u64;
        steps.push(step(
            "final-status",
            "Report whether the value expired within the observation window",
            observations! {
                "expired" => expired,
                "observedMillis" => observed_millis,
            },
        ));

        tracing::info!(
            key = request.key(),
            expired,
            observed_ms = observed_millis,
            "Expiration policy scenario finished"
        );

        Ok(ScenarioReport::new(
            EXPIRE_POLICY_CODE,
            steps,
            observations! {
                "bucketName" => bucket.name(),
                "maxWaitMillis" => request.max_wait_millis(),
            },
        ))
    }

    async fn poll_bucket(
        &self,
        start: Instant,
        max_wait: Duration,
        poll_interval_millis: u64,
    ) -> DriftResult<(Vec<Observations>, bool)> {
        let bucket = self.adapter.bucket();
        let mut samples = Vec::new();
        while start.elapsed() <= max_wait {
            let ttl = bucket.remaining_ttl_millis().await?;
            let value = bucket.get().await?;
            let resident = self.adapter.remote().resident_bytes().await?;
            let gone = ttl < 0 || value.is_none();
            samples.push(observations! {
                "elapsedMillis" => start.elapsed().as_millis() as u64,
                "ttlMillis" => ttl,
                "value" => value,
                "residentBytes" => resident,
            });
            if gone {
                return Ok((samples, true));
            }
            pause_millis(poll_interval_millis).await;
        }
        Ok((samples, false))
    }
}
