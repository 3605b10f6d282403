//! String churn load against plain remote buckets.

use driftlab_core::{observations, DriftResult, Observations, ScenarioReport, StringChurnRequest};
use rand::Rng;
use tokio::time::Instant;

use crate::engine::{elapsed_millis_f64, pause_millis, step, ScenarioEngine};

pub const STRING_CHURN_CODE: &str = "string-churn-simulation";

/// `abc...zabc...` of the given length.
pub(crate) fn generate_payload(size: u32) -> String {
    (0..size).map(|i| char::from(b'a' + (i % 26) as u8)).collect()
}

/// Sampling stride for `iterations` churn writes.
pub(crate) fn sample_every(iterations: u32) -> u32 {
    (iterations / 10).max(1)
}

impl ScenarioEngine {
    /// Populate `keyCount` buckets, then overwrite random ones while sampling store size.
    ///
    /// Reports only; nothing is asserted.
    pub async fn string_churn(&self, request: &StringChurnRequest) -> DriftResult<ScenarioReport> {
        let remote = self.adapter.remote();
        let keys: Vec<String> = (0..request.key_count())
            .map(|i| format!("{}:{}", request.prefix(), i))
            .collect();
        let payload = generate_payload(request.payload_size());
        let mut steps = Vec::with_capacity(3);

        let warmup_start = Instant::now();
        for key in &keys {
            remote.set(key, &payload, None).await?;
        }
        steps.push(step(
            "warmup",
            "Initial set of all keys with the base payload",
            observations! {
                "keyCount" => request.key_count(),
                "payloadSize" => request.payload_size(),
                "warmupDurationMillis" => elapsed_millis_f64(warmup_start),
                "residentBytes" => remote.resident_bytes().await?,
            },
        ));

        let iterations = request.iterations();
        let stride = sample_every(iterations);
        let mut samples: Vec<Observations> = Vec::new();
        let churn_start = Instant::now();
        for i in 0..iterations {
            let index = rand::rng().random_range(0..keys.len());
            let key = &keys[index];
            remote.set(key, &format!("{payload}-{i}"), None).await?;
            pause_millis(request.pause_millis()).await;
            if i % stride == 0 || i + 1 == iterations {
                samples.push(observations! {
                    "iteration" => i + 1,
                    "key" => key,
                    "residentBytes" => remote.resident_bytes().await?,
                });
            }
        }
        let churn_millis = elapsed_millis_f64(churn_start);
        steps.push(step(
            "churn-loop",
            "Performed churning updates across keys",
            observations! {
                "iterations" => iterations,
                "durationMillis" => churn_millis,
                "samples" => samples,
            },
        ));

        let resident = remote.resident_bytes().await?;
        steps.push(step(
            "summary",
            "Final resident size snapshot",
            observations! { "residentBytes" => resident },
        ));

        tracing::info!(
            prefix = request.prefix(),
            key_count = request.key_count(),
            iterations,
            duration_ms = churn_millis,
            resident_bytes = resident,
            "String churn scenario finished"
        );

        Ok(ScenarioReport::new(
            STRING_CHURN_CODE,
            steps,
            observations! {
                "keyCount" => request.key_count(),
                "iterations" => iterations,
                "payloadSize" => request.payload_size(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_cycles_alphabet() {
        assert_eq!(generate_payload(0), "");
        assert_eq!(generate_payload(3), "abc");
        let long = generate_payload(28);
        assert!(long.ends_with("zab"));
        assert_eq!(long.len(), 28);
    }

    #[test]
    fn test_sample_stride() {
        assert_eq!(sample_every(1), 1);
        assert_eq!(sample_every(9), 1);
        assert_eq!(sample_every(2_000), 200);
    }
}
