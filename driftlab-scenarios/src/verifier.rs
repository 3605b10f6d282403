//! Tiered convergence check.
//!
//! After a wait window a scenario compares what the near-cache serves with
//! what the remote store holds. When they disagree the verifier escalates:
//! it waits again and re-reads, and if the copies still disagree it forces
//! a full reload of the backing collection. Each tier only runs when the
//! previous one saw a mismatch, so the absence of a tier's keys in the
//! observations means it was never needed.

use std::time::Duration;

use async_trait::async_trait;
use driftlab_core::{observation_value, DriftResult, Observations};
use serde::Serialize;

use crate::engine::pause;

/// Lower bound for the tier-two wait.
pub const MIN_EXTRA_WAIT_MILLIS: u64 = 100;

/// Local view of the value under test.
#[async_trait]
pub trait ConvergenceProbe: Send + Sync {
    type Value: PartialEq + Serialize + Send + Sync;

    /// Read through the near-cache.
    async fn local(&self) -> DriftResult<Option<Self::Value>>;

    /// Reload the near-cache from the remote store, then read.
    async fn reload(&self) -> DriftResult<Option<Self::Value>>;
}

/// Tier at which local and remote agreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Immediate,
    AfterDelay,
    AfterReload,
    Diverged,
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        !matches!(self, Convergence::Diverged)
    }
}

/// Observations of an `eventual-check` step plus the tier reached.
#[derive(Debug, Clone)]
pub struct Verification {
    pub observations: Observations,
    pub convergence: Convergence,
}

/// Escalating local-vs-remote comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyVerifier;

impl ConsistencyVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Tier-two wait for a scenario that waited `await_millis`.
    pub fn extra_wait_millis(await_millis: u64) -> u64 {
        await_millis.max(MIN_EXTRA_WAIT_MILLIS)
    }

    /// Compare `local_immediate` with `remote`, escalating on mismatch.
    ///
    /// `remote` is the authoritative value read once after the wait window;
    /// later tiers re-read only the local side.
    pub async fn verify<P: ConvergenceProbe>(
        &self,
        probe: &P,
        key: &str,
        remote: Option<P::Value>,
        local_immediate: Option<P::Value>,
        await_millis: u64,
    ) -> DriftResult<Verification> {
        let mut observations = Observations::new();
        observations.insert("key".into(), observation_value(key));
        observations.insert("remote".into(), observation_value(&remote));
        observations.insert("localImmediate".into(), observation_value(&local_immediate));

        let consistent = local_immediate == remote;
        observations.insert("consistentImmediately".into(), consistent.into());
        if consistent {
            return Ok(Verification {
                observations,
                convergence: Convergence::Immediate,
            });
        }

        let extra_wait = Self::extra_wait_millis(await_millis);
        pause(Duration::from_millis(extra_wait)).await;
        let local_after_delay = probe.local().await?;
        let consistent = local_after_delay == remote;
        observations.insert("extraWaitMillis".into(), extra_wait.into());
        observations.insert("localAfterDelay".into(), observation_value(&local_after_delay));
        observations.insert("consistentAfterDelay".into(), consistent.into());
        if consistent {
            return Ok(Verification {
                observations,
                convergence: Convergence::AfterDelay,
            });
        }

        let local_after_reload = probe.reload().await?;
        let consistent = local_after_reload == remote;
        observations.insert("localAfterReload".into(), observation_value(&local_after_reload));
        observations.insert("consistentAfterReload".into(), consistent.into());
        tracing::debug!(key, consistent, "Escalated to full reload");

        Ok(Verification {
            observations,
            convergence: if consistent {
                Convergence::AfterReload
            } else {
                Convergence::Diverged
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns queued local values in order; reload returns `reloaded`.
    struct ScriptedProbe {
        locals: Vec<Option<String>>,
        reloaded: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConvergenceProbe for ScriptedProbe {
        type Value = String;

        async fn local(&self) -> DriftResult<Option<String>> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.locals.get(i).cloned().flatten())
        }

        async fn reload(&self) -> DriftResult<Option<String>> {
            Ok(self.reloaded.clone())
        }
    }

    fn probe(locals: Vec<Option<&str>>, reloaded: Option<&str>) -> ScriptedProbe {
        ScriptedProbe {
            locals: locals.into_iter().map(|v| v.map(String::from)).collect(),
            reloaded: reloaded.map(String::from),
            calls: AtomicUsize::new(0),
        }
    }

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_extra_wait_floor() {
        assert_eq!(ConsistencyVerifier::extra_wait_millis(0), 100);
        assert_eq!(ConsistencyVerifier::extra_wait_millis(300), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_consistency_records_tier_one_only() -> DriftResult<()> {
        let p = probe(vec![], None);
        let v = ConsistencyVerifier::new()
            .verify(&p, "k", some("v2"), some("v2"), 300)
            .await?;
        assert_eq!(v.convergence, Convergence::Immediate);
        let keys: Vec<&str> = v.observations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["key", "remote", "localImmediate", "consistentImmediately"]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_tier_converges() -> DriftResult<()> {
        let p = probe(vec![Some("v2")], None);
        let v = ConsistencyVerifier::new()
            .verify(&p, "k", some("v2"), some("v1"), 50)
            .await?;
        assert_eq!(v.convergence, Convergence::AfterDelay);
        assert_eq!(v.observations["extraWaitMillis"], 100);
        assert_eq!(v.observations["consistentAfterDelay"], true);
        assert!(!v.observations.contains_key("localAfterReload"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_tier_and_divergence() -> DriftResult<()> {
        let p = probe(vec![Some("v1")], Some("v2"));
        let v = ConsistencyVerifier::new()
            .verify(&p, "k", some("v2"), some("v1"), 300)
            .await?;
        assert_eq!(v.convergence, Convergence::AfterReload);
        assert_eq!(v.observations["consistentAfterReload"], true);

        let p = probe(vec![Some("v1")], Some("v1"));
        let v = ConsistencyVerifier::new()
            .verify(&p, "k", some("v2"), some("v1"), 300)
            .await?;
        assert_eq!(v.convergence, Convergence::Diverged);
        assert!(!v.convergence.is_converged());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_absent_is_consistent() -> DriftResult<()> {
        let p = probe(vec![], None);
        let v = ConsistencyVerifier::new().verify(&p, "k", None, None, 0).await?;
        assert_eq!(v.convergence, Convergence::Immediate);
        assert_eq!(v.observations["remote"], serde_json::Value::Null);
        Ok(())
    }
}
