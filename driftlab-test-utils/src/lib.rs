//! DRIFTLAB Test Utilities
//!
//! Shared test infrastructure for the DRIFTLAB workspace:
//! - Proptest generators for request parameters and report traces
//! - Fixtures wiring an in-memory store, near-caches and cluster directory
//! - Assertions for recorded scenario reports

use std::sync::Arc;
use std::time::Duration;

pub use driftlab_core::{
    DriftError, DriftResult, InvalidationParams, NodeRole, Observations, ScenarioReport,
    ScenarioStep,
};
pub use driftlab_scenarios::{PlaybackManager, ScenarioEngine, SessionTable};
pub use driftlab_storage::{
    ClusterConfig, InMemoryRemoteStore, RemoteStore, StaticClusterDirectory, StoreAdapter,
    StoreConfig,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for DRIFTLAB inputs.

    use super::*;
    use proptest::prelude::*;

    /// Non-blank key made of printable characters.
    pub fn arb_key() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9:_-]{0,15}"
    }

    /// Any string value, including empty.
    pub fn arb_value() -> impl Strategy<Value = String> {
        "[ -~]{0,24}"
    }

    /// Possibly missing, possibly blank string field.
    pub fn arb_optional_text() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            Just(Some("   ".to_string())),
            arb_value().prop_map(Some),
        ]
    }

    /// Numeric wire field covering null, negative, zero and large values.
    pub fn arb_wire_number() -> impl Strategy<Value = Option<i64>> {
        prop_oneof![
            Just(None),
            (-1_000i64..=0).prop_map(Some),
            (1i64..=100_000).prop_map(Some),
            Just(Some(i64::MAX)),
            Just(Some(i64::MIN)),
        ]
    }

    pub fn arb_invalidation_params() -> impl Strategy<Value = InvalidationParams> {
        (
            arb_optional_text(),
            arb_optional_text(),
            arb_optional_text(),
            arb_wire_number(),
        )
            .prop_map(|(key, initial_value, updated_value, await_millis)| InvalidationParams {
                key,
                initial_value,
                updated_value,
                await_millis,
            })
    }

    pub fn arb_node_role() -> impl Strategy<Value = NodeRole> {
        prop_oneof![Just(NodeRole::Master), Just(NodeRole::Replica)]
    }

    /// Report whose steps are `s0..sN` with a single `index` observation.
    pub fn arb_report(max_steps: usize) -> impl Strategy<Value = ScenarioReport> {
        (0..=max_steps, "[a-z-]{3,20}").prop_map(|(n, code)| {
            let steps = (0..n)
                .map(|i| {
                    let mut obs = Observations::new();
                    obs.insert("index".into(), i.into());
                    ScenarioStep::new(format!("s{i}"), "generated", obs)
                })
                .collect();
            ScenarioReport::new(code, steps, Observations::new())
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-wired components. Must be called from within a tokio runtime.

    use super::*;

    /// Propagation delay used when a test does not care about timing.
    pub const FAST_PROPAGATION: Duration = Duration::from_millis(10);

    /// Everything a scenario test touches, sharing one store.
    pub struct Fixture {
        pub store: Arc<InMemoryRemoteStore>,
        pub adapter: Arc<StoreAdapter>,
        pub cluster: Arc<StaticClusterDirectory>,
        pub engine: ScenarioEngine,
    }

    impl Fixture {
        /// Playback manager over a fresh session table.
        pub fn playback(&self) -> PlaybackManager {
            PlaybackManager::new(self.engine.clone(), Arc::new(SessionTable::new()))
        }
    }

    pub fn fixture_store() -> Arc<InMemoryRemoteStore> {
        Arc::new(InMemoryRemoteStore::new())
    }

    /// Adapter whose near-caches see remote writes after `propagation`.
    pub fn fixture_adapter(
        store: &Arc<InMemoryRemoteStore>,
        propagation: Duration,
    ) -> Arc<StoreAdapter> {
        let shared: Arc<dyn RemoteStore> = store.clone();
        let config = StoreConfig::default().with_propagation_delay(propagation);
        Arc::new(StoreAdapter::connect(shared, &config))
    }

    /// Default three-master, three-replica directory.
    pub fn fixture_cluster() -> Arc<StaticClusterDirectory> {
        Arc::new(StaticClusterDirectory::new(&ClusterConfig::default()))
    }

    pub fn fixture_engine(propagation: Duration) -> Fixture {
        let store = fixture_store();
        let adapter = fixture_adapter(&store, propagation);
        let cluster = fixture_cluster();
        let engine = ScenarioEngine::new(Arc::clone(&adapter), cluster.clone());
        Fixture {
            store,
            adapter,
            cluster,
            engine,
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over recorded reports.

    use super::*;

    /// Assert the report's step codes, in order.
    pub fn assert_step_codes(report: &ScenarioReport, expected: &[&str]) {
        assert_eq!(
            report.step_codes(),
            expected,
            "unexpected steps for {}",
            report.scenario_code()
        );
    }

    /// Observation `key` of step `code`, or panic with context.
    pub fn observation<'a>(
        report: &'a ScenarioReport,
        code: &str,
        key: &str,
    ) -> &'a serde_json::Value {
        let step = report
            .step(code)
            .unwrap_or_else(|| panic!("step {code} missing from {}", report.scenario_code()));
        step.observation(key)
            .unwrap_or_else(|| panic!("observation {key} missing from step {code}"))
    }
}
