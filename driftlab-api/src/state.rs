//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use driftlab_scenarios::{PlaybackManager, ScenarioEngine, SessionTable, TopologyInspector};
use driftlab_storage::StoreAdapter;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub engine: ScenarioEngine,
    /// Playback sessions live in a table owned by this state, not a global.
    pub playback: PlaybackManager,
    pub inspector: TopologyInspector,
    pub adapter: Arc<StoreAdapter>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: ScenarioEngine) -> Self {
        Self::with_sessions(engine, Arc::new(SessionTable::new()))
    }

    /// State over an existing session table.
    pub fn with_sessions(engine: ScenarioEngine, sessions: Arc<SessionTable>) -> Self {
        Self {
            playback: PlaybackManager::new(engine.clone(), sessions),
            inspector: engine.inspector().clone(),
            adapter: Arc::clone(engine.adapter()),
            engine,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(ScenarioEngine, engine);
crate::impl_from_ref!(PlaybackManager, playback);
crate::impl_from_ref!(TopologyInspector, inspector);
crate::impl_from_ref!(Arc<StoreAdapter>, adapter);
crate::impl_from_ref!(Instant, start_time);
