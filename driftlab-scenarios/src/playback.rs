//! Playback sessions.
//!
//! A playback session is a completed scenario trace addressed by an opaque
//! token. Callers pull one step per `next` call. The session table is
//! injected so the owner decides its lifetime and can share it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use driftlab_core::{
    DriftResult, Observations, PlaybackNext, PlaybackStart, ScenarioReport, ScenarioStep,
};
use uuid::Uuid;

use crate::catalog::ScenarioKind;
use crate::engine::ScenarioEngine;

/// Token-keyed session table.
pub type SessionTable = DashMap<String, Arc<PlaybackSession>>;

/// One steppable scenario trace.
#[derive(Debug)]
pub struct PlaybackSession {
    scenario_code: String,
    steps: Vec<ScenarioStep>,
    context: Observations,
    created_at: DateTime<Utc>,
    cursor: AtomicUsize,
}

/// Outcome of a single cursor advance.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub step: Option<ScenarioStep>,
    pub remaining: usize,
    pub exhausted: bool,
}

impl PlaybackSession {
    pub fn from_report(report: ScenarioReport) -> Self {
        let (scenario_code, _, steps, context) = report.into_parts();
        Self {
            scenario_code,
            steps,
            context,
            created_at: Utc::now(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn scenario_code(&self) -> &str {
        &self.scenario_code
    }

    pub fn context(&self) -> &Observations {
        &self.context
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn remaining(&self) -> usize {
        self.total().saturating_sub(self.cursor.load(Ordering::SeqCst))
    }

    /// Move the cursor by one and return the step it was on.
    ///
    /// Concurrent callers each get a distinct position.
    pub fn advance(&self) -> Advance {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let consumed = index.saturating_add(1);
        Advance {
            step: self.steps.get(index).cloned(),
            remaining: self.total().saturating_sub(consumed),
            exhausted: consumed >= self.total(),
        }
    }
}

/// Creates, advances and removes playback sessions.
#[derive(Clone)]
pub struct PlaybackManager {
    engine: ScenarioEngine,
    sessions: Arc<SessionTable>,
}

impl PlaybackManager {
    pub fn new(engine: ScenarioEngine, sessions: Arc<SessionTable>) -> Self {
        Self { engine, sessions }
    }

    /// Run `scenario` to completion and open a session over its trace.
    pub async fn start(
        &self,
        scenario: &str,
        parameters: Option<Observations>,
    ) -> DriftResult<PlaybackStart> {
        let kind = ScenarioKind::parse(scenario)?;
        let report = self.engine.run(kind, parameters).await?;
        let session = PlaybackSession::from_report(report);
        let token = Uuid::new_v4().to_string();
        let start = PlaybackStart {
            token: token.clone(),
            scenario_code: session.scenario_code().to_string(),
            context: session.context().clone(),
            total_steps: session.total(),
        };
        self.sessions.insert(token, Arc::new(session));

        tracing::info!(
            scenario = kind.name(),
            token = %start.token,
            total_steps = start.total_steps,
            "Playback session started"
        );
        Ok(start)
    }

    /// Return the next step of `token`'s session.
    ///
    /// The call that consumes the last step also removes the session, so the
    /// following call reports the token as missing.
    pub fn next(&self, token: &str) -> PlaybackNext {
        // Clone out of the map so the shard lock is released before any removal.
        let Some(session) = self.sessions.get(token).map(|s| Arc::clone(s.value())) else {
            return PlaybackNext::missing();
        };
        let advance = session.advance();
        if advance.exhausted {
            self.sessions.remove(token);
            tracing::debug!(token, "Playback session exhausted");
        }
        PlaybackNext {
            scenario_code: Some(session.scenario_code().to_string()),
            step: advance.step,
            remaining_steps: advance.remaining,
            completed: advance.exhausted,
            context: session.context().clone(),
        }
    }

    /// Drop `token`'s session. Unknown tokens are ignored.
    pub fn reset(&self, token: &str) {
        if self.sessions.remove(token).is_some() {
            tracing::debug!(token, "Playback session reset");
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn engine(&self) -> &ScenarioEngine {
        &self.engine
    }
}
