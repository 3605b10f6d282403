//! DRIFTLAB Scenarios - Consistency Experiments and Playback
//!
//! The scenario engine drives a fixed catalog of near-cache consistency
//! experiments through a [`driftlab_storage::StoreAdapter`]. Each run yields
//! a [`driftlab_core::ScenarioReport`], which can be returned directly or
//! replayed one step at a time through a [`PlaybackManager`].

pub mod bucket;
pub mod catalog;
pub mod churn;
pub mod engine;
pub mod near_cache;
pub mod playback;
pub mod topology;
pub mod verifier;

pub use catalog::ScenarioKind;
pub use engine::ScenarioEngine;
pub use playback::{Advance, PlaybackManager, PlaybackSession, SessionTable};
pub use topology::{RoleListing, TopologyInspector};
pub use verifier::{ConsistencyVerifier, Convergence, ConvergenceProbe, Verification};
