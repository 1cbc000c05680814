//! Transition Orchestrator for the Ageshift engine.
//!
//! Owns the current age and the generation counter, broadcasts accepted
//! transitions to every registered capability listener, and drives the
//! asynchronous appearance path so that only results tagged with the
//! current generation ever become visible.

pub mod appearance;
pub mod bridges;
pub mod coordinator;
pub mod orchestrator;
pub mod registry;
pub mod state;

pub use appearance::AppearanceController;
pub use bridges::{DialogueBridge, GateRule, SceneGate};
pub use coordinator::{CoordinatorHandle, spawn_coordinator};
pub use orchestrator::{TransitionOrchestrator, TransitionRequest};
pub use registry::{ListenerId, ListenerRegistry};
pub use state::{AgeSnapshot, AgeState};
