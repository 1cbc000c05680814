//! Shared application state.

use std::sync::{Arc, Mutex};

use ageshift_character::runtime::CharacterRuntime;
use ageshift_core::profile::AgeSet;
use ageshift_core::progress::ProgressStore;
use ageshift_input::ActionMap;
use ageshift_transition::{CoordinatorHandle, SceneGate};

use crate::headless::HeadlessAppearance;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the coordinator task that owns the orchestrator.
    pub coordinator: CoordinatorHandle,
    /// The loaded age set.
    pub ages: AgeSet,
    /// Progress persistence.
    pub progress: Arc<dyn ProgressStore>,
    /// Visible appearance slot.
    pub appearance: Arc<HeadlessAppearance>,
    /// Live character parameters.
    pub character: Arc<Mutex<CharacterRuntime>>,
    /// Input action asset, if one is configured.
    pub actions: Option<Arc<Mutex<ActionMap>>>,
    /// Age-restricted scene content.
    pub scene: Arc<SceneGate>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("coordinator", &self.coordinator)
            .field("ages", &self.ages.len())
            .finish_non_exhaustive()
    }
}
