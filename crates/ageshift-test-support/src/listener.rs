//! Test listener that records every notification it receives.

use std::sync::Mutex;

use ageshift_core::generation::Generation;
use ageshift_core::listener::{AgeChanged, CapabilityListener};
use ageshift_core::profile::MovementConfig;

/// One notification observed by a `RecordingListener`.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerCall {
    /// `apply_movement` was called with this config.
    Movement(MovementConfig),
    /// `on_age_changed` was called.
    AgeChanged {
        /// New age index.
        index: usize,
        /// Generation of the transition.
        generation: Generation,
        /// Age in years of the new profile.
        age_years: u32,
    },
}

/// A listener that records all calls in arrival order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<ListenerCall>>,
}

impl RecordingListener {
    /// Create a listener with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every recorded call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<ListenerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the generations of every `on_age_changed` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn generations(&self) -> Vec<Generation> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                ListenerCall::AgeChanged { generation, .. } => Some(*generation),
                ListenerCall::Movement(_) => None,
            })
            .collect()
    }
}

impl CapabilityListener for RecordingListener {
    fn apply_movement(&self, config: &MovementConfig) {
        self.calls
            .lock()
            .unwrap()
            .push(ListenerCall::Movement(*config));
    }

    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        self.calls.lock().unwrap().push(ListenerCall::AgeChanged {
            index: change.index,
            generation: change.generation,
            age_years: change.profile.age_years,
        });
    }
}
