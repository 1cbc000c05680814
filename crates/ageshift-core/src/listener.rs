//! Capability-listener contract.
//!
//! Every age-reactive subsystem implements `CapabilityListener` and is
//! registered with the orchestrator. The orchestrator depends only on this
//! interface, never on concrete subsystem types.

use std::time::Duration;

use crate::generation::Generation;
use crate::profile::{AgeProfile, MovementConfig};

/// Notification delivered to listeners for one accepted transition.
#[derive(Debug, Clone, Copy)]
pub struct AgeChanged<'a> {
    /// Index of the new age in the age set.
    pub index: usize,
    /// Index that was current before this transition.
    pub previous_index: usize,
    /// Generation assigned to this transition.
    pub generation: Generation,
    /// The new profile.
    pub profile: &'a AgeProfile,
}

impl AgeChanged<'_> {
    /// Whether the transition moved to a different age, as opposed to a
    /// repeated request for the current one.
    #[must_use]
    pub fn is_new_age(&self) -> bool {
        self.index != self.previous_index
    }
}

/// A subsystem that reacts to age transitions.
///
/// Listeners are notified synchronously and in no particular order. A
/// listener must not assume anything about the order of its siblings, and a
/// missing consumer is handled inside the listener (logged and skipped)
/// rather than reported to the orchestrator.
pub trait CapabilityListener: Send + Sync {
    /// Receives the movement tuning of the new age.
    fn apply_movement(&self, _config: &MovementConfig) {}

    /// Receives the full profile of the new age.
    fn on_age_changed(&self, change: &AgeChanged<'_>);
}

/// A participant in the coordinator's cooperative tick loop.
pub trait Tick: Send + Sync {
    /// Advances timers by `dt` and processes any completed asynchronous work.
    fn tick(&self, dt: Duration);
}
