//! Shared current-age state.

use std::sync::{Arc, PoisonError, RwLock};

use ageshift_core::generation::Generation;
use ageshift_core::profile::AgeProfile;

use crate::orchestrator::TransitionRequest;

/// A consistent view of the current age.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeSnapshot {
    /// Index of the current age in the age set.
    pub index: usize,
    /// Generation of the last accepted transition.
    pub generation: Generation,
    /// Profile of the current age.
    pub profile: AgeProfile,
    /// The last accepted request, if any.
    pub last_request: Option<TransitionRequest>,
}

/// Cloneable reader over the orchestrator's current age.
///
/// Index, generation and profile are replaced under one write lock, so a
/// reader never observes a half-updated pair.
#[derive(Debug, Clone)]
pub struct AgeState {
    inner: Arc<RwLock<AgeSnapshot>>,
}

impl AgeState {
    pub(crate) fn new(index: usize, profile: AgeProfile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AgeSnapshot {
                index,
                generation: Generation::INITIAL,
                profile,
                last_request: None,
            })),
        }
    }

    /// Returns a copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> AgeSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current age profile.
    #[must_use]
    pub fn current_age(&self) -> AgeProfile {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .profile
            .clone()
    }

    /// The current age index.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).index
    }

    /// The generation of the last accepted transition.
    #[must_use]
    pub fn current_generation(&self) -> Generation {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Moves to `index`, bumping the generation exactly once.
    ///
    /// Returns the previous index and the new generation.
    pub(crate) fn advance(
        &self,
        index: usize,
        profile: AgeProfile,
        play_cutscene: bool,
        correlation_id: uuid::Uuid,
    ) -> (usize, Generation) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous_index = state.index;
        let generation = state.generation.next();
        *state = AgeSnapshot {
            index,
            generation,
            profile,
            last_request: Some(TransitionRequest {
                index,
                play_cutscene,
                generation,
                correlation_id,
            }),
        };
        (previous_index, generation)
    }

    /// Points the state at `index` without counting as a transition.
    pub(crate) fn reset(&self, index: usize, profile: AgeProfile) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.index = index;
        state.profile = profile;
    }
}
