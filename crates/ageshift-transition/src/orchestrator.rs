//! Transition orchestrator.
//!
//! Accepts transition requests, assigns each one the next generation,
//! publishes the new age atomically and broadcasts it to every registered
//! capability listener before returning. Side effects that can fail
//! (progress persistence, a missing director) are logged and never undo an
//! accepted transition.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ageshift_core::director::{CutsceneCue, CutsceneDirector};
use ageshift_core::error::DomainError;
use ageshift_core::generation::Generation;
use ageshift_core::listener::{AgeChanged, CapabilityListener, Tick};
use ageshift_core::profile::{AgeProfile, AgeSet};
use ageshift_core::progress::ProgressStore;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::registry::{ListenerId, ListenerRegistry};
use crate::state::AgeState;

/// An accepted transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRequest {
    /// Target age index.
    pub index: usize,
    /// Whether a cutscene cue was sent.
    pub play_cutscene: bool,
    /// Generation assigned to the request.
    pub generation: Generation,
    /// Identifier for correlating log lines of one request.
    pub correlation_id: Uuid,
}

/// Owns the current age and coordinates every age-reactive subsystem.
pub struct TransitionOrchestrator {
    ages: AgeSet,
    initial_index: usize,
    state: AgeState,
    listeners: ListenerRegistry,
    ticks: Vec<Arc<dyn Tick>>,
    progress: Option<Arc<dyn ProgressStore>>,
    director: Option<Arc<dyn CutsceneDirector>>,
}

impl fmt::Debug for TransitionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionOrchestrator")
            .field("ages", &self.ages.len())
            .field("initial_index", &self.initial_index)
            .field("state", &self.state)
            .field("listeners", &self.listeners)
            .field("ticks", &self.ticks.len())
            .finish_non_exhaustive()
    }
}

impl TransitionOrchestrator {
    /// Creates an orchestrator positioned on the first age, at the initial
    /// generation, with no listeners or collaborators.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OutOfRange` if `ages` is empty.
    pub fn new(ages: AgeSet) -> Result<Self, DomainError> {
        let profile = ages.checked(0)?.clone();
        Ok(Self {
            ages,
            initial_index: 0,
            state: AgeState::new(0, profile),
            listeners: ListenerRegistry::new(),
            ticks: Vec::new(),
            progress: None,
            director: None,
        })
    }

    /// Sets the age used before any transition and when no saved progress
    /// can be resumed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OutOfRange` if `index` is not a valid age.
    pub fn with_initial_index(mut self, index: usize) -> Result<Self, DomainError> {
        let profile = self.ages.checked(index)?.clone();
        self.initial_index = index;
        self.state.reset(index, profile);
        Ok(self)
    }

    /// Persists the current index after every accepted transition.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressStore>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sends cutscene cues to `director`.
    #[must_use]
    pub fn with_director(mut self, director: Arc<dyn CutsceneDirector>) -> Self {
        self.director = Some(director);
        self
    }

    /// Adds a participant to the tick loop.
    pub fn register_tick(&mut self, participant: Arc<dyn Tick>) {
        self.ticks.push(participant);
    }

    /// Registers a capability listener.
    pub fn register(&self, listener: Arc<dyn CapabilityListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    /// The listener registry. Clones may be handed to subsystems that
    /// unregister on teardown.
    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// A reader over the current age.
    #[must_use]
    pub fn state(&self) -> AgeState {
        self.state.clone()
    }

    /// The loaded age set.
    #[must_use]
    pub fn ages(&self) -> &AgeSet {
        &self.ages
    }

    /// The current age profile.
    #[must_use]
    pub fn current_age(&self) -> AgeProfile {
        self.state.current_age()
    }

    /// The generation of the last accepted transition.
    #[must_use]
    pub fn current_generation(&self) -> Generation {
        self.state.current_generation()
    }

    /// The last accepted request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<TransitionRequest> {
        self.state.snapshot().last_request
    }

    /// Moves to age `index` and notifies every listener before returning.
    ///
    /// Requesting the current index again is accepted and re-broadcast
    /// under a new generation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OutOfRange` if `index` is outside the age set;
    /// state is left unchanged.
    #[instrument(skip(self))]
    pub async fn request_transition(
        &self,
        index: usize,
        play_cutscene: bool,
    ) -> Result<Generation, DomainError> {
        let profile = self.ages.checked(index)?;
        let correlation_id = Uuid::now_v7();
        let (previous_index, generation) =
            self.state.advance(index, profile.clone(), play_cutscene, correlation_id);

        info!(
            %correlation_id,
            %generation,
            previous_index,
            age = profile.age_years,
            "age transition accepted"
        );

        self.broadcast(&AgeChanged {
            index,
            previous_index,
            generation,
            profile,
        });

        if play_cutscene {
            match &self.director {
                Some(director) => director.play(CutsceneCue { index, generation }),
                None => debug!(%generation, "no cutscene director; skipping cue"),
            }
        }

        if let Some(progress) = &self.progress {
            if let Err(err) = progress.save_current_index(index).await {
                warn!(%correlation_id, error = %err, "failed to persist age index");
            }
        }

        Ok(generation)
    }

    fn broadcast(&self, change: &AgeChanged<'_>) {
        let listeners = self.listeners.snapshot();
        debug!(listeners = listeners.len(), generation = %change.generation, "broadcasting age change");
        for listener in listeners {
            listener.apply_movement(&change.profile.movement);
            listener.on_age_changed(change);
        }
    }

    /// Transitions to the saved age, or to the initial age when nothing
    /// usable was saved. Every listener is primed either way.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OutOfRange` only if the initial index itself is
    /// invalid, which `with_initial_index` prevents.
    pub async fn resume(&self) -> Result<Generation, DomainError> {
        let saved = match &self.progress {
            Some(progress) => match progress.load_current_index().await {
                Ok(saved) => saved,
                Err(err) => {
                    warn!(error = %err, "failed to load saved age index");
                    None
                }
            },
            None => None,
        };

        let index = match saved {
            Some(index) if index < self.ages.len() => index,
            Some(index) => {
                warn!(index, len = self.ages.len(), "saved age index out of range");
                self.initial_index
            }
            None => self.initial_index,
        };
        info!(index, "resuming age");
        self.request_transition(index, false).await
    }

    /// Advances every tick participant by `dt`.
    pub fn tick(&self, dt: Duration) {
        for participant in &self.ticks {
            participant.tick(dt);
        }
    }
}
