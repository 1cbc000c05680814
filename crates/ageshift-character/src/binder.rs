//! Movement/ability binder.
//!
//! Maps an age profile's movement and ability fields onto the live
//! character. The mapping is pure and total; an absent character turns the
//! whole operation into a logged no-op.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use ageshift_core::listener::{AgeChanged, CapabilityListener};
use ageshift_core::profile::{AbilityFlags, MovementConfig};
use tracing::{debug, warn};

use crate::runtime::CharacterRuntime;

/// Lowest top speed the binder will write.
pub const MIN_MAX_SPEED: f32 = 0.1;

/// Copies movement tuning onto `target`, clamping the top speed to
/// `MIN_MAX_SPEED`.
///
/// A non-finite speed also clamps to the minimum.
pub fn bind_movement(config: &MovementConfig, target: &mut CharacterRuntime) {
    target.max_speed = config.max_speed.max(MIN_MAX_SPEED);
    target.acceleration = config.acceleration;
    target.deceleration = config.deceleration;
    target.jump_force = config.jump_force;
    target.gravity_scale = config.gravity_scale;
}

/// Copies ability permissions onto `target`.
pub fn bind_abilities(abilities: &AbilityFlags, target: &mut CharacterRuntime) {
    target.can_crouch = abilities.can_crouch;
    target.can_dash = abilities.can_dash;
    target.can_wall_cling = abilities.can_wall_cling;
    target.can_shoot = abilities.can_shoot;
    target.max_jump_count = abilities.max_jump_count;
}

/// Capability listener that keeps the live character in sync with the
/// current age.
///
/// The binder only holds a weak reference, so despawning the character
/// never keeps it alive and later transitions skip it.
#[derive(Debug, Default)]
pub struct CharacterBinder {
    target: Mutex<Weak<Mutex<CharacterRuntime>>>,
}

impl CharacterBinder {
    /// Creates a binder attached to `target`.
    #[must_use]
    pub fn new(target: &Arc<Mutex<CharacterRuntime>>) -> Self {
        Self {
            target: Mutex::new(Arc::downgrade(target)),
        }
    }

    /// Creates a binder with no character attached.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Attaches a (new) character.
    pub fn attach(&self, target: &Arc<Mutex<CharacterRuntime>>) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(target);
    }

    fn with_target(&self, what: &str, f: impl FnOnce(&mut CharacterRuntime)) {
        let target = self
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade();
        let Some(target) = target else {
            warn!(what, "no character attached; skipping bind");
            return;
        };
        let mut runtime = target.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut runtime);
        debug!(what, "character updated");
    }
}

impl CapabilityListener for CharacterBinder {
    fn apply_movement(&self, config: &MovementConfig) {
        self.with_target("movement", |runtime| bind_movement(config, runtime));
    }

    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        self.with_target("abilities", |runtime| {
            bind_abilities(&change.profile.abilities, runtime);
        });
    }
}
