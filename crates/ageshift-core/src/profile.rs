//! Age profiles and the ordered age set.
//!
//! An `AgeSet` is loaded once at startup and is read-only afterwards. The
//! position of a profile in the set is the canonical identifier for that
//! life stage.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Movement tuning applied to the live character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Top horizontal speed.
    pub max_speed: f32,
    /// Horizontal acceleration.
    pub acceleration: f32,
    /// Horizontal deceleration.
    pub deceleration: f32,
    /// Initial jump impulse.
    pub jump_force: f32,
    /// Multiplier on world gravity.
    #[serde(default = "default_gravity_scale")]
    pub gravity_scale: f32,
}

fn default_gravity_scale() -> f32 {
    1.0
}

impl MovementConfig {
    fn is_finite(&self) -> bool {
        [
            self.max_speed,
            self.acceleration,
            self.deceleration,
            self.jump_force,
            self.gravity_scale,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Ability permissions unlocked at a given age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct AbilityFlags {
    /// Whether the character may crouch.
    pub can_crouch: bool,
    /// Whether the character may dash.
    pub can_dash: bool,
    /// Whether the character may cling to walls.
    pub can_wall_cling: bool,
    /// Whether the character may shoot.
    pub can_shoot: bool,
    /// Number of jumps allowed before landing.
    pub max_jump_count: u32,
}

impl Default for AbilityFlags {
    fn default() -> Self {
        Self {
            can_crouch: false,
            can_dash: false,
            can_wall_cling: false,
            can_shoot: false,
            max_jump_count: 1,
        }
    }
}

/// Immutable configuration bundle for one life stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeProfile {
    /// Name shown to the player.
    pub display_name: String,
    /// Age of the character in years.
    pub age_years: u32,
    /// Movement tuning.
    pub movement: MovementConfig,
    /// Ability permissions.
    #[serde(default)]
    pub abilities: AbilityFlags,
    /// Fetch key of the per-age visual asset.
    pub visual_key: String,
    /// Label of the audio grouping for this age. May name an audio stage
    /// explicitly; empty means "select by age range".
    #[serde(default)]
    pub audio_group: String,
}

/// Ordered, immutable sequence of age profiles.
///
/// Cloning is cheap; all clones share the same profiles.
#[derive(Debug, Clone)]
pub struct AgeSet {
    profiles: Arc<[AgeProfile]>,
}

impl AgeSet {
    /// Builds an age set after validating every profile.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the set is empty, a display name
    /// or visual asset key is blank, a movement value is not finite, or a
    /// profile allows fewer than one jump.
    pub fn new(profiles: Vec<AgeProfile>) -> Result<Self, DomainError> {
        if profiles.is_empty() {
            return Err(DomainError::Validation(
                "age set must contain at least one profile".into(),
            ));
        }

        for (index, profile) in profiles.iter().enumerate() {
            if profile.display_name.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "age profile {index} has an empty display name"
                )));
            }
            if profile.visual_key.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "age profile {index} ({}) has no visual asset key",
                    profile.display_name
                )));
            }
            if !profile.movement.is_finite() {
                return Err(DomainError::Validation(format!(
                    "age profile {index} ({}) has non-finite movement values",
                    profile.display_name
                )));
            }
            if profile.abilities.max_jump_count == 0 {
                return Err(DomainError::Validation(format!(
                    "age profile {index} ({}) must allow at least one jump",
                    profile.display_name
                )));
            }
        }

        Ok(Self {
            profiles: profiles.into(),
        })
    }

    /// Parses and validates an age set from a YAML sequence of profiles.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the YAML is malformed or the
    /// profiles fail validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DomainError> {
        let profiles: Vec<AgeProfile> = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Validation(format!("invalid age set: {e}")))?;
        Self::new(profiles)
    }

    /// Returns the profile at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&AgeProfile> {
        self.profiles.get(index)
    }

    /// Number of profiles in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Always false for a constructed set; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Iterates over profiles in index order.
    pub fn iter(&self) -> impl Iterator<Item = &AgeProfile> {
        self.profiles.iter()
    }

    /// Validates that `index` addresses a profile.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OutOfRange` if it does not.
    pub fn checked(&self, index: usize) -> Result<&AgeProfile, DomainError> {
        self.get(index).ok_or(DomainError::OutOfRange {
            index,
            len: self.len(),
        })
    }
}
