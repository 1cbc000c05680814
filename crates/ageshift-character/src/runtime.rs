//! Runtime parameters of the live player character.

use serde::Serialize;

/// Parameters read by the movement engine every frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct CharacterRuntime {
    /// Top horizontal speed.
    pub max_speed: f32,
    /// Horizontal acceleration.
    pub acceleration: f32,
    /// Horizontal deceleration.
    pub deceleration: f32,
    /// Initial jump impulse.
    pub jump_force: f32,
    /// Multiplier on world gravity.
    pub gravity_scale: f32,
    /// Crouch permission.
    pub can_crouch: bool,
    /// Dash permission.
    pub can_dash: bool,
    /// Wall-cling permission.
    pub can_wall_cling: bool,
    /// Shoot permission.
    pub can_shoot: bool,
    /// Jumps allowed before landing.
    pub max_jump_count: u32,
}

impl Default for CharacterRuntime {
    fn default() -> Self {
        Self {
            max_speed: 1.0,
            acceleration: 1.0,
            deceleration: 1.0,
            jump_force: 1.0,
            gravity_scale: 1.0,
            can_crouch: false,
            can_dash: false,
            can_wall_cling: false,
            can_shoot: false,
            max_jump_count: 1,
        }
    }
}
