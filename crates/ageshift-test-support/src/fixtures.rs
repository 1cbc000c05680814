//! Shared fixtures.

use ageshift_core::profile::{AbilityFlags, AgeProfile, AgeSet, MovementConfig};

/// Builds a profile with movement scaled by age and the given abilities.
#[must_use]
pub fn sample_profile(name: &str, age_years: u32, abilities: AbilityFlags) -> AgeProfile {
    #[allow(clippy::cast_precision_loss)]
    let scale = age_years as f32 / 7.0;
    AgeProfile {
        display_name: name.to_owned(),
        age_years,
        movement: MovementConfig {
            max_speed: 3.0 * scale,
            acceleration: 15.0 * scale,
            deceleration: 20.0 * scale,
            jump_force: 6.0 + scale,
            gravity_scale: 1.0,
        },
        abilities,
        visual_key: format!("sprites/{}", name.to_lowercase()),
        audio_group: String::new(),
    }
}

/// A three-stage age set: Child (7), Teen (14) and Adult (21).
///
/// Only the teen and adult may dash; only the adult may shoot and double
/// jump.
///
/// # Panics
///
/// Never; the fixture is always valid.
#[must_use]
pub fn sample_age_set() -> AgeSet {
    AgeSet::new(vec![
        sample_profile(
            "Child",
            7,
            AbilityFlags {
                can_crouch: true,
                ..AbilityFlags::default()
            },
        ),
        sample_profile(
            "Teen",
            14,
            AbilityFlags {
                can_crouch: true,
                can_dash: true,
                can_wall_cling: true,
                ..AbilityFlags::default()
            },
        ),
        sample_profile(
            "Adult",
            21,
            AbilityFlags {
                can_crouch: true,
                can_dash: true,
                can_wall_cling: true,
                can_shoot: true,
                max_jump_count: 2,
            },
        ),
    ])
    .expect("sample age set is valid")
}

/// Yields to the runtime long enough for spawned fetch tasks to run and
/// deliver their completions on a current-thread runtime.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
