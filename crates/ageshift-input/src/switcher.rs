//! Input profile switcher.

use std::sync::{Arc, Mutex, PoisonError};

use ageshift_core::listener::{AgeChanged, CapabilityListener};
use ageshift_core::profile::AgeProfile;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::actions::ActionMap;

/// Group and action names used by the switcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputSwitchConfig {
    /// Ages at or below this use the child group. Defaults to `11`.
    pub child_threshold: u32,
    /// Name of the child group. Defaults to `"child"`.
    pub child_group: String,
    /// Name of the regular group. Defaults to `"player"`.
    pub player_group: String,
    /// Actions that stay enabled at every age. Defaults to interact, pause
    /// and menu.
    pub always_on: Vec<String>,
}

impl Default for InputSwitchConfig {
    fn default() -> Self {
        Self {
            child_threshold: 11,
            child_group: "child".to_owned(),
            player_group: "player".to_owned(),
            always_on: vec!["interact".to_owned(), "pause".to_owned(), "menu".to_owned()],
        }
    }
}

/// Name of the dash action gated by `can_dash`.
pub const DASH_ACTION: &str = "dash";
/// Name of the shoot action gated by `can_shoot`.
pub const SHOOT_ACTION: &str = "shoot";

/// Switches action groups and gated actions on every age change.
#[derive(Debug)]
pub struct InputProfileSwitcher {
    actions: Option<Arc<Mutex<ActionMap>>>,
    config: InputSwitchConfig,
}

impl InputProfileSwitcher {
    /// Creates a switcher. Without an action asset every apply is a no-op.
    #[must_use]
    pub fn new(actions: Option<Arc<Mutex<ActionMap>>>, config: InputSwitchConfig) -> Self {
        Self { actions, config }
    }

    /// Applies `profile` to the action asset.
    pub fn apply(&self, profile: &AgeProfile) {
        let Some(actions) = &self.actions else {
            warn!("no input action asset; skipping input switch");
            return;
        };
        let mut map = actions.lock().unwrap_or_else(PoisonError::into_inner);
        let cfg = &self.config;

        let use_child =
            profile.age_years <= cfg.child_threshold && map.has_group(&cfg.child_group);
        let (enable, disable) = if use_child {
            (&cfg.child_group, &cfg.player_group)
        } else {
            (&cfg.player_group, &cfg.child_group)
        };
        if !map.set_group_enabled(disable, false) {
            debug!(group = %disable, "input group not found");
        }
        if !map.set_group_enabled(enable, true) {
            warn!(group = %enable, "input group not found");
        }

        for (action, allowed) in [
            (DASH_ACTION, profile.abilities.can_dash),
            (SHOOT_ACTION, profile.abilities.can_shoot),
        ] {
            if map.set_action_enabled(action, allowed) == 0 {
                debug!(action, "gated input action not found");
            }
        }
        for action in &cfg.always_on {
            map.set_action_enabled(action, true);
        }

        debug!(age = profile.age_years, group = %enable, "input profile applied");
    }
}

impl CapabilityListener for InputProfileSwitcher {
    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        self.apply(change.profile);
    }
}
