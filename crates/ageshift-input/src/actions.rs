//! In-memory input action asset.

use std::collections::BTreeMap;

use serde::Serialize;

/// A named bundle of actions that is enabled or disabled as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionGroup {
    /// Whether the group is enabled.
    pub enabled: bool,
    /// Per-action enabled state.
    pub actions: BTreeMap<String, bool>,
}

/// Action groups keyed by name.
///
/// An action is live only when both it and its group are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionMap {
    groups: BTreeMap<String, ActionGroup>,
}

impl ActionMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a `group -> actions` layout with everything enabled.
    #[must_use]
    pub fn from_layout(layout: &BTreeMap<String, Vec<String>>) -> Self {
        layout
            .iter()
            .fold(Self::new(), |map, (group, actions)| map.with_group(group, actions))
    }

    /// Adds (or replaces) an enabled group whose actions are all enabled.
    #[must_use]
    pub fn with_group<S: AsRef<str>>(mut self, name: &str, actions: &[S]) -> Self {
        let actions = actions
            .iter()
            .map(|action| (action.as_ref().to_owned(), true))
            .collect();
        self.groups.insert(
            name.to_owned(),
            ActionGroup {
                enabled: true,
                actions,
            },
        );
        self
    }

    /// Whether a group named `name` exists.
    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Enables or disables a group. Returns `false` if it does not exist.
    pub fn set_group_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.groups.get_mut(name) {
            Some(group) => {
                group.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enables or disables `action` in every group that defines it.
    /// Returns the number of groups touched.
    pub fn set_action_enabled(&mut self, action: &str, enabled: bool) -> usize {
        let mut touched = 0;
        for state in self
            .groups
            .values_mut()
            .filter_map(|group| group.actions.get_mut(action))
        {
            *state = enabled;
            touched += 1;
        }
        touched
    }

    /// Enabled state of a group.
    #[must_use]
    pub fn is_group_enabled(&self, name: &str) -> Option<bool> {
        self.groups.get(name).map(|group| group.enabled)
    }

    /// Enabled state of an action within a group, ignoring the group state.
    #[must_use]
    pub fn is_action_enabled(&self, group: &str, action: &str) -> Option<bool> {
        self.groups.get(group)?.actions.get(action).copied()
    }

    /// Whether `action` can currently fire from any group.
    #[must_use]
    pub fn is_action_live(&self, action: &str) -> bool {
        self.groups
            .values()
            .any(|group| group.enabled && group.actions.get(action).copied().unwrap_or(false))
    }
}
