//! Listeners that forward age changes to optional collaborators.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use ageshift_core::integration::DialogueVariables;
use ageshift_core::listener::{AgeChanged, CapabilityListener};
use serde::Deserialize;
use tracing::debug;

/// Dialogue variable that receives the current age in years.
pub const AGE_VARIABLE: &str = "player_age";

/// Mirrors the current age into an installed dialogue system.
#[derive(Default)]
pub struct DialogueBridge {
    variables: Option<Arc<dyn DialogueVariables>>,
}

impl std::fmt::Debug for DialogueBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueBridge")
            .field("installed", &self.variables.is_some())
            .finish()
    }
}

impl DialogueBridge {
    /// Creates a bridge. `None` means no dialogue system is installed.
    #[must_use]
    pub fn new(variables: Option<Arc<dyn DialogueVariables>>) -> Self {
        Self { variables }
    }
}

impl CapabilityListener for DialogueBridge {
    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        match &self.variables {
            Some(variables) => {
                variables.set_number(AGE_VARIABLE, f64::from(change.profile.age_years));
            }
            None => debug!("no dialogue system installed"),
        }
    }
}

/// Age bounds for one piece of gated scene content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GateRule {
    /// Content identifier.
    pub content_id: String,
    /// Youngest age that sees the content, inclusive.
    #[serde(default)]
    pub min_age: u32,
    /// Oldest age that sees the content, inclusive.
    #[serde(default = "GateRule::no_max_age")]
    pub max_age: u32,
}

impl GateRule {
    fn no_max_age() -> u32 {
        u32::MAX
    }

    /// Whether a character aged `age_years` sees the content.
    #[must_use]
    pub fn admits(&self, age_years: u32) -> bool {
        (self.min_age..=self.max_age).contains(&age_years)
    }
}

/// Shows and hides age-restricted scene content.
#[derive(Debug, Default)]
pub struct SceneGate {
    rules: Vec<GateRule>,
    visible: RwLock<BTreeSet<String>>,
}

impl SceneGate {
    /// Creates a gate; nothing is visible until the first age change.
    #[must_use]
    pub fn new(rules: Vec<GateRule>) -> Self {
        Self {
            rules,
            visible: RwLock::new(BTreeSet::new()),
        }
    }

    /// Whether `content_id` is currently shown.
    #[must_use]
    pub fn is_visible(&self, content_id: &str) -> bool {
        self.visible
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(content_id)
    }

    /// Identifiers of every visible item.
    #[must_use]
    pub fn visible(&self) -> Vec<String> {
        self.visible
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl CapabilityListener for SceneGate {
    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        let age = change.profile.age_years;
        let shown: BTreeSet<String> = self
            .rules
            .iter()
            .filter(|rule| rule.admits(age))
            .map(|rule| rule.content_id.clone())
            .collect();
        debug!(age, shown = shown.len(), "scene gate updated");
        *self.visible.write().unwrap_or_else(PoisonError::into_inner) = shown;
    }
}
