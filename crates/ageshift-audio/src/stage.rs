//! Audio stages and age-range lookup.

use serde::{Deserialize, Serialize};

/// A background track bound to an inclusive age range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStage {
    /// Stage identity; two stages are the same stage iff their ids match.
    pub id: String,
    /// Lowest age (inclusive) the stage covers.
    pub min_age: u32,
    /// Highest age (inclusive) the stage covers.
    pub max_age: u32,
    /// Track reference handed to the audio backend.
    pub track: String,
    /// Stage volume before the master volume is applied.
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

impl AudioStage {
    /// Whether `age_years` falls inside the stage's range.
    #[must_use]
    pub fn covers(&self, age_years: u32) -> bool {
        (self.min_age..=self.max_age).contains(&age_years)
    }
}

/// Ordered stage definitions. Ranges need not be exhaustive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTable {
    stages: Vec<AudioStage>,
}

impl StageTable {
    /// Creates a table from stages in lookup order.
    #[must_use]
    pub fn new(stages: Vec<AudioStage>) -> Self {
        Self { stages }
    }

    /// Returns the first stage covering `age_years`, falling back to the
    /// first defined stage. `None` only when the table is empty.
    #[must_use]
    pub fn select(&self, age_years: u32) -> Option<&AudioStage> {
        self.stages
            .iter()
            .find(|stage| stage.covers(age_years))
            .or_else(|| self.stages.first())
    }

    /// Returns the stage with the given id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&AudioStage> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    /// Whether no stages are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
