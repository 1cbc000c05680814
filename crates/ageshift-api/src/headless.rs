//! Collaborators for running the engine without a renderer or sound card.
//!
//! Each one records what it was asked to do in the log; the appearance
//! slot also remembers its current asset so the control surface can report
//! it.

use std::sync::{PoisonError, RwLock};

use ageshift_core::asset::{AppearanceSink, VisualAsset};
use ageshift_core::audio::AudioBackend;
use ageshift_core::director::{CutsceneCue, CutsceneDirector};
use tracing::info;

/// Audio backend that logs every channel command.
#[derive(Debug, Default)]
pub struct LoggingAudioBackend;

impl AudioBackend for LoggingAudioBackend {
    fn play(&self, channel: &str, track: &str, volume: f32) {
        info!(channel, track, volume, "audio play");
    }

    fn stop(&self, channel: &str) {
        info!(channel, "audio stop");
    }

    fn set_volume(&self, channel: &str, volume: f32) {
        tracing::trace!(channel, volume, "audio volume");
    }
}

/// Cutscene director that logs cues; playback completes instantly.
#[derive(Debug, Default)]
pub struct LoggingDirector;

impl CutsceneDirector for LoggingDirector {
    fn play(&self, cue: CutsceneCue) {
        info!(index = cue.index, generation = %cue.generation, "cutscene cue");
    }
}

/// Appearance slot that remembers the key of the shown asset.
#[derive(Debug, Default)]
pub struct HeadlessAppearance {
    shown: RwLock<Option<String>>,
}

impl HeadlessAppearance {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the asset currently shown.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.shown
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AppearanceSink for HeadlessAppearance {
    fn show(&self, asset: &VisualAsset) {
        info!(key = %asset.key, bytes = asset.data.len(), "appearance shown");
        *self.shown.write().unwrap_or_else(PoisonError::into_inner) = Some(asset.key.clone());
    }
}
