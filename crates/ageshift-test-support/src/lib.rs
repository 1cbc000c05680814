//! Shared test fakes and fixtures for the Ageshift engine.

mod asset;
mod devices;
mod fixtures;
mod listener;
mod progress;

pub use asset::{RecordingAppearanceSink, ScriptedAssetFetcher};
pub use devices::{
    AudioCall, RecordingAudioBackend, RecordingDialogue, RecordingDirector, RecordingHapticDevice,
};
pub use fixtures::{sample_age_set, sample_profile, settle};
pub use listener::{ListenerCall, RecordingListener};
pub use progress::{FailingProgressStore, FixedClock, InMemoryProgressStore};
