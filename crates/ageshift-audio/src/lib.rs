//! Audio Crossfade Engine for the Ageshift engine.
//!
//! Selects a background track by age and crossfades between tracks one
//! channel at a time, with at most one fade in flight per channel.

pub mod engine;
pub mod stage;

pub use engine::{ChannelPhase, CrossfadeConfig, CrossfadeEngine};
pub use stage::{AudioStage, StageTable};
