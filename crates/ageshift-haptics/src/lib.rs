//! Haptic Feedback Service for the Ageshift engine.
//!
//! Plays rumble pulses and multi-segment patterns on an injected device.
//! One pattern plays at a time; a new request pre-empts the old one.

pub mod service;

pub use service::{AgeChangePulse, HapticConfig, HapticSegment, HapticService};
