//! Shared abstractions for the Ageshift engine.
//!
//! This crate defines the age data model, the generation counter, the
//! capability-listener contract and every collaborator port the subsystems
//! depend on. It contains no infrastructure code.

pub mod asset;
pub mod audio;
pub mod director;
pub mod error;
pub mod generation;
pub mod haptics;
pub mod integration;
pub mod listener;
pub mod profile;
pub mod progress;
pub mod timer;
