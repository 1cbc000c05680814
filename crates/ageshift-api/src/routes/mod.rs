//! Route modules organized by concern.

pub mod ages;
pub mod health;
pub mod progress;
