//! Input Profile Switcher for the Ageshift engine.
//!
//! Enables the action group that fits the current age and gates
//! individual actions by the age's ability flags.

pub mod actions;
pub mod switcher;

pub use actions::ActionMap;
pub use switcher::{InputProfileSwitcher, InputSwitchConfig};
