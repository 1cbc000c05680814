//! Character context for the Ageshift engine.
//!
//! Owns the live character's runtime movement parameters and the binder
//! that maps an age profile onto them.

pub mod binder;
pub mod runtime;
