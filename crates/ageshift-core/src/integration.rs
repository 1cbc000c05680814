//! Optional third-party integrations.
//!
//! Integrations are injected when installed and simply absent otherwise.

/// A dialogue system that exposes named numeric variables to its scripts.
pub trait DialogueVariables: Send + Sync {
    /// Sets `name` to `value`.
    fn set_number(&self, name: &str, value: f64);
}
