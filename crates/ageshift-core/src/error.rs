//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A transition targeted an index outside the age set.
    #[error("age index {index} is out of range for an age set of {len}")]
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// Number of profiles in the age set.
        len: usize,
    },

    /// A validation error in domain logic or loaded data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An asset fetch did not produce a usable asset.
    #[error("failed to load asset {key}: {reason}")]
    AssetLoad {
        /// The fetch key.
        key: String,
        /// Why the fetch failed.
        reason: String,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
