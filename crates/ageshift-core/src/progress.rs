//! Progress persistence port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;

/// External collaborator that persists player progress.
///
/// The storage format is owned by the implementation.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Persists the current age index.
    async fn save_current_index(&self, index: usize) -> Result<(), DomainError>;

    /// Loads the saved age index, or `None` if nothing was saved yet.
    async fn load_current_index(&self) -> Result<Option<usize>, DomainError>;

    /// Records that the collectible `id` has been picked up.
    async fn mark_collected(&self, id: &str) -> Result<(), DomainError>;

    /// Whether the collectible `id` has been picked up.
    async fn has_collected(&self, id: &str) -> Result<bool, DomainError>;
}

/// Source of save timestamps. Frame timing never reads it; ticks carry
/// their own `dt`.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
