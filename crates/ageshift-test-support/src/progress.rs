//! Progress fakes: in-memory and failing stores, and a frozen save clock.

use std::collections::HashSet;
use std::sync::Mutex;

use ageshift_core::error::DomainError;
use ageshift_core::progress::{Clock, ProgressStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

/// A progress store that keeps everything in memory and records every saved
/// index in order.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    saved: Mutex<Vec<usize>>,
    collected: Mutex<HashSet<String>>,
}

impl InMemoryProgressStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that reports `index` as previously saved.
    #[must_use]
    pub fn with_saved_index(index: usize) -> Self {
        Self {
            saved: Mutex::new(vec![index]),
            collected: Mutex::new(HashSet::new()),
        }
    }

    /// Returns a snapshot of every index saved so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_indices(&self) -> Vec<usize> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn save_current_index(&self, index: usize) -> Result<(), DomainError> {
        self.saved.lock().unwrap().push(index);
        Ok(())
    }

    async fn load_current_index(&self) -> Result<Option<usize>, DomainError> {
        Ok(self.saved.lock().unwrap().last().copied())
    }

    async fn mark_collected(&self, id: &str) -> Result<(), DomainError> {
        self.collected.lock().unwrap().insert(id.to_owned());
        Ok(())
    }

    async fn has_collected(&self, id: &str) -> Result<bool, DomainError> {
        Ok(self.collected.lock().unwrap().contains(id))
    }
}

/// A progress store that always returns an infrastructure error. Useful for
/// testing that persistence failures stay non-fatal.
#[derive(Debug)]
pub struct FailingProgressStore;

#[async_trait]
impl ProgressStore for FailingProgressStore {
    async fn save_current_index(&self, _index: usize) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("disk full".into()))
    }

    async fn load_current_index(&self) -> Result<Option<usize>, DomainError> {
        Err(DomainError::Infrastructure("disk full".into()))
    }

    async fn mark_collected(&self, _id: &str) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("disk full".into()))
    }

    async fn has_collected(&self, _id: &str) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("disk full".into()))
    }
}

/// A save clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Frozen at midnight UTC on the given date.
    ///
    /// # Panics
    ///
    /// Panics if the date does not exist.
    #[must_use]
    pub fn on(year: i32, month: u32, day: u32) -> Self {
        Self(Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
