//! Capability listener registry.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use ageshift_core::listener::CapabilityListener;
use tracing::debug;
use uuid::Uuid;

/// Registration token returned by `ListenerRegistry::register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type Entry = (ListenerId, Arc<dyn CapabilityListener>);

/// Shared set of capability listeners.
///
/// Clones share the same set, so a listener that was handed a clone can
/// unregister itself while a broadcast is running. Broadcasts iterate a
/// snapshot and hold no lock while listeners run.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` and returns its token.
    pub fn register(&self, listener: Arc<dyn CapabilityListener>) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        debug!(listener = %id, "capability listener registered");
        id
    }

    /// Removes the listener registered under `id`. Returns whether it was
    /// present.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if removed {
            debug!(listener = %id, "capability listener unregistered");
        }
        removed
    }

    /// The listeners registered right now.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn CapabilityListener>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ageshift_test_support::RecordingListener;

    #[test]
    fn test_unregister_removes_only_the_given_listener() {
        // Arrange
        let registry = ListenerRegistry::new();
        let first = registry.register(Arc::new(RecordingListener::new()));
        let _second = registry.register(Arc::new(RecordingListener::new()));

        // Act
        let removed = registry.unregister(first);
        let removed_again = registry.unregister(first);

        // Assert
        assert!(removed);
        assert!(!removed_again);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_changes() {
        let registry = ListenerRegistry::new();
        let id = registry.register(Arc::new(RecordingListener::new()));

        let snapshot = registry.snapshot();
        registry.unregister(id);

        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
