//! Resource handles.

use ageshift_core::generation::Generation;

/// Session-unique handle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub(crate) u64);

/// Loading state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// The fetch has not completed.
    Pending,
    /// The asset is resident.
    Ready,
    /// The fetch failed; the handle holds no asset.
    Failed,
    /// The handle has been released.
    Released,
}

/// A tagged reference to an asynchronously fetched asset.
///
/// The `state` is a snapshot taken when the handle was returned by the
/// session; `ResourceSession::state` is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub(crate) id: HandleId,
    pub(crate) key: String,
    pub(crate) generation: Generation,
    pub(crate) state: LoadState,
}

impl ResourceHandle {
    /// The handle identifier.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The fetch key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The generation the fetch was requested under.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Loading state at the time the handle was produced.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }
}
