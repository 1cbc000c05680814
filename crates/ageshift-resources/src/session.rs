//! Resource loader session.
//!
//! Fetches run on spawned tasks; their completions are queued on a channel
//! and only touch session state when the owner drains them with
//! `poll_completions` from the coordinator's tick.
//!
//! Cache entries are pinned by the handles that hold them. An entry whose
//! last handle is released stays resident, unpinned, so returning to an
//! age reuses its asset; unpinned entries are evicted least recently used
//! first once the resident bytes exceed the session's budget. Discarding a
//! handle frees an asset nobody else holds straight away.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ageshift_core::asset::{AssetFetcher, VisualAsset};
use ageshift_core::error::DomainError;
use ageshift_core::generation::Generation;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::handle::{HandleId, LoadState, ResourceHandle};

/// Default resident-asset budget: 64 MiB.
pub const DEFAULT_BUDGET_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug)]
struct FetchCompletion {
    key: String,
    result: Result<VisualAsset, DomainError>,
}

#[derive(Debug)]
enum EntryState {
    Pending,
    Ready(VisualAsset),
}

#[derive(Debug)]
struct CacheEntry {
    state: EntryState,
    holders: usize,
    last_used: u64,
}

impl CacheEntry {
    fn ready_bytes(&self) -> usize {
        match &self.state {
            EntryState::Ready(asset) => asset.data.len(),
            EntryState::Pending => 0,
        }
    }

    fn is_evictable(&self) -> bool {
        self.holders == 0 && matches!(self.state, EntryState::Ready(_))
    }
}

/// Cache key a released handle was holding, if any.
struct Pinned(Option<String>);

#[derive(Debug)]
struct HandleRecord {
    key: String,
    generation: Generation,
    state: LoadState,
}

/// Cache and bookkeeping for visual asset fetches.
pub struct ResourceSession {
    fetcher: Arc<dyn AssetFetcher>,
    entries: HashMap<String, CacheEntry>,
    handles: HashMap<HandleId, HandleRecord>,
    next_id: u64,
    uses: u64,
    budget_bytes: usize,
    completions_tx: mpsc::UnboundedSender<FetchCompletion>,
    completions_rx: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl fmt::Debug for ResourceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSession")
            .field("entries", &self.entries.len())
            .field("handles", &self.handles.len())
            .field("budget_bytes", &self.budget_bytes)
            .finish_non_exhaustive()
    }
}

impl ResourceSession {
    /// Creates an empty session fetching through `fetcher`, with the
    /// default budget.
    #[must_use]
    pub fn new(fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self::with_budget(fetcher, DEFAULT_BUDGET_BYTES)
    }

    /// Creates an empty session that keeps at most `budget_bytes` of
    /// unpinned assets resident.
    #[must_use]
    pub fn with_budget(fetcher: Arc<dyn AssetFetcher>, budget_bytes: usize) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            entries: HashMap::new(),
            handles: HashMap::new(),
            next_id: 0,
            uses: 0,
            budget_bytes,
            completions_tx,
            completions_rx,
        }
    }

    fn next_use(&mut self) -> u64 {
        self.uses += 1;
        self.uses
    }

    /// Requests the asset stored under `key` on behalf of `generation`.
    ///
    /// Never blocks. A resident key yields a `Ready` handle without a new
    /// fetch; a key already being fetched joins that fetch.
    ///
    /// # Panics
    ///
    /// Panics if a new fetch must be started outside a Tokio runtime.
    pub fn fetch(&mut self, key: &str, generation: Generation) -> ResourceHandle {
        let id = HandleId(self.next_id);
        self.next_id += 1;
        let used = self.next_use();

        let state = if let Some(entry) = self.entries.get_mut(key) {
            entry.holders += 1;
            entry.last_used = used;
            match entry.state {
                EntryState::Ready(_) => {
                    debug!(key, %generation, "asset cache hit");
                    LoadState::Ready
                }
                EntryState::Pending => {
                    debug!(key, %generation, "joining in-flight fetch");
                    LoadState::Pending
                }
            }
        } else {
            self.entries.insert(
                key.to_owned(),
                CacheEntry {
                    state: EntryState::Pending,
                    holders: 1,
                    last_used: used,
                },
            );
            self.spawn_fetch(key);
            LoadState::Pending
        };

        self.handles.insert(
            id,
            HandleRecord {
                key: key.to_owned(),
                generation,
                state,
            },
        );

        ResourceHandle {
            id,
            key: key.to_owned(),
            generation,
            state,
        }
    }

    fn spawn_fetch(&self, key: &str) {
        let fetcher = Arc::clone(&self.fetcher);
        let completions = self.completions_tx.clone();
        let key = key.to_owned();
        debug!(key = %key, "starting asset fetch");
        tokio::spawn(async move {
            let result = fetcher.fetch(&key).await;
            if let Err(mpsc::error::SendError(orphan)) =
                completions.send(FetchCompletion { key, result })
            {
                // Session is gone; nobody will ever release this otherwise.
                if let Ok(asset) = orphan.result {
                    fetcher.release(&asset);
                }
            }
        });
    }

    /// Applies every fetch completion received since the last call and
    /// returns the handles that settled, in issue order.
    pub fn poll_completions(&mut self) -> Vec<ResourceHandle> {
        let mut settled = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.complete(completion, &mut settled);
        }
        self.evict_over_budget();
        settled.sort_by_key(ResourceHandle::id);
        settled
    }

    fn complete(&mut self, completion: FetchCompletion, settled: &mut Vec<ResourceHandle>) {
        let FetchCompletion { key, result } = completion;

        let new_state = match result {
            Ok(asset) => {
                let holders = self.entries.get(&key).map_or(0, |entry| entry.holders);
                if holders == 0 {
                    debug!(key = %key, "fetch completed after every handle was released");
                    self.entries.remove(&key);
                    self.fetcher.release(&asset);
                    return;
                }
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.state = EntryState::Ready(asset);
                }
                LoadState::Ready
            }
            Err(err) => {
                warn!(key = %key, error = %err, "asset fetch failed");
                self.entries.remove(&key);
                LoadState::Failed
            }
        };

        for (id, record) in &mut self.handles {
            if record.key == key && record.state == LoadState::Pending {
                record.state = new_state;
                settled.push(ResourceHandle {
                    id: *id,
                    key: record.key.clone(),
                    generation: record.generation,
                    state: new_state,
                });
            }
        }
    }

    /// Releases `handle`, unpinning its asset.
    ///
    /// Returns `true` if this call released it and `false` if it had already
    /// been released. An asset with no remaining handle stays resident
    /// until the budget forces it out.
    pub fn release(&mut self, handle: &ResourceHandle) -> bool {
        let Some(pinned) = self.drop_handle(handle) else {
            return false;
        };
        if let Pinned(Some(key)) = pinned {
            self.unpin(&key);
            self.evict_over_budget();
        }
        true
    }

    /// Releases `handle` and frees its asset at once if no other handle
    /// holds it. Used for superseded handles whose asset was never shown.
    ///
    /// Returns `false` if the handle had already been released.
    pub fn discard(&mut self, handle: &ResourceHandle) -> bool {
        let Some(pinned) = self.drop_handle(handle) else {
            return false;
        };
        if let Pinned(Some(key)) = pinned {
            self.unpin(&key);
            if self.entries.get(&key).is_some_and(CacheEntry::is_evictable) {
                self.evict(&key);
            }
        }
        true
    }

    /// Removes the handle record. The inner value is the key the handle
    /// pinned; failed handles pin nothing.
    fn drop_handle(&mut self, handle: &ResourceHandle) -> Option<Pinned> {
        let Some(record) = self.handles.remove(&handle.id) else {
            warn!(key = handle.key(), "resource handle released twice");
            return None;
        };

        debug!(key = %record.key, generation = %record.generation, "releasing resource handle");
        let pinned = matches!(record.state, LoadState::Pending | LoadState::Ready);
        Some(Pinned(pinned.then_some(record.key)))
    }

    fn unpin(&mut self, key: &str) {
        // Pending entries stay even when unpinned so the completion can
        // free the asset.
        if let Some(entry) = self.entries.get_mut(key) {
            entry.holders = entry.holders.saturating_sub(1);
        }
    }

    fn evict(&mut self, key: &str) {
        if let Some(CacheEntry {
            state: EntryState::Ready(asset),
            ..
        }) = self.entries.remove(key)
        {
            debug!(key, bytes = asset.data.len(), "evicting cached asset");
            self.fetcher.release(&asset);
        }
    }

    fn evict_over_budget(&mut self) {
        while self.resident_bytes() > self.budget_bytes {
            let oldest = self
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_evictable())
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            let Some(key) = oldest else {
                debug!(
                    resident = self.resident_bytes(),
                    budget = self.budget_bytes,
                    "asset budget exceeded by pinned assets"
                );
                return;
            };
            self.evict(&key);
        }
    }

    /// Authoritative loading state of `handle`.
    #[must_use]
    pub fn state(&self, handle: &ResourceHandle) -> LoadState {
        self.handles
            .get(&handle.id)
            .map_or(LoadState::Released, |record| record.state)
    }

    /// The asset behind `handle`, if it is ready and not released.
    #[must_use]
    pub fn asset(&self, handle: &ResourceHandle) -> Option<&VisualAsset> {
        let record = self.handles.get(&handle.id)?;
        if record.state != LoadState::Ready {
            return None;
        }
        match &self.entries.get(&record.key)?.state {
            EntryState::Ready(asset) => Some(asset),
            EntryState::Pending => None,
        }
    }

    /// Whether an asset for `key` is cached.
    #[must_use]
    pub fn is_resident(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| matches!(entry.state, EntryState::Ready(_)))
    }

    /// Total size of cached assets, pinned or not.
    #[must_use]
    pub fn resident_bytes(&self) -> usize {
        self.entries.values().map(CacheEntry::ready_bytes).sum()
    }

    /// Number of handles not yet released.
    #[must_use]
    pub fn live_handle_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ageshift_test_support::{ScriptedAssetFetcher, settle};

    fn session_with(fetcher: &Arc<ScriptedAssetFetcher>) -> ResourceSession {
        ResourceSession::new(Arc::clone(fetcher) as Arc<dyn AssetFetcher>)
    }

    #[tokio::test]
    async fn test_fetch_completes_on_poll_after_delivery() {
        // Arrange
        let fetcher = Arc::new(ScriptedAssetFetcher::new());
        let mut session = session_with(&fetcher);

        // Act
        let handle = session.fetch("sprites/child", Generation::new(1));
        settle().await;
        let before = session.poll_completions();
        fetcher.resolve("sprites/child");
        settle().await;
        let settled = session.poll_completions();

        // Assert
        assert_eq!(handle.state(), LoadState::Pending);
        assert!(before.is_empty());
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].id(), handle.id());
        assert_eq!(settled[0].state(), LoadState::Ready);
        assert_eq!(settled[0].generation(), Generation::new(1));
        assert_eq!(session.state(&handle), LoadState::Ready);
        assert_eq!(
            session.asset(&handle).unwrap().data.as_ref(),
            b"sprites/child"
        );
    }

    #[tokio::test]
    async fn test_resident_key_is_served_from_cache() {
        let fetcher = Arc::new(ScriptedAssetFetcher::immediate());
        let mut session = session_with(&fetcher);
        let first = session.fetch("sprites/teen", Generation::new(1));
        settle().await;
        session.poll_completions();

        let second = session.fetch("sprites/teen", Generation::new(2));

        assert_eq!(second.state(), LoadState::Ready);
        assert_ne!(first.id(), second.id());
        assert!(session.asset(&second).is_some());
        assert_eq!(fetcher.fetch_count("sprites/teen"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_of_one_key_share_a_single_fetch() {
        let fetcher = Arc::new(ScriptedAssetFetcher::new());
        let mut session = session_with(&fetcher);

        let a = session.fetch("sprites/adult", Generation::new(1));
        let b = session.fetch("sprites/adult", Generation::new(2));
        fetcher.resolve("sprites/adult");
        settle().await;
        let settled = session.poll_completions();

        assert_eq!(fetcher.fetch_count("sprites/adult"), 1);
        let ids: Vec<_> = settled.iter().map(ResourceHandle::id).collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_settles_as_failed_without_caching() {
        let fetcher = Arc::new(ScriptedAssetFetcher::new());
        let mut session = session_with(&fetcher);
        fetcher.fail("sprites/missing", "not found");

        let handle = session.fetch("sprites/missing", Generation::new(1));
        settle().await;
        let settled = session.poll_completions();

        assert_eq!(settled[0].state(), LoadState::Failed);
        assert!(!session.is_resident("sprites/missing"));
        assert!(session.asset(&handle).is_none());
        assert!(session.release(&handle));
        assert_eq!(fetcher.release_count("sprites/missing"), 0);
    }
    #[tokio::test]
    async fn test_handle_is_released_exactly_once() {
        let fetcher = Arc::new(ScriptedAssetFetcher::immediate());
        let mut session = session_with(&fetcher);
        let handle = session.fetch("sprites/child", Generation::new(1));
        settle().await;
        session.poll_completions();

        assert!(session.release(&handle));
        assert!(!session.release(&handle));
        assert!(!session.discard(&handle));

        assert_eq!(session.state(&handle), LoadState::Released);
        assert_eq!(session.live_handle_count(), 0);
    }

    #[tokio::test]
    async fn test_released_asset_stays_cached_for_the_next_fetch() {
        // Arrange
        let fetcher = Arc::new(ScriptedAssetFetcher::immediate());
        let mut session = session_with(&fetcher);
        let first = session.fetch("sprites/child", Generation::new(1));
        settle().await;
        session.poll_completions();

        // Act
        session.release(&first);
        let again = session.fetch("sprites/child", Generation::new(3));

        // Assert
        assert_eq!(again.state(), LoadState::Ready);
        assert_eq!(fetcher.fetch_count("sprites/child"), 1);
        assert_eq!(fetcher.release_count("sprites/child"), 0);
        assert_eq!(session.resident_bytes(), b"sprites/child".len());
    }

    #[tokio::test]
    async fn test_shared_asset_is_freed_when_last_holder_discards() {
        let fetcher = Arc::new(ScriptedAssetFetcher::immediate());
        let mut session = session_with(&fetcher);
        let first = session.fetch("sprites/teen", Generation::new(1));
        settle().await;
        session.poll_completions();
        let second = session.fetch("sprites/teen", Generation::new(2));

        session.discard(&first);
        assert!(session.is_resident("sprites/teen"));
        assert_eq!(fetcher.release_count("sprites/teen"), 0);

        session.discard(&second);
        assert!(!session.is_resident("sprites/teen"));
        assert_eq!(fetcher.release_count("sprites/teen"), 1);
    }

    #[tokio::test]
    async fn test_unpinned_assets_are_evicted_least_recently_used_first() {
        // Arrange: room for two of the three sprites.
        let fetcher = Arc::new(ScriptedAssetFetcher::immediate());
        let mut session =
            ResourceSession::with_budget(Arc::clone(&fetcher) as Arc<dyn AssetFetcher>, 25);
        for (generation, key) in [(1, "sprites/child"), (2, "sprites/teen")] {
            let handle = session.fetch(key, Generation::new(generation));
            settle().await;
            session.poll_completions();
            session.release(&handle);
        }

        // Act
        let adult = session.fetch("sprites/adult", Generation::new(3));
        settle().await;
        session.poll_completions();

        // Assert
        assert_eq!(session.state(&adult), LoadState::Ready);
        assert!(!session.is_resident("sprites/child"));
        assert!(session.is_resident("sprites/teen"));
        assert_eq!(fetcher.releases(), vec!["sprites/child".to_owned()]);
        assert!(session.resident_bytes() <= 25);
    }

    #[tokio::test]
    async fn test_pinned_asset_outlives_an_exhausted_budget() {
        let fetcher = Arc::new(ScriptedAssetFetcher::immediate());
        let mut session =
            ResourceSession::with_budget(Arc::clone(&fetcher) as Arc<dyn AssetFetcher>, 0);
        let handle = session.fetch("sprites/adult", Generation::new(1));
        settle().await;
        session.poll_completions();

        assert!(session.is_resident("sprites/adult"));
        assert!(session.asset(&handle).is_some());

        session.release(&handle);

        assert!(!session.is_resident("sprites/adult"));
        assert_eq!(fetcher.release_count("sprites/adult"), 1);
    }

    #[tokio::test]
    async fn test_asset_completing_after_release_is_freed_immediately() {
        let fetcher = Arc::new(ScriptedAssetFetcher::new());
        let mut session = session_with(&fetcher);
        let handle = session.fetch("sprites/child", Generation::new(1));

        session.release(&handle);
        fetcher.resolve("sprites/child");
        settle().await;
        let settled = session.poll_completions();

        assert!(settled.is_empty());
        assert_eq!(fetcher.release_count("sprites/child"), 1);
        assert!(!session.is_resident("sprites/child"));
    }
}
