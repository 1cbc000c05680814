//! Test asset collaborators: a scriptable fetcher and a recording sink.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use ageshift_core::asset::{AppearanceSink, AssetFetcher, VisualAsset};
use ageshift_core::error::DomainError;
use async_trait::async_trait;
use tokio::sync::oneshot;

type FetchResult = Result<VisualAsset, DomainError>;

#[derive(Debug, Default)]
struct FetcherState {
    waiting: HashMap<String, VecDeque<oneshot::Sender<FetchResult>>>,
    scripted: HashMap<String, VecDeque<FetchResult>>,
    fetches: Vec<String>,
    releases: Vec<String>,
}

/// An asset fetcher whose results are delivered by the test.
///
/// Results may be scripted before the fetch is issued (the fetch then
/// completes immediately) or delivered afterwards with `resolve`/`fail`,
/// which lets a test hold a fetch open while it issues further transitions.
/// Resolved assets carry the key bytes as their payload.
#[derive(Debug, Default)]
pub struct ScriptedAssetFetcher {
    state: Mutex<FetcherState>,
    immediate: bool,
}

impl ScriptedAssetFetcher {
    /// Create a fetcher that holds every fetch until the test delivers it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher that succeeds immediately for every key.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            state: Mutex::new(FetcherState::default()),
            immediate: true,
        }
    }

    /// Completes the oldest pending fetch of `key` successfully, or scripts
    /// the next fetch of `key` to succeed.
    pub fn resolve(&self, key: &str) {
        self.deliver(key, Ok(VisualAsset::new(key, key.as_bytes())));
    }

    /// Completes the oldest pending fetch of `key` with a failure, or
    /// scripts the next fetch of `key` to fail.
    pub fn fail(&self, key: &str, reason: &str) {
        self.deliver(
            key,
            Err(DomainError::AssetLoad {
                key: key.to_owned(),
                reason: reason.to_owned(),
            }),
        );
    }

    /// Number of times `key` was fetched.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fetch_count(&self, key: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.fetches.iter().filter(|k| *k == key).count()
    }

    /// Number of times an asset fetched under `key` was released.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn release_count(&self, key: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.releases.iter().filter(|k| *k == key).count()
    }

    /// Keys of every released asset, in release order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn releases(&self) -> Vec<String> {
        self.state.lock().unwrap().releases.clone()
    }

    fn deliver(&self, key: &str, result: FetchResult) {
        let mut state = self.state.lock().unwrap();
        if let Some(waiter) = state.waiting.get_mut(key).and_then(VecDeque::pop_front) {
            // The receiver is gone only if the fetch task was dropped.
            let _ = waiter.send(result);
        } else {
            state
                .scripted
                .entry(key.to_owned())
                .or_default()
                .push_back(result);
        }
    }
}

#[async_trait]
impl AssetFetcher for ScriptedAssetFetcher {
    async fn fetch(&self, key: &str) -> Result<VisualAsset, DomainError> {
        let receiver = {
            let mut state = self.state.lock().unwrap();
            state.fetches.push(key.to_owned());
            if self.immediate {
                return Ok(VisualAsset::new(key, key.as_bytes()));
            }
            if let Some(result) = state.scripted.get_mut(key).and_then(VecDeque::pop_front) {
                return result;
            }
            let (sender, receiver) = oneshot::channel();
            state
                .waiting
                .entry(key.to_owned())
                .or_default()
                .push_back(sender);
            receiver
        };

        receiver.await.unwrap_or_else(|_| {
            Err(DomainError::AssetLoad {
                key: key.to_owned(),
                reason: "fetch abandoned".into(),
            })
        })
    }

    fn release(&self, asset: &VisualAsset) {
        self.state.lock().unwrap().releases.push(asset.key.clone());
    }
}

/// An appearance slot that records every asset shown.
#[derive(Debug, Default)]
pub struct RecordingAppearanceSink {
    shown: Mutex<Vec<String>>,
}

impl RecordingAppearanceSink {
    /// Create a sink with nothing shown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of every asset shown, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn shown_keys(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }

    /// Key of the asset currently visible.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn current(&self) -> Option<String> {
        self.shown.lock().unwrap().last().cloned()
    }
}

impl AppearanceSink for RecordingAppearanceSink {
    fn show(&self, asset: &VisualAsset) {
        self.shown.lock().unwrap().push(asset.key.clone());
    }
}
