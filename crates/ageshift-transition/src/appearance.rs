//! Appearance controller.
//!
//! Requests the per-age visual asset on every age change and applies it on
//! a later tick, but only if the handle's generation is still current.
//! Superseded handles are discarded exactly once, freeing assets that were
//! never shown; a replaced appearance stays cached for a later return to
//! its age. Failed fetches leave the visible appearance untouched.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ageshift_core::asset::{AppearanceSink, AssetFetcher};
use ageshift_core::listener::{AgeChanged, CapabilityListener, Tick};
use ageshift_resources::{LoadState, ResourceHandle, ResourceSession};
use tracing::{debug, info, warn};

use crate::state::AgeState;

#[derive(Debug)]
struct Slot {
    session: ResourceSession,
    pending: Vec<ResourceHandle>,
    applied: Option<ResourceHandle>,
}

/// Single writer of the character's visible appearance.
pub struct AppearanceController {
    state: AgeState,
    sink: Arc<dyn AppearanceSink>,
    slot: Mutex<Slot>,
}

impl fmt::Debug for AppearanceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppearanceController")
            .field("state", &self.state)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl AppearanceController {
    /// Creates a controller that checks handles against `state`, fetches
    /// through `fetcher` and shows results on `sink`.
    #[must_use]
    pub fn new(
        state: AgeState,
        fetcher: Arc<dyn AssetFetcher>,
        sink: Arc<dyn AppearanceSink>,
    ) -> Self {
        Self {
            state,
            sink,
            slot: Mutex::new(Slot {
                session: ResourceSession::new(fetcher),
                pending: Vec::new(),
                applied: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Key of the asset currently shown.
    #[must_use]
    pub fn applied_key(&self) -> Option<String> {
        self.lock()
            .applied
            .as_ref()
            .map(|handle| handle.key().to_owned())
    }

    /// Number of fetches not yet settled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of live handles held by the underlying session.
    #[must_use]
    pub fn live_handle_count(&self) -> usize {
        self.lock().session.live_handle_count()
    }

    fn settle(&self, slot: &mut Slot, handle: ResourceHandle, state: LoadState) {
        let current = self.state.current_generation();
        if handle.generation() != current {
            debug!(
                key = handle.key(),
                generation = %handle.generation(),
                %current,
                "discarding stale appearance"
            );
            slot.session.discard(&handle);
            return;
        }

        match state {
            LoadState::Ready => {
                let Some(asset) = slot.session.asset(&handle).cloned() else {
                    slot.session.discard(&handle);
                    return;
                };
                self.sink.show(&asset);
                info!(key = handle.key(), generation = %current, "appearance applied");
                if let Some(previous) = slot.applied.replace(handle) {
                    slot.session.release(&previous);
                }
            }
            LoadState::Failed => {
                warn!(key = handle.key(), "keeping previous appearance after failed fetch");
                slot.session.release(&handle);
            }
            LoadState::Pending | LoadState::Released => {}
        }
    }
}

impl CapabilityListener for AppearanceController {
    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        let key = change.profile.visual_key.as_str();
        let mut slot = self.lock();
        if slot
            .applied
            .as_ref()
            .is_some_and(|applied| applied.key() == key)
        {
            debug!(key, "appearance already shown");
            return;
        }
        let handle = slot.session.fetch(key, change.generation);
        slot.pending.push(handle);
    }
}

impl Tick for AppearanceController {
    fn tick(&self, _dt: Duration) {
        let mut guard = self.lock();
        let slot = &mut *guard;
        slot.session.poll_completions();

        let pending = std::mem::take(&mut slot.pending);
        for handle in pending {
            match slot.session.state(&handle) {
                LoadState::Pending => slot.pending.push(handle),
                state => self.settle(slot, handle, state),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ageshift_core::generation::Generation;
    use ageshift_test_support::{RecordingAppearanceSink, ScriptedAssetFetcher, sample_age_set};
    use uuid::Uuid;

    struct Fixture {
        state: AgeState,
        fetcher: Arc<ScriptedAssetFetcher>,
        sink: Arc<RecordingAppearanceSink>,
        controller: AppearanceController,
    }

    fn fixture(fetcher: ScriptedAssetFetcher) -> Fixture {
        let ages = sample_age_set();
        let state = AgeState::new(0, ages.get(0).unwrap().clone());
        let fetcher = Arc::new(fetcher);
        let sink = Arc::new(RecordingAppearanceSink::new());
        let controller = AppearanceController::new(
            state.clone(),
            fetcher.clone(),
            sink.clone(),
        );
        Fixture {
            state,
            fetcher,
            sink,
            controller,
        }
    }

    fn transition(fx: &Fixture, index: usize) -> Generation {
        let ages = sample_age_set();
        let profile = ages.get(index).unwrap();
        let (previous_index, generation) =
            fx.state.advance(index, profile.clone(), false, Uuid::nil());
        fx.controller.on_age_changed(&AgeChanged {
            index,
            previous_index,
            generation,
            profile,
        });
        generation
    }

    #[tokio::test]
    async fn test_current_generation_result_is_shown() {
        // Arrange
        let fx = fixture(ScriptedAssetFetcher::new());
        transition(&fx, 1);

        // Act
        fx.fetcher.resolve("sprites/teen");
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        // Assert
        assert_eq!(fx.sink.shown_keys(), vec!["sprites/teen".to_owned()]);
        assert_eq!(fx.controller.applied_key().as_deref(), Some("sprites/teen"));
        assert_eq!(fx.controller.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_superseded_result_is_released_without_being_shown() {
        // Arrange
        let fx = fixture(ScriptedAssetFetcher::new());
        transition(&fx, 1);
        transition(&fx, 2);

        // Act
        fx.fetcher.resolve("sprites/teen");
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);
        fx.controller.tick(Duration::ZERO);

        // Assert
        assert!(fx.sink.shown_keys().is_empty());
        assert_eq!(fx.fetcher.release_count("sprites/teen"), 1);
        assert_eq!(fx.controller.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_appearance() {
        let fx = fixture(ScriptedAssetFetcher::new());
        transition(&fx, 0);
        fx.fetcher.resolve("sprites/child");
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        transition(&fx, 1);
        fx.fetcher.fail("sprites/teen", "missing atlas");
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        assert_eq!(fx.sink.shown_keys(), vec!["sprites/child".to_owned()]);
        assert_eq!(fx.controller.applied_key().as_deref(), Some("sprites/child"));
        assert_eq!(fx.controller.live_handle_count(), 1);
    }

    #[tokio::test]
    async fn test_replaced_appearance_stays_cached_but_unpinned() {
        let fx = fixture(ScriptedAssetFetcher::immediate());
        transition(&fx, 0);
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        transition(&fx, 2);
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        assert_eq!(
            fx.sink.shown_keys(),
            vec!["sprites/child".to_owned(), "sprites/adult".to_owned()]
        );
        assert!(fx.fetcher.releases().is_empty());
        assert_eq!(fx.controller.live_handle_count(), 1);
    }

    #[tokio::test]
    async fn test_returning_to_cached_age_reuses_asset_without_refetch() {
        // Arrange
        let fx = fixture(ScriptedAssetFetcher::immediate());
        for index in [0, 1] {
            transition(&fx, index);
            ageshift_test_support::settle().await;
            fx.controller.tick(Duration::ZERO);
        }

        // Act
        transition(&fx, 0);
        fx.controller.tick(Duration::ZERO);

        // Assert
        assert_eq!(fx.controller.applied_key().as_deref(), Some("sprites/child"));
        assert_eq!(
            fx.sink.shown_keys(),
            vec![
                "sprites/child".to_owned(),
                "sprites/teen".to_owned(),
                "sprites/child".to_owned()
            ]
        );
        assert_eq!(fx.fetcher.fetch_count("sprites/child"), 1);
        assert_eq!(fx.controller.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_age_keeps_applied_asset() {
        let fx = fixture(ScriptedAssetFetcher::immediate());
        transition(&fx, 1);
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        transition(&fx, 1);
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        assert_eq!(fx.sink.shown_keys().len(), 1);
        assert_eq!(fx.fetcher.fetch_count("sprites/teen"), 1);
        assert_eq!(fx.controller.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_returning_to_shown_age_discards_pending_fetch() {
        // Arrange
        let fx = fixture(ScriptedAssetFetcher::immediate());
        transition(&fx, 1);
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);
        transition(&fx, 2);

        // Act
        transition(&fx, 1);
        let before_tick = fx.sink.shown_keys().len();
        ageshift_test_support::settle().await;
        fx.controller.tick(Duration::ZERO);

        // Assert
        assert_eq!(before_tick, 1);
        assert_eq!(fx.controller.applied_key().as_deref(), Some("sprites/teen"));
        assert_eq!(fx.sink.shown_keys(), vec!["sprites/teen".to_owned()]);
        assert_eq!(fx.fetcher.release_count("sprites/adult"), 1);
    }
}
