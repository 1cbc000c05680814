//! Assembles the engine from game data and injected collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ageshift_audio::CrossfadeEngine;
use ageshift_character::binder::CharacterBinder;
use ageshift_character::runtime::CharacterRuntime;
use ageshift_core::asset::AssetFetcher;
use ageshift_core::audio::AudioBackend;
use ageshift_core::director::CutsceneDirector;
use ageshift_core::error::DomainError;
use ageshift_core::haptics::HapticDevice;
use ageshift_core::integration::DialogueVariables;
use ageshift_core::progress::ProgressStore;
use ageshift_haptics::HapticService;
use ageshift_input::InputProfileSwitcher;
use ageshift_transition::{
    AppearanceController, DialogueBridge, SceneGate, TransitionOrchestrator, spawn_coordinator,
};
use tracing::info;

use crate::config::GameConfig;
use crate::headless::HeadlessAppearance;
use crate::state::AppState;

/// External collaborators the engine depends on.
///
/// Optional collaborators that are absent turn the matching subsystem into
/// a logged no-op.
pub struct Collaborators {
    /// Visual asset source.
    pub fetcher: Arc<dyn AssetFetcher>,
    /// Progress persistence.
    pub progress: Arc<dyn ProgressStore>,
    /// Sound output.
    pub audio: Option<Arc<dyn AudioBackend>>,
    /// Rumble device.
    pub haptics: Option<Arc<dyn HapticDevice>>,
    /// Cutscene player.
    pub director: Option<Arc<dyn CutsceneDirector>>,
    /// Installed dialogue system.
    pub dialogue: Option<Arc<dyn DialogueVariables>>,
}

/// Builds every subsystem, registers it with a new orchestrator, starts
/// the coordinator and resumes saved progress.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the age profiles are invalid, or
/// `DomainError::OutOfRange` if `initial_index` is not a valid age.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub async fn start(
    game: &GameConfig,
    collaborators: Collaborators,
    tick: Duration,
) -> Result<AppState, DomainError> {
    let ages = game.age_set()?;
    let mut orchestrator = TransitionOrchestrator::new(ages.clone())?
        .with_initial_index(game.initial_index)?
        .with_progress(Arc::clone(&collaborators.progress));
    if let Some(director) = collaborators.director {
        orchestrator = orchestrator.with_director(director);
    }

    let appearance = Arc::new(HeadlessAppearance::new());
    let appearance_controller = Arc::new(AppearanceController::new(
        orchestrator.state(),
        collaborators.fetcher,
        appearance.clone(),
    ));
    let character = Arc::new(Mutex::new(CharacterRuntime::default()));
    let audio = Arc::new(CrossfadeEngine::new(
        collaborators.audio,
        game.audio.crossfade.clone(),
        game.audio.stages.clone(),
    ));
    let actions = game
        .input
        .action_map()
        .map(|map| Arc::new(Mutex::new(map)));
    let haptics = Arc::new(HapticService::new(
        collaborators.haptics,
        game.haptics.clone(),
    ));
    let scene = Arc::new(SceneGate::new(game.scene_gates.clone()));

    orchestrator.register(Arc::new(CharacterBinder::new(&character)));
    orchestrator.register(appearance_controller.clone());
    orchestrator.register(audio.clone());
    orchestrator.register(Arc::new(InputProfileSwitcher::new(
        actions.clone(),
        game.input.switch.clone(),
    )));
    orchestrator.register(haptics.clone());
    orchestrator.register(Arc::new(DialogueBridge::new(collaborators.dialogue)));
    orchestrator.register(scene.clone());
    orchestrator.register_tick(appearance_controller);
    orchestrator.register_tick(audio);
    orchestrator.register_tick(haptics);

    info!(
        ages = ages.len(),
        listeners = orchestrator.listeners().len(),
        "engine assembled"
    );

    let coordinator = spawn_coordinator(orchestrator, tick);
    coordinator.resume().await?;

    Ok(AppState {
        coordinator,
        ages,
        progress: collaborators.progress,
        appearance,
        character,
        actions,
        scene,
    })
}
