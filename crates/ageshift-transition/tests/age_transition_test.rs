//! End-to-end transitions across every age-reactive subsystem.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ageshift_audio::{AudioStage, CrossfadeConfig, CrossfadeEngine, StageTable};
use ageshift_character::binder::CharacterBinder;
use ageshift_character::runtime::CharacterRuntime;
use ageshift_core::generation::Generation;
use ageshift_core::haptics::HapticDevice;
use ageshift_haptics::{HapticConfig, HapticService};
use ageshift_input::{ActionMap, InputProfileSwitcher, InputSwitchConfig};
use ageshift_test_support::{
    InMemoryProgressStore, RecordingAppearanceSink, RecordingAudioBackend, RecordingHapticDevice,
    ScriptedAssetFetcher, sample_age_set, settle,
};
use ageshift_transition::{AppearanceController, TransitionOrchestrator};

const MUSIC: &str = "music";

struct World {
    orchestrator: TransitionOrchestrator,
    fetcher: Arc<ScriptedAssetFetcher>,
    sink: Arc<RecordingAppearanceSink>,
    appearance: Arc<AppearanceController>,
    character: Arc<Mutex<CharacterRuntime>>,
    audio: Arc<CrossfadeEngine>,
    actions: Arc<Mutex<ActionMap>>,
    rumble: Arc<RecordingHapticDevice>,
    progress: Arc<InMemoryProgressStore>,
}

fn stage(id: &str, min_age: u32, max_age: u32) -> AudioStage {
    AudioStage {
        id: id.to_owned(),
        min_age,
        max_age,
        track: format!("music/{id}.ogg"),
        volume: 0.8,
    }
}

fn world() -> World {
    let progress = Arc::new(InMemoryProgressStore::new());
    let mut orchestrator = TransitionOrchestrator::new(sample_age_set())
        .unwrap()
        .with_progress(progress.clone());

    let fetcher = Arc::new(ScriptedAssetFetcher::new());
    let sink = Arc::new(RecordingAppearanceSink::new());
    let appearance = Arc::new(AppearanceController::new(
        orchestrator.state(),
        fetcher.clone(),
        sink.clone(),
    ));

    let character = Arc::new(Mutex::new(CharacterRuntime::default()));
    let audio = Arc::new(CrossfadeEngine::new(
        Some(Arc::new(RecordingAudioBackend::new())),
        CrossfadeConfig {
            fade_seconds: 0.05,
            ..CrossfadeConfig::default()
        },
        StageTable::new(vec![
            stage("child", 0, 12),
            stage("teen", 13, 17),
            stage("adult", 18, 99),
        ]),
    ));
    let actions = Arc::new(Mutex::new(
        ActionMap::new()
            .with_group("player", &["move", "jump", "dash", "shoot", "interact", "pause"])
            .with_group("child", &["move", "jump", "interact", "pause"]),
    ));
    let rumble = Arc::new(RecordingHapticDevice::new());
    let haptics = Arc::new(HapticService::new(
        Some(rumble.clone() as Arc<dyn HapticDevice>),
        HapticConfig::default(),
    ));

    orchestrator.register(Arc::new(CharacterBinder::new(&character)));
    orchestrator.register(appearance.clone());
    orchestrator.register(audio.clone());
    orchestrator.register(Arc::new(InputProfileSwitcher::new(
        Some(actions.clone()),
        InputSwitchConfig::default(),
    )));
    orchestrator.register(haptics.clone());
    orchestrator.register_tick(appearance.clone());
    orchestrator.register_tick(audio.clone());
    orchestrator.register_tick(haptics);

    World {
        orchestrator,
        fetcher,
        sink,
        appearance,
        character,
        audio,
        actions,
        rumble,
        progress,
    }
}

#[tokio::test]
async fn test_superseded_transition_converges_on_latest_age() {
    // Arrange
    let world = world();

    // Act
    world.orchestrator.request_transition(1, false).await.unwrap();
    let latest = world.orchestrator.request_transition(2, false).await.unwrap();
    world.fetcher.resolve("sprites/teen");
    world.fetcher.resolve("sprites/adult");
    settle().await;
    for _ in 0..3 {
        world.orchestrator.tick(Duration::from_millis(100));
    }

    // Assert
    assert_eq!(latest, Generation::new(2));
    assert_eq!(world.orchestrator.current_age().age_years, 21);
    assert_eq!(world.sink.shown_keys(), vec!["sprites/adult".to_owned()]);
    assert_eq!(world.fetcher.release_count("sprites/teen"), 1);
    assert_eq!(world.fetcher.release_count("sprites/adult"), 0);
    assert_eq!(world.appearance.live_handle_count(), 1);

    let runtime = world.character.lock().unwrap();
    assert!(runtime.can_shoot);
    assert_eq!(runtime.max_jump_count, 2);
    drop(runtime);

    assert_eq!(world.audio.current_stage(MUSIC).as_deref(), Some("adult"));
    assert_eq!(world.audio.active_fades(MUSIC), 0);
    assert_eq!(
        world.actions.lock().unwrap().is_group_enabled("player"),
        Some(true)
    );
    assert_eq!(world.progress.saved_indices(), vec![1, 2]);
}

#[tokio::test]
async fn test_late_result_after_two_supersessions_is_released_once() {
    let world = world();

    world.orchestrator.request_transition(1, false).await.unwrap();
    world.orchestrator.request_transition(2, false).await.unwrap();
    world.orchestrator.request_transition(0, false).await.unwrap();
    world.fetcher.resolve("sprites/child");
    settle().await;
    world.orchestrator.tick(Duration::ZERO);
    world.fetcher.resolve("sprites/adult");
    world.fetcher.resolve("sprites/teen");
    settle().await;
    world.orchestrator.tick(Duration::ZERO);
    world.orchestrator.tick(Duration::ZERO);

    assert_eq!(world.sink.shown_keys(), vec!["sprites/child".to_owned()]);
    assert_eq!(world.fetcher.release_count("sprites/teen"), 1);
    assert_eq!(world.fetcher.release_count("sprites/adult"), 1);
    assert_eq!(world.fetcher.release_count("sprites/child"), 0);
}

#[tokio::test]
async fn test_revisited_ages_are_served_from_the_asset_cache() {
    // Arrange
    let world = world();

    let visits = [
        (0, Some("sprites/child")),
        (1, Some("sprites/teen")),
        (0, None),
        (1, None),
    ];

    // Act
    for (index, first_visit) in visits {
        world.orchestrator.request_transition(index, false).await.unwrap();
        if let Some(key) = first_visit {
            world.fetcher.resolve(key);
        }
        settle().await;
        world.orchestrator.tick(Duration::from_millis(100));
    }

    // Assert
    assert_eq!(world.fetcher.fetch_count("sprites/child"), 1);
    assert_eq!(world.fetcher.fetch_count("sprites/teen"), 1);
    assert_eq!(
        world.sink.shown_keys(),
        vec![
            "sprites/child".to_owned(),
            "sprites/teen".to_owned(),
            "sprites/child".to_owned(),
            "sprites/teen".to_owned(),
        ]
    );
    assert!(world.fetcher.releases().is_empty());
    assert_eq!(world.appearance.live_handle_count(), 1);
}

#[tokio::test]
async fn test_mid_fade_request_keeps_a_single_fade_per_channel() {
    let world = world();

    world.orchestrator.request_transition(0, false).await.unwrap();
    world.orchestrator.tick(Duration::from_millis(50));
    world.orchestrator.request_transition(1, false).await.unwrap();
    world.orchestrator.tick(Duration::from_millis(20));
    world.orchestrator.request_transition(2, false).await.unwrap();

    assert_eq!(world.audio.active_fades(MUSIC), 1);
    assert_eq!(world.audio.fades_started(MUSIC), 3);
}

#[tokio::test]
async fn test_repeated_request_is_rebroadcast_without_redundant_work() {
    // Arrange
    let world = world();
    world.orchestrator.request_transition(1, false).await.unwrap();
    world.fetcher.resolve("sprites/teen");
    settle().await;
    for _ in 0..3 {
        world.orchestrator.tick(Duration::from_millis(100));
    }
    let pulses = world.rumble.speeds().len();
    let fades = world.audio.fades_started(MUSIC);

    // Act
    let generation = world.orchestrator.request_transition(1, false).await.unwrap();
    settle().await;
    world.orchestrator.tick(Duration::from_millis(100));

    // Assert
    assert_eq!(generation, Generation::new(2));
    assert_eq!(world.progress.saved_indices(), vec![1, 1]);
    assert_eq!(world.fetcher.fetch_count("sprites/teen"), 1);
    assert_eq!(world.sink.shown_keys().len(), 1);
    assert_eq!(world.audio.fades_started(MUSIC), fades);
    assert_eq!(world.rumble.speeds().len(), pulses);
}
