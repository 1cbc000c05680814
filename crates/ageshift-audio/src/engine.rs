//! Crossfade engine.
//!
//! Each channel runs `Idle -> FadingOut -> (track swap) -> FadingIn -> Idle`.
//! The channel's fade lives in a `SingleFlight` slot, so starting a fade
//! always cancels the one it replaces and the slot is the only writer of
//! the channel volume.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ageshift_core::audio::AudioBackend;
use ageshift_core::listener::{AgeChanged, CapabilityListener, Tick};
use ageshift_core::profile::AgeProfile;
use ageshift_core::timer::{Ramp, SingleFlight};
use serde::Deserialize;
use tracing::{debug, info};

use crate::stage::{AudioStage, StageTable};

/// Crossfade settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    /// Channel that carries age music. Defaults to `"music"`.
    pub channel: String,
    /// Length of each fade leg in seconds. Defaults to `1.5`.
    pub fade_seconds: f32,
    /// Master volume in `[0, 1]`. Defaults to `1.0`.
    pub master_volume: f32,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        Self {
            channel: "music".to_owned(),
            fade_seconds: 1.5,
            master_volume: 1.0,
        }
    }
}

impl CrossfadeConfig {
    fn fade_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.fade_seconds.max(0.0)).unwrap_or(Duration::ZERO)
    }
}

/// Observable phase of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    /// No fade in flight.
    Idle,
    /// Fading the current track out.
    FadingOut,
    /// Fading the current track in.
    FadingIn,
}

#[derive(Debug)]
enum FadeKind {
    Out { next: Option<AudioStage> },
    In,
}

#[derive(Debug)]
struct Fade {
    ramp: Ramp,
    kind: FadeKind,
}

#[derive(Debug, Default)]
struct Channel {
    current: Option<AudioStage>,
    volume: f32,
    fade: SingleFlight<Fade>,
}

impl Channel {
    /// Id of the stage this channel is converging to.
    fn destination(&self) -> Option<&str> {
        match self.fade.active() {
            Some(Fade {
                kind: FadeKind::Out { next },
                ..
            }) => next.as_ref().map(|stage| stage.id.as_str()),
            _ => self.current.as_ref().map(|stage| stage.id.as_str()),
        }
    }

    fn phase(&self) -> ChannelPhase {
        match self.fade.active() {
            None => ChannelPhase::Idle,
            Some(Fade {
                kind: FadeKind::Out { .. },
                ..
            }) => ChannelPhase::FadingOut,
            Some(Fade {
                kind: FadeKind::In, ..
            }) => ChannelPhase::FadingIn,
        }
    }
}

#[derive(Debug)]
struct EngineState {
    master_volume: f32,
    channels: HashMap<String, Channel>,
}

/// Age-keyed background music with per-channel single-flight fades.
pub struct CrossfadeEngine {
    backend: Option<Arc<dyn AudioBackend>>,
    config: CrossfadeConfig,
    stages: StageTable,
    state: Mutex<EngineState>,
}

impl std::fmt::Debug for CrossfadeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossfadeEngine")
            .field("config", &self.config)
            .field("stages", &self.stages)
            .field("has_backend", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}

impl CrossfadeEngine {
    /// Creates an engine. Without a backend the engine still tracks channel
    /// state but produces no sound.
    #[must_use]
    pub fn new(
        backend: Option<Arc<dyn AudioBackend>>,
        config: CrossfadeConfig,
        stages: StageTable,
    ) -> Self {
        if backend.is_none() {
            info!("no audio backend available; music is disabled");
        }
        let master_volume = config.master_volume.clamp(0.0, 1.0);
        Self {
            backend,
            config,
            stages,
            state: Mutex::new(EngineState {
                master_volume,
                channels: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// First stage covering `age_years`, else the first defined stage.
    #[must_use]
    pub fn select_stage(&self, age_years: u32) -> Option<&AudioStage> {
        self.stages.select(age_years)
    }

    /// Stage for a profile: an `audio_group` naming a stage wins over the
    /// age-range lookup.
    #[must_use]
    pub fn stage_for(&self, profile: &AgeProfile) -> Option<&AudioStage> {
        if !profile.audio_group.is_empty() {
            if let Some(stage) = self.stages.by_id(&profile.audio_group) {
                return Some(stage);
            }
            debug!(group = %profile.audio_group, "audio group names no stage; selecting by age");
        }
        self.select_stage(profile.age_years)
    }

    /// Starts moving `channel` to `stage`.
    ///
    /// No-op if the channel is already playing, or heading to, the same
    /// stage. Any in-flight fade on the channel is cancelled before the new
    /// one starts.
    pub fn switch_to(&self, channel: &str, stage: &AudioStage) {
        let mut state = self.lock();
        let master = state.master_volume;
        let ch = state.channels.entry(channel.to_owned()).or_default();

        if ch.destination() == Some(stage.id.as_str()) {
            debug!(channel, stage = %stage.id, "stage already selected; skipping fade");
            return;
        }

        let duration = self.config.fade_duration();
        let fade = match &ch.current {
            None => {
                self.emit(|backend| backend.play(channel, &stage.track, 0.0));
                ch.current = Some(stage.clone());
                ch.volume = 0.0;
                Fade {
                    ramp: Ramp::new(0.0, target_volume(stage, master), duration),
                    kind: FadeKind::In,
                }
            }
            Some(current) if current.id == stage.id => Fade {
                ramp: Ramp::new(ch.volume, target_volume(stage, master), duration),
                kind: FadeKind::In,
            },
            Some(_) => Fade {
                ramp: Ramp::new(ch.volume, 0.0, duration),
                kind: FadeKind::Out {
                    next: Some(stage.clone()),
                },
            },
        };

        if ch.fade.start(fade).is_some() {
            debug!(channel, "cancelled in-flight fade");
        }
        info!(channel, stage = %stage.id, phase = ?ch.phase(), "switching music stage");
    }

    /// Fades `channel` to silence and stops it.
    pub fn stop(&self, channel: &str) {
        let mut state = self.lock();
        let Some(ch) = state.channels.get_mut(channel) else {
            return;
        };
        if ch.current.is_none() {
            return;
        }
        let fade = Fade {
            ramp: Ramp::new(ch.volume, 0.0, self.config.fade_duration()),
            kind: FadeKind::Out { next: None },
        };
        ch.fade.start(fade);
    }

    /// Sets the master volume. Idle channels are rescaled immediately;
    /// in-flight fades keep the target they started with.
    pub fn set_master_volume(&self, volume: f32) {
        let mut state = self.lock();
        state.master_volume = volume.clamp(0.0, 1.0);
        let master = state.master_volume;
        for (name, ch) in &mut state.channels {
            if ch.fade.is_active() {
                continue;
            }
            if let Some(stage) = &ch.current {
                ch.volume = target_volume(stage, master);
                let volume = ch.volume;
                self.emit(|backend| backend.set_volume(name, volume));
            }
        }
    }

    /// Phase of `channel`; unknown channels are idle.
    #[must_use]
    pub fn phase(&self, channel: &str) -> ChannelPhase {
        self.lock()
            .channels
            .get(channel)
            .map_or(ChannelPhase::Idle, Channel::phase)
    }

    /// Id of the stage whose track is currently loaded on `channel`.
    #[must_use]
    pub fn current_stage(&self, channel: &str) -> Option<String> {
        self.lock()
            .channels
            .get(channel)
            .and_then(|ch| ch.current.as_ref().map(|stage| stage.id.clone()))
    }

    /// Current volume of `channel`.
    #[must_use]
    pub fn volume(&self, channel: &str) -> f32 {
        self.lock().channels.get(channel).map_or(0.0, |ch| ch.volume)
    }

    /// Number of fades in flight on `channel`; never more than one.
    #[must_use]
    pub fn active_fades(&self, channel: &str) -> usize {
        self.lock()
            .channels
            .get(channel)
            .map_or(0, |ch| usize::from(ch.fade.is_active()))
    }

    /// Number of fades ever started on `channel`.
    #[must_use]
    pub fn fades_started(&self, channel: &str) -> u64 {
        self.lock()
            .channels
            .get(channel)
            .map_or(0, |ch| ch.fade.started())
    }

    fn emit(&self, f: impl FnOnce(&dyn AudioBackend)) {
        if let Some(backend) = &self.backend {
            f(backend.as_ref());
        }
    }

    fn advance_channel(&self, name: &str, ch: &mut Channel, master: f32, dt: Duration) {
        let Some(fade) = ch.fade.active_mut() else {
            return;
        };
        ch.volume = fade.ramp.advance(dt);
        let volume = ch.volume;
        self.emit(|backend| backend.set_volume(name, volume));
        if !fade.ramp.is_finished() {
            return;
        }

        match ch.fade.cancel().map(|fade| fade.kind) {
            Some(FadeKind::Out { next }) => {
                self.emit(|backend| backend.stop(name));
                ch.current = None;
                ch.volume = 0.0;
                if let Some(next) = next {
                    self.emit(|backend| backend.play(name, &next.track, 0.0));
                    ch.fade.start(Fade {
                        ramp: Ramp::new(
                            0.0,
                            target_volume(&next, master),
                            self.config.fade_duration(),
                        ),
                        kind: FadeKind::In,
                    });
                    debug!(channel = name, stage = %next.id, "track swapped; fading in");
                    ch.current = Some(next);
                }
            }
            Some(FadeKind::In) => {
                debug!(channel = name, "fade in complete");
            }
            None => {}
        }
    }
}

fn target_volume(stage: &AudioStage, master: f32) -> f32 {
    (stage.volume * master).clamp(0.0, 1.0)
}

impl Tick for CrossfadeEngine {
    fn tick(&self, dt: Duration) {
        let mut state = self.lock();
        let master = state.master_volume;
        for (name, ch) in &mut state.channels {
            self.advance_channel(name, ch, master, dt);
        }
    }
}

impl CapabilityListener for CrossfadeEngine {
    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        let Some(stage) = self.stage_for(change.profile) else {
            debug!("no audio stages configured");
            return;
        };
        self.switch_to(&self.config.channel, stage);
    }
}
