//! Haptic feedback service.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ageshift_core::haptics::HapticDevice;
use ageshift_core::listener::{AgeChanged, CapabilityListener, Tick};
use ageshift_core::timer::SingleFlight;
use serde::Deserialize;
use tracing::debug;

/// One step of a rumble pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticSegment {
    /// Low-frequency motor intensity before scaling.
    pub low: f32,
    /// High-frequency motor intensity before scaling.
    pub high: f32,
    /// How long the step lasts.
    pub duration: Duration,
}

impl HapticSegment {
    /// Creates a segment.
    #[must_use]
    pub fn new(low: f32, high: f32, duration: Duration) -> Self {
        Self {
            low,
            high,
            duration,
        }
    }
}

/// Pulse played when the character changes age.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AgeChangePulse {
    /// Low-frequency intensity.
    pub low: f32,
    /// High-frequency intensity.
    pub high: f32,
    /// Pulse length in milliseconds.
    pub millis: u64,
}

/// Haptic settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    /// Master switch for the current run. Defaults to `true`.
    pub enabled: bool,
    /// Global multiplier on every intensity. Defaults to `1.0`.
    pub intensity: f32,
    /// Pulse for age changes; `None` disables it.
    pub age_change_pulse: Option<AgeChangePulse>,
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.0,
            age_change_pulse: Some(AgeChangePulse {
                low: 0.4,
                high: 0.7,
                millis: 250,
            }),
        }
    }
}

#[derive(Debug)]
struct ActivePattern {
    segments: Vec<HapticSegment>,
    index: usize,
    elapsed: Duration,
}

#[derive(Debug)]
struct HapticState {
    enabled: bool,
    active: SingleFlight<ActivePattern>,
}

/// Rumble playback with one authoritative pattern at a time.
pub struct HapticService {
    device: Option<Arc<dyn HapticDevice>>,
    config: HapticConfig,
    state: Mutex<HapticState>,
}

impl std::fmt::Debug for HapticService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapticService")
            .field("config", &self.config)
            .field("has_device", &self.device.is_some())
            .finish_non_exhaustive()
    }
}

impl HapticService {
    /// Creates a service. Without a device every request is a no-op.
    #[must_use]
    pub fn new(device: Option<Arc<dyn HapticDevice>>, config: HapticConfig) -> Self {
        let enabled = config.enabled;
        Self {
            device,
            config,
            state: Mutex::new(HapticState {
                enabled,
                active: SingleFlight::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HapticState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available_device(&self, state: &HapticState) -> Option<&dyn HapticDevice> {
        if !state.enabled {
            return None;
        }
        self.device
            .as_deref()
            .filter(|device| device.is_connected())
    }

    /// Whether rumble can currently be produced.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available_device(&self.lock()).is_some()
    }

    /// Whether a pulse or pattern is playing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().active.is_active()
    }

    fn scale(&self, intensity: f32) -> f32 {
        let scaled = intensity * self.config.intensity;
        if scaled.is_nan() {
            0.0
        } else {
            scaled.clamp(0.0, 1.0)
        }
    }

    fn write(&self, device: &dyn HapticDevice, segment: &HapticSegment) {
        device.set_motor_speeds(self.scale(segment.low), self.scale(segment.high));
    }

    /// Plays a single pulse. Returns whether playback started.
    pub fn pulse(&self, low: f32, high: f32, duration: Duration) -> bool {
        self.pattern(&[HapticSegment::new(low, high, duration)])
    }

    /// Plays `segments` in order, pre-empting anything already playing.
    /// Returns whether playback started.
    pub fn pattern(&self, segments: &[HapticSegment]) -> bool {
        let mut state = self.lock();
        let Some(device) = self.available_device(&state) else {
            debug!("haptics unavailable; ignoring request");
            return false;
        };
        let Some(first) = segments.first() else {
            if state.active.cancel().is_some() {
                device.set_motor_speeds(0.0, 0.0);
            }
            return false;
        };

        self.write(device, first);
        let preempted = state.active.start(ActivePattern {
            segments: segments.to_vec(),
            index: 0,
            elapsed: Duration::ZERO,
        });
        if preempted.is_some() {
            debug!("haptic pattern pre-empted");
        }
        true
    }

    /// Stops playback and silences the motors.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.active.cancel().is_some() {
            if let Some(device) = &self.device {
                device.set_motor_speeds(0.0, 0.0);
            }
        }
    }

    /// Turns haptics on or off for the current run. Turning them off stops
    /// any playback.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
        if !enabled {
            self.stop();
        }
    }
}

impl Tick for HapticService {
    fn tick(&self, dt: Duration) {
        let mut state = self.lock();
        if !state.active.is_active() {
            return;
        }
        let Some(device) = self.available_device(&state) else {
            debug!("haptic device lost; dropping pattern");
            state.active.cancel();
            return;
        };
        let Some(pattern) = state.active.active_mut() else {
            return;
        };

        pattern.elapsed += dt;
        let mut advanced = false;
        while let Some(segment) = pattern.segments.get(pattern.index) {
            if pattern.elapsed < segment.duration {
                break;
            }
            pattern.elapsed -= segment.duration;
            pattern.index += 1;
            advanced = true;
        }

        match pattern.segments.get(pattern.index) {
            Some(segment) if advanced => self.write(device, segment),
            Some(_) => {}
            None => {
                state.active.cancel();
                device.set_motor_speeds(0.0, 0.0);
            }
        }
    }
}

impl CapabilityListener for HapticService {
    fn on_age_changed(&self, change: &AgeChanged<'_>) {
        if !change.is_new_age() {
            return;
        }
        if let Some(pulse) = self.config.age_change_pulse {
            self.pulse(pulse.low, pulse.high, Duration::from_millis(pulse.millis));
        }
    }
}
