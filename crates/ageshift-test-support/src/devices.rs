//! Test devices: recording audio, haptic, director and dialogue fakes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use ageshift_core::audio::AudioBackend;
use ageshift_core::director::{CutsceneCue, CutsceneDirector};
use ageshift_core::haptics::HapticDevice;
use ageshift_core::integration::DialogueVariables;

/// One call observed by a `RecordingAudioBackend`.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    /// A track was started.
    Play {
        /// Channel name.
        channel: String,
        /// Track reference.
        track: String,
        /// Starting volume.
        volume: f32,
    },
    /// A channel was stopped.
    Stop {
        /// Channel name.
        channel: String,
    },
    /// A channel volume was set.
    Volume {
        /// Channel name.
        channel: String,
        /// New volume.
        volume: f32,
    },
}

/// An audio backend that records every call.
#[derive(Debug, Default)]
pub struct RecordingAudioBackend {
    calls: Mutex<Vec<AudioCall>>,
}

impl RecordingAudioBackend {
    /// Create a backend with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every recorded call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Tracks started on `channel`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn played_tracks(&self, channel: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                AudioCall::Play { channel: c, track, .. } if c == channel => Some(track.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent volume written to `channel` by `play` or `set_volume`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn last_volume(&self, channel: &str) -> Option<f32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|call| match call {
                AudioCall::Play { channel: c, volume, .. }
                | AudioCall::Volume { channel: c, volume } if c == channel => Some(*volume),
                _ => None,
            })
    }
}

impl AudioBackend for RecordingAudioBackend {
    fn play(&self, channel: &str, track: &str, volume: f32) {
        self.calls.lock().unwrap().push(AudioCall::Play {
            channel: channel.to_owned(),
            track: track.to_owned(),
            volume,
        });
    }

    fn stop(&self, channel: &str) {
        self.calls.lock().unwrap().push(AudioCall::Stop {
            channel: channel.to_owned(),
        });
    }

    fn set_volume(&self, channel: &str, volume: f32) {
        self.calls.lock().unwrap().push(AudioCall::Volume {
            channel: channel.to_owned(),
            volume,
        });
    }
}

/// A haptic device that records every motor speed written to it.
#[derive(Debug)]
pub struct RecordingHapticDevice {
    connected: AtomicBool,
    speeds: Mutex<Vec<(f32, f32)>>,
}

impl Default for RecordingHapticDevice {
    fn default() -> Self {
        Self {
            connected: AtomicBool::new(true),
            speeds: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingHapticDevice {
    /// Create a connected device.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that reports itself as disconnected.
    #[must_use]
    pub fn disconnected() -> Self {
        let device = Self::default();
        device.set_connected(false);
        device
    }

    /// Changes the reported connection state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Every `(low, high)` pair written, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn speeds(&self) -> Vec<(f32, f32)> {
        self.speeds.lock().unwrap().clone()
    }

    /// The most recent `(low, high)` pair written.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn last_speeds(&self) -> Option<(f32, f32)> {
        self.speeds.lock().unwrap().last().copied()
    }
}

impl HapticDevice for RecordingHapticDevice {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_motor_speeds(&self, low: f32, high: f32) {
        self.speeds.lock().unwrap().push((low, high));
    }
}

/// A cutscene director that records every cue.
#[derive(Debug, Default)]
pub struct RecordingDirector {
    cues: Mutex<Vec<CutsceneCue>>,
}

impl RecordingDirector {
    /// Create a director with no recorded cues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every cue received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn cues(&self) -> Vec<CutsceneCue> {
        self.cues.lock().unwrap().clone()
    }
}

impl CutsceneDirector for RecordingDirector {
    fn play(&self, cue: CutsceneCue) {
        self.cues.lock().unwrap().push(cue);
    }
}

/// A dialogue integration that stores variables in a map.
#[derive(Debug, Default)]
pub struct RecordingDialogue {
    values: Mutex<HashMap<String, f64>>,
}

impl RecordingDialogue {
    /// Create an integration with no variables set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name`, if set.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.lock().unwrap().get(name).copied()
    }
}

impl DialogueVariables for RecordingDialogue {
    fn set_number(&self, name: &str, value: f64) {
        self.values.lock().unwrap().insert(name.to_owned(), value);
    }
}
