//! Audio output port.

/// A playback backend with independently controlled channels.
///
/// Only the crossfade engine writes to a channel's track or volume.
pub trait AudioBackend: Send + Sync {
    /// Starts looping `track` on `channel` at `volume`, replacing anything
    /// that was playing there.
    fn play(&self, channel: &str, track: &str, volume: f32);

    /// Stops playback on `channel`.
    fn stop(&self, channel: &str);

    /// Sets the volume of `channel`.
    fn set_volume(&self, channel: &str, volume: f32);
}
