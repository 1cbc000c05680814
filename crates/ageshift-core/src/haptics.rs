//! Haptic device port.

/// A rumble-capable input device.
pub trait HapticDevice: Send + Sync {
    /// Whether the device is currently connected and able to rumble.
    fn is_connected(&self) -> bool;

    /// Sets low- and high-frequency motor speeds, each in `[0, 1]`.
    fn set_motor_speeds(&self, low: f32, high: f32);
}
