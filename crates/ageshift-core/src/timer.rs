//! Timer primitives for the cooperative tick loop.
//!
//! Fades and haptic patterns are expressed as explicit values advanced by
//! `dt` rather than as detached tasks, so cancelling one is just replacing
//! or taking the value.

use std::time::Duration;

/// A linear ramp between two values over a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Ramp {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
}

impl Ramp {
    /// Creates a ramp from `from` to `to`. A zero duration finishes on the
    /// first advance.
    #[must_use]
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Current value of the ramp.
    #[must_use]
    pub fn value(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * t
    }

    /// Target value of the ramp.
    #[must_use]
    pub fn target(&self) -> f32 {
        self.to
    }

    /// Advances the ramp and returns the new value.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    /// Whether the ramp has reached its target.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Holds at most one in-flight task.
///
/// Starting a task cancels and returns whatever was running before, which
/// makes the slot the single authoritative writer for whatever it drives.
#[derive(Debug)]
pub struct SingleFlight<T> {
    active: Option<T>,
    started: u64,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            active: None,
            started: 0,
        }
    }
}

impl<T> SingleFlight<T> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `task`, returning the task it pre-empted, if any.
    pub fn start(&mut self, task: T) -> Option<T> {
        self.started += 1;
        self.active.replace(task)
    }

    /// Cancels the active task, returning it.
    pub fn cancel(&mut self) -> Option<T> {
        self.active.take()
    }

    /// The active task, if any.
    #[must_use]
    pub fn active(&self) -> Option<&T> {
        self.active.as_ref()
    }

    /// Mutable access to the active task, if any.
    pub fn active_mut(&mut self) -> Option<&mut T> {
        self.active.as_mut()
    }

    /// Whether a task is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of tasks started over the lifetime of the slot.
    #[must_use]
    pub fn started(&self) -> u64 {
        self.started
    }
}
