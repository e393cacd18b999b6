//! Scheduled parameter ramps.
//!
//! A `Ramp` starts at `start` when the voice is triggered and, if it has a
//! target, moves exponentially to `target` over `duration` seconds, then holds
//! the target until the voice is stopped.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub start: f32,
    pub target: f32,
    pub duration: f32, // seconds, 0.0 = constant
}

impl Ramp {
    pub fn constant(value: f32) -> Self {
        Ramp { start: value, target: value, duration: 0.0 }
    }

    /// Both endpoints must be non-zero and share a sign.
    pub fn exponential(start: f32, target: f32, duration: f32) -> Self {
        Ramp { start, target, duration: duration.max(0.0) }
    }

    pub fn is_constant(&self) -> bool {
        self.duration <= 0.0 || self.start == self.target
    }

    /// Value at `elapsed` seconds after the trigger instant.
    pub fn value_at(&self, elapsed: f32) -> f32 {
        if self.is_constant() || elapsed <= 0.0 {
            return self.start;
        }
        if elapsed >= self.duration {
            return self.target;
        }
        self.start * (self.target / self.start).powf(elapsed / self.duration)
    }
}
