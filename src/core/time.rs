//! Frame timing

use std::time::Instant;

/// Tracks frame delta time and total elapsed time.
pub struct Time {
    /// When the clock was started
    start: Instant,
    /// When the last frame began
    last_frame: Instant,
    /// Delta of the most recent frame, in seconds
    delta: f32,
}

impl Time {
    /// Create a new clock; delta is zero until the first `update`
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta: 0.0,
        }
    }

    /// Advance to the next frame, measuring the delta since the last call
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
    }

    /// Delta time of the current frame, in seconds
    #[must_use]
    #[inline]
    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    /// Total time since the clock was created, in seconds
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
