//! Frame timing.
//!
//! [`FrameClock`] is ticked once per presented frame. It exposes two views of the
//! elapsed time: the raw wall-clock delta, and a scaled delta that game logic
//! should use so the whole simulation can be sped up or slowed down with one knob.

use std::time::{Duration, Instant};

/// Longest delta a single tick may report.
const MAX_DELTA: Duration = Duration::from_millis(250);

/// Per-frame delta time with a user-controlled multiplier.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    delta: f32,
    multiplier: f32,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            delta: 0.0,
            multiplier: 1.0,
            frame_index: 0,
        }
    }

    /// Resets the baseline, e.g. after the window was suspended.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Measures the time since the previous tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(elapsed);
    }

    /// Records `elapsed` as the latest frame delta.
    ///
    /// Stalls longer than 250 ms (debugger pauses, minimised windows) are clamped.
    pub fn advance(&mut self, elapsed: Duration) {
        self.delta = elapsed.min(MAX_DELTA).as_secs_f32();
        self.frame_index = self.frame_index.wrapping_add(1);
    }

    /// Scaled delta in seconds: the raw delta times the multiplier.
    pub fn delta_time(&self) -> f32 {
        self.delta * self.multiplier
    }

    /// Raw delta in seconds, ignoring the multiplier.
    pub fn unscaled_delta_time(&self) -> f32 {
        self.delta
    }

    pub fn delta_time_multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn set_delta_time_multiplier(&mut self, multiplier: f32) {
        self.multiplier = multiplier;
    }

    /// Frames per second derived from the raw delta, or 0 before the first measured frame.
    pub fn fps(&self) -> f32 {
        if self.delta > 0.0 { 1.0 / self.delta } else { 0.0 }
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
