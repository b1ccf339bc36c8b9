//! Wall-clock time source for the animation loop.
//!
//! Converts `Instant` readings into seconds since mount. Long stalls (window
//! dragged, debugger attached) are clamped so the starfield never jumps ahead
//! by more than [`MAX_FRAME_TIME`] in a single frame.

use std::time::Instant;
use tracing::warn;

/// Largest step a single frame may advance the clock, in seconds.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct FrameClock {
    previous_time: Instant,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Measure the time since the previous tick and return the new total.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance_by(frame_time)
    }

    /// Advance by an explicit frame time. Negative steps are ignored.
    pub fn advance_by(&mut self, frame_time: f64) -> f64 {
        let mut step = frame_time.max(0.0);
        if step > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                step * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            step = MAX_FRAME_TIME;
        }
        self.elapsed += step;
        self.frame_count += 1;
        self.elapsed
    }

    /// Seconds since the clock was created, as of the last tick.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let clock = FrameClock::new();
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.frame_count(), 0);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut clock = FrameClock::new();
        clock.advance_by(1.0 / 60.0);
        let t = clock.advance_by(1.0 / 60.0);
        assert!((t - 2.0 / 60.0).abs() < 1e-12);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn test_large_step_is_clamped() {
        let mut clock = FrameClock::new();
        let t = clock.advance_by(5.0);
        assert!((t - MAX_FRAME_TIME).abs() < 1e-12);
    }

    #[test]
    fn test_negative_step_is_ignored() {
        let mut clock = FrameClock::new();
        clock.advance_by(0.1);
        let t = clock.advance_by(-1.0);
        assert!((t - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_tick_is_monotonic() {
        let mut clock = FrameClock::new();
        let mut last = 0.0;
        for _ in 0..10 {
            let t = clock.tick();
            assert!(t >= last);
            last = t;
        }
        assert_eq!(clock.frame_count(), 10);
    }
}
