//! Shooting stars and the timer that spawns them.

use glam::Vec3;
use rand::Rng;

/// Depth all shooting stars are placed at.
pub const SHOOTING_STAR_DEPTH: f32 = -500.0;
/// Shooting stars are drawn white.
pub const SHOOTING_STAR_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Sample uniformly from `[min, max)`.
pub(crate) fn sample_range<R: Rng + ?Sized>(rng: &mut R, (min, max): (f64, f64)) -> f64 {
    min + rng.random::<f64>() * (max - min)
}

/// A short-lived streak travelling down and to the left.
#[derive(Clone, Debug, PartialEq)]
pub struct ShootingStar {
    start: Vec3,
    end: Vec3,
    elapsed: f64,
    max_lifetime: f64,
}

impl ShootingStar {
    pub fn new(start: Vec3, end: Vec3, max_lifetime: f64) -> Self {
        Self {
            start,
            end,
            elapsed: 0.0,
            max_lifetime,
        }
    }

    /// Random streak with a lifetime drawn from `lifetime`.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, lifetime: (f64, f64)) -> Self {
        let x1 = (rng.random::<f32>() - 0.5) * 800.0;
        let y1 = rng.random::<f32>() * 400.0;
        let x2 = x1 - rng.random::<f32>() * 200.0 - 100.0;
        let y2 = y1 - rng.random::<f32>() * 200.0 - 100.0;
        let max_lifetime = sample_range(rng, lifetime);

        Self::new(
            Vec3::new(x1, y1, SHOOTING_STAR_DEPTH),
            Vec3::new(x2, y2, SHOOTING_STAR_DEPTH),
            max_lifetime,
        )
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn max_lifetime(&self) -> f64 {
        self.max_lifetime
    }

    /// Age the star by `dt` seconds. Elapsed never exceeds the maximum.
    pub fn advance(&mut self, dt: f64) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.max_lifetime);
    }

    /// `1 - elapsed / max`.
    pub fn opacity(&self) -> f32 {
        (1.0 - self.elapsed / self.max_lifetime) as f32
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.max_lifetime
    }
}

/// Countdown to the next shooting star.
#[derive(Clone, Debug)]
pub struct SpawnTimer {
    remaining: f64,
    interval: (f64, f64),
}

impl SpawnTimer {
    /// Start the countdown at a fresh interval.
    pub fn new<R: Rng + ?Sized>(rng: &mut R, interval: (f64, f64)) -> Self {
        Self {
            remaining: sample_range(rng, interval),
            interval,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Count down by `dt`. Returns `true` and re-arms when the timer runs out.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, dt: f64) -> bool {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = sample_range(rng, self.interval);
            true
        } else {
            false
        }
    }
}

/// Spawn timer plus the lifetime range and optional cap on active stars.
#[derive(Clone, Debug)]
pub struct ShootingStarSpawner {
    timer: SpawnTimer,
    lifetime: (f64, f64),
    max_active: Option<usize>,
}

impl ShootingStarSpawner {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        interval: (f64, f64),
        lifetime: (f64, f64),
        max_active: Option<usize>,
    ) -> Self {
        Self {
            timer: SpawnTimer::new(rng, interval),
            lifetime,
            max_active,
        }
    }

    pub fn timer(&self) -> &SpawnTimer {
        &self.timer
    }

    /// Advance the timer; returns a new star when one is due.
    ///
    /// When the cap is reached the timer still re-arms and the spawn is dropped.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        dt: f64,
        active: usize,
    ) -> Option<ShootingStar> {
        if !self.timer.tick(rng, dt) {
            return None;
        }
        if let Some(max) = self.max_active
            && active >= max
        {
            tracing::debug!(active, max, "Shooting star cap reached, skipping spawn");
            return None;
        }
        Some(ShootingStar::spawn(rng, self.lifetime))
    }
}
