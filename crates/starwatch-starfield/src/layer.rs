//! Particle layer generation.

use glam::Vec3;
use rand::Rng;
use starwatch_config::{LayerConfig, TwinkleStrategy};
use starwatch_render::{PointInstance, PointLayerDesc, unpack_rgb};

/// One point of a particle layer. Every field is fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarPoint {
    pub position: Vec3,
    /// Uniform in [0.5, 1.0).
    pub base_opacity: f32,
    /// Radians per second.
    pub twinkle_speed: f32,
    /// Uniform in [0, 2π).
    pub phase_offset: f32,
}

impl StarPoint {
    pub fn to_instance(&self) -> PointInstance {
        PointInstance {
            position: self.position.to_array(),
            base_opacity: self.base_opacity,
            twinkle_speed: self.twinkle_speed,
            phase_offset: self.phase_offset,
        }
    }
}

/// A fixed-size set of points sharing color, size and spread.
///
/// The point list never grows or shrinks after [`ParticleLayer::generate`].
#[derive(Clone, Debug)]
pub struct ParticleLayer {
    name: String,
    color: [f32; 3],
    point_size: f32,
    spread: f32,
    amplitude: f32,
    strategy: TwinkleStrategy,
    points: Vec<StarPoint>,
}

impl ParticleLayer {
    /// Scatter `config.count` points uniformly through a cube of side
    /// `config.spread` centered on the origin.
    pub fn generate<R: Rng + ?Sized>(config: &LayerConfig, rng: &mut R) -> Self {
        let (speed_min, speed_max) = if config.twinkle_speed_min <= config.twinkle_speed_max {
            (config.twinkle_speed_min, config.twinkle_speed_max)
        } else {
            (config.twinkle_speed_max, config.twinkle_speed_min)
        };
        let spread = config.spread;

        let points = (0..config.count)
            .map(|_| {
                let position = Vec3::new(
                    (rng.random::<f32>() - 0.5) * spread,
                    (rng.random::<f32>() - 0.5) * spread,
                    (rng.random::<f32>() - 0.5) * spread,
                );
                StarPoint {
                    position,
                    base_opacity: rng.random::<f32>() * 0.5 + 0.5,
                    twinkle_speed: rng.random::<f32>() * (speed_max - speed_min) + speed_min,
                    phase_offset: rng.random::<f32>() * std::f32::consts::TAU,
                }
            })
            .collect();

        Self {
            name: config.name.clone(),
            color: unpack_rgb(config.color),
            point_size: config.point_size,
            spread,
            amplitude: config.amplitude,
            strategy: config.twinkle,
            points,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn spread(&self) -> f32 {
        self.spread
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn strategy(&self) -> TwinkleStrategy {
        self.strategy
    }

    pub fn points(&self) -> &[StarPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// GPU instance data, one entry per point in point order.
    pub fn instances(&self) -> Vec<PointInstance> {
        self.points.iter().map(StarPoint::to_instance).collect()
    }

    /// Upload descriptor borrowing `instances`.
    pub fn desc<'a>(&'a self, instances: &'a [PointInstance]) -> PointLayerDesc<'a> {
        PointLayerDesc {
            label: &self.name,
            color: self.color,
            point_size: self.point_size,
            points: instances,
        }
    }
}
