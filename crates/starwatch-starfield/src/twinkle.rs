//! Twinkle animation.
//!
//! `opacity(t) = base_opacity + sin(t * twinkle_speed + phase_offset) * amplitude`,
//! left unclamped. The GPU clamps when blending.

use starwatch_config::TwinkleStrategy;
use starwatch_render::LayerOpacity;

use crate::layer::{ParticleLayer, StarPoint};

/// Opacity of one point at time `t` seconds.
pub fn point_opacity(t: f64, point: &StarPoint, amplitude: f32) -> f32 {
    let angle = t * point.twinkle_speed as f64 + point.phase_offset as f64;
    (point.base_opacity as f64 + angle.sin() * amplitude as f64) as f32
}

/// Opacity of every point in the layer, in point order.
pub fn layer_opacities(t: f64, layer: &ParticleLayer) -> Vec<f32> {
    layer
        .points()
        .iter()
        .map(|point| point_opacity(t, point, layer.amplitude()))
        .collect()
}

/// Arithmetic mean of the per-point opacities. An empty layer yields 0.
pub fn averaged_opacity(t: f64, layer: &ParticleLayer) -> f32 {
    if layer.is_empty() {
        return 0.0;
    }
    let sum: f64 = layer
        .points()
        .iter()
        .map(|point| point_opacity(t, point, layer.amplitude()) as f64)
        .sum();
    (sum / layer.len() as f64) as f32
}

/// What the surface needs to shade the layer at time `t`.
pub fn layer_opacity(t: f64, layer: &ParticleLayer) -> LayerOpacity {
    match layer.strategy() {
        TwinkleStrategy::Shader => LayerOpacity::PerPoint {
            time: t as f32,
            amplitude: layer.amplitude(),
        },
        TwinkleStrategy::HostAveraged => LayerOpacity::Shared(averaged_opacity(t, layer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use starwatch_config::LayerConfig;

    fn point(base_opacity: f32, twinkle_speed: f32, phase_offset: f32) -> StarPoint {
        StarPoint {
            position: Vec3::ZERO,
            base_opacity,
            twinkle_speed,
            phase_offset,
        }
    }

    fn layer(config: LayerConfig) -> ParticleLayer {
        ParticleLayer::generate(&config, &mut ChaCha8Rng::seed_from_u64(11))
    }

    #[test]
    fn test_point_opacity_formula() {
        let p = point(0.75, 2.0, 0.5);
        let expected = 0.75 + (3.0f64 * 2.0 + 0.5).sin() * 0.2;
        assert!((point_opacity(3.0, &p, 0.2) as f64 - expected).abs() < 1e-6);
    }

    #[test]
    fn test_point_opacity_at_zero_time_uses_phase() {
        let p = point(0.5, 1.0, std::f32::consts::FRAC_PI_2);
        assert!((point_opacity(0.0, &p, 0.1) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_opacity_is_not_clamped() {
        let p = point(0.99, 1.0, std::f32::consts::FRAC_PI_2);
        assert!(point_opacity(0.0, &p, 0.5) > 1.0);
        let p = point(0.5, 1.0, -std::f32::consts::FRAC_PI_2);
        assert!(point_opacity(0.0, &p, 0.8) < 0.0);
    }

    #[test]
    fn test_twinkle_is_pure() {
        let generated = layer(LayerConfig::large());
        assert_eq!(layer_opacities(12.5, &generated), layer_opacities(12.5, &generated));
        assert_eq!(averaged_opacity(12.5, &generated), averaged_opacity(12.5, &generated));
    }

    #[test]
    fn test_average_matches_mean_of_points() {
        let generated = layer(LayerConfig {
            count: 10,
            ..LayerConfig::medium()
        });
        let values = layer_opacities(4.0, &generated);
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        assert!((averaged_opacity(4.0, &generated) - mean).abs() < 1e-5);
    }

    #[test]
    fn test_empty_layer_average_is_zero() {
        let generated = layer(LayerConfig {
            count: 0,
            ..LayerConfig::small()
        });
        assert_eq!(averaged_opacity(1.0, &generated), 0.0);
        assert!(layer_opacities(1.0, &generated).is_empty());
    }

    #[test]
    fn test_strategy_selects_opacity_mode() {
        let shader = layer(LayerConfig::small());
        assert_eq!(
            layer_opacity(2.0, &shader),
            LayerOpacity::PerPoint {
                time: 2.0,
                amplitude: 0.05
            }
        );

        let host = layer(LayerConfig {
            twinkle: TwinkleStrategy::HostAveraged,
            ..LayerConfig::small()
        });
        assert_eq!(
            layer_opacity(2.0, &host),
            LayerOpacity::Shared(averaged_opacity(2.0, &host))
        );
    }
}
