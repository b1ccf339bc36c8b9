//! Scene state and the per-frame update.

use glam::{EulerRot, Mat4, Vec2};
use rand_chacha::ChaCha8Rng;
use starwatch_config::StarfieldConfig;
use starwatch_render::{
    Camera, FrameDesc, LayerDraw, LayerHandle, LayerOpacity, LineDesc, LineDraw, LineHandle,
    RenderSurface, SurfaceSize,
};
use tracing::{debug, trace, warn};

use crate::error::StarfieldError;
use crate::layer::ParticleLayer;
use crate::lifecycle::ReleaseReport;
use crate::shooting_star::{SHOOTING_STAR_COLOR, ShootingStar, ShootingStarSpawner};
use crate::twinkle;

/// A particle layer and the surface resources backing it.
#[derive(Clone, Debug)]
pub struct SceneLayer {
    pub layer: ParticleLayer,
    pub handle: LayerHandle,
    /// Opacity mode computed by the most recent frame.
    pub opacity: LayerOpacity,
}

impl SceneLayer {
    pub fn new(layer: ParticleLayer, handle: LayerHandle) -> Self {
        let opacity = twinkle::layer_opacity(0.0, &layer);
        Self {
            layer,
            handle,
            opacity,
        }
    }
}

/// A shooting star tracked by the scene, with its line on the surface.
#[derive(Clone, Debug)]
pub struct ActiveStar {
    pub star: ShootingStar,
    pub line: LineHandle,
    spawned_frame: u64,
}

/// Everything the frame driver mutates.
#[derive(Clone, Debug)]
pub struct SceneState {
    pub layers: Vec<SceneLayer>,
    pub stars: Vec<ActiveStar>,
    pub camera: Camera,
    /// Accumulated layer rotation about X and Y, radians.
    pub rotation: Vec2,
    /// While set, the layer rotation does not advance.
    pub dragging: bool,
}

impl SceneState {
    /// Model transform shared by every particle layer. Shooting stars are not rotated.
    pub fn layer_model(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0)
    }
}

/// Summary of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub layers: usize,
    pub active_stars: usize,
    pub spawned: bool,
    pub expired: usize,
}

/// Advances the scene one frame at a time and renders it.
pub struct FrameDriver<S: RenderSurface> {
    surface: Option<S>,
    scene: SceneState,
    rng: ChaCha8Rng,
    spawner: ShootingStarSpawner,
    rotation_step: Vec2,
    last_time: f64,
    frame: u64,
}

impl<S: RenderSurface> FrameDriver<S> {
    /// Build a driver over already-uploaded layers. The spawn timer is armed here.
    pub fn new(
        surface: S,
        layers: Vec<SceneLayer>,
        mut rng: ChaCha8Rng,
        config: &StarfieldConfig,
    ) -> Self {
        let camera = Camera::starfield(surface.size());
        let spawner = ShootingStarSpawner::new(
            &mut rng,
            config.spawn_interval,
            config.shooting_star_lifetime,
            config.max_active_shooting_stars,
        );
        Self {
            surface: Some(surface),
            scene: SceneState {
                layers,
                stars: Vec::new(),
                camera,
                rotation: Vec2::ZERO,
                dragging: false,
            },
            rng,
            spawner,
            rotation_step: Vec2::new(config.rotation_step_x, config.rotation_step_y),
            last_time: 0.0,
            frame: 0,
        }
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Seconds until the next shooting star.
    pub fn spawn_timer_remaining(&self) -> f64 {
        self.spawner.timer().remaining()
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.scene.dragging = dragging;
    }

    /// Recompute the camera aspect and resize the surface.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        self.scene
            .camera
            .set_aspect_ratio(size.width as f32, size.height as f32);
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(size);
        }
        debug!(width = size.width, height = size.height, "Starfield resized");
    }

    /// Run one frame at time `t` seconds since mount.
    ///
    /// Order: rotation, twinkle, spawn, advance and cull, render. A star
    /// spawned this frame is drawn at elapsed 0; a star whose elapsed time
    /// reaches its maximum is removed before drawing.
    pub fn on_frame(&mut self, t: f64) -> Result<FrameStats, StarfieldError> {
        let Some(surface) = self.surface.as_mut() else {
            return Err(StarfieldError::Detached);
        };

        let dt = (t - self.last_time).max(0.0);
        self.last_time = self.last_time.max(t);
        let frame = self.frame;
        self.frame += 1;
        let mut stats = FrameStats {
            frame,
            ..Default::default()
        };

        if !self.scene.dragging {
            self.scene.rotation += self.rotation_step;
        }

        for layer in &mut self.scene.layers {
            layer.opacity = twinkle::layer_opacity(t, &layer.layer);
        }

        if let Some(star) = self
            .spawner
            .update(&mut self.rng, dt, self.scene.stars.len())
        {
            let line = surface.add_line(&LineDesc {
                start: star.start(),
                end: star.end(),
                color: SHOOTING_STAR_COLOR,
            })?;
            debug!(
                lifetime = star.max_lifetime(),
                next_in = self.spawner.timer().remaining(),
                "Shooting star spawned"
            );
            self.scene.stars.push(ActiveStar {
                star,
                line,
                spawned_frame: frame,
            });
            stats.spawned = true;
        }

        let mut index = 0;
        while index < self.scene.stars.len() {
            let active = &mut self.scene.stars[index];
            if active.spawned_frame != frame {
                active.star.advance(dt);
            }
            if !active.star.is_expired() {
                index += 1;
                continue;
            }
            // Stays tracked until the surface lets go of the line.
            match surface.remove_line(active.line) {
                Ok(()) => {
                    self.scene.stars.remove(index);
                    stats.expired += 1;
                }
                Err(e) => {
                    warn!("Failed to remove expired shooting star, retrying next frame: {e}");
                    index += 1;
                }
            }
        }

        let model = self.scene.layer_model();
        let layer_draws: Vec<LayerDraw> = self
            .scene
            .layers
            .iter()
            .map(|layer| LayerDraw {
                handle: layer.handle,
                model,
                opacity: layer.opacity,
            })
            .collect();
        let line_draws: Vec<LineDraw> = self
            .scene
            .stars
            .iter()
            .filter(|active| !active.star.is_expired())
            .map(|active| LineDraw {
                handle: active.line,
                opacity: active.star.opacity(),
            })
            .collect();

        surface.render(&FrameDesc {
            view_proj: self.scene.camera.view_projection_matrix(),
            layers: &layer_draws,
            lines: &line_draws,
        })?;

        stats.layers = layer_draws.len();
        stats.active_stars = line_draws.len();
        trace!(frame, t, stars = stats.active_stars, "Frame rendered");
        Ok(stats)
    }

    /// Release every line and layer and hand the surface back for detaching.
    ///
    /// Failures are logged and the remaining resources are still released.
    pub(crate) fn teardown(&mut self) -> Option<(S, ReleaseReport)> {
        let mut surface = self.surface.take()?;
        let mut report = ReleaseReport::default();

        for active in self.scene.stars.drain(..) {
            match surface.remove_line(active.line) {
                Ok(()) => report.lines_removed += 1,
                Err(e) => warn!("Failed to remove shooting star line: {e}"),
            }
        }
        for layer in self.scene.layers.drain(..) {
            match surface.release_layer(layer.handle) {
                Ok(()) => report.layers_released += 1,
                Err(e) => warn!("Failed to release layer '{}': {e}", layer.layer.name()),
            }
        }

        Some((surface, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSurface, upload_layers};
    use rand::SeedableRng;
    use starwatch_config::TwinkleStrategy;

    fn driver(config: &StarfieldConfig) -> FrameDriver<RecordingSurface> {
        let mut surface = RecordingSurface::new(SurfaceSize::new(800, 600));
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let layers = upload_layers(&mut surface, config, &mut rng);
        FrameDriver::new(surface, layers, rng, config)
    }

    #[test]
    fn test_rotation_advances_per_frame() {
        let mut driver = driver(&StarfieldConfig::default());
        driver.on_frame(0.0).unwrap();
        driver.on_frame(0.016).unwrap();
        let rotation = driver.scene().rotation;
        assert!((rotation.x - 0.0002).abs() < 1e-7);
        assert!((rotation.y - 0.0004).abs() < 1e-7);
    }

    #[test]
    fn test_dragging_suspends_rotation() {
        let mut driver = driver(&StarfieldConfig::default());
        driver.set_dragging(true);
        driver.on_frame(0.0).unwrap();
        driver.on_frame(0.5).unwrap();
        assert_eq!(driver.scene().rotation, Vec2::ZERO);

        driver.set_dragging(false);
        driver.on_frame(1.0).unwrap();
        assert!(driver.scene().rotation.y > 0.0);
    }

    #[test]
    fn test_every_layer_drawn_with_shared_model() {
        let mut driver = driver(&StarfieldConfig::default());
        driver.on_frame(0.0).unwrap();
        let log = driver.surface().unwrap().log();
        let frame = log.borrow().frames.last().cloned().unwrap();
        assert_eq!(frame.layers.len(), 3);
        let model = driver.scene().layer_model();
        assert!(frame.layers.iter().all(|draw| draw.model == model));
    }

    #[test]
    fn test_host_averaged_layers_send_shared_opacity() {
        let mut config = StarfieldConfig::default();
        config.set_twinkle_strategy(TwinkleStrategy::HostAveraged);
        let mut driver = driver(&config);
        driver.on_frame(3.0).unwrap();

        for layer in &driver.scene().layers {
            let expected = twinkle::averaged_opacity(3.0, &layer.layer);
            assert_eq!(layer.opacity, LayerOpacity::Shared(expected));
        }
    }

    #[test]
    fn test_time_going_backwards_is_zero_delta() {
        let mut driver = driver(&StarfieldConfig::default());
        let remaining = driver.spawn_timer_remaining();
        driver.on_frame(0.5).unwrap();
        driver.on_frame(0.2).unwrap();
        assert!((driver.spawn_timer_remaining() - (remaining - 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_resize_updates_camera_and_surface() {
        let mut driver = driver(&StarfieldConfig::default());
        driver.on_resize(1920, 1080);
        assert_eq!(driver.scene().camera.aspect_ratio, 1920.0 / 1080.0);
        assert_eq!(
            driver.surface().unwrap().size(),
            SurfaceSize::new(1920, 1080)
        );
    }

    #[test]
    fn test_elapsed_stays_within_lifetime() {
        let mut driver = driver(&StarfieldConfig::default());
        let mut t = 0.0;
        for _ in 0..2000 {
            t += 1.0 / 30.0;
            driver.on_frame(t).unwrap();
            for active in &driver.scene().stars {
                assert!(active.star.elapsed() >= 0.0);
                assert!(active.star.elapsed() < active.star.max_lifetime());
            }
        }
    }

    #[test]
    fn test_failed_line_removal_keeps_star_tracked_and_hidden() {
        let mut config = StarfieldConfig::default();
        config.max_active_shooting_stars = Some(1);
        let mut driver = driver(&config);
        let due = driver.spawn_timer_remaining();
        driver.on_frame(due).unwrap();
        let line = driver.scene().stars[0].line;

        let log = driver.surface().unwrap().log();
        log.borrow_mut().fail_line_removals = 1;
        let stats = driver.on_frame(due + 3.0).unwrap();
        assert_eq!(stats.expired, 0);
        assert_eq!(driver.scene().stars.len(), 1);
        assert!(log.borrow().live_lines.contains_key(&line));
        assert!(log.borrow().frames.last().unwrap().lines.is_empty());

        let stats = driver.on_frame(due + 3.1).unwrap();
        assert_eq!(stats.expired, 1);
        assert!(driver.scene().stars.is_empty());
        assert_eq!(log.borrow().removed_lines, vec![line]);
    }

    #[test]
    fn test_teardown_releases_everything_once() {
        let mut driver = driver(&StarfieldConfig::default());
        let due = driver.spawn_timer_remaining();
        driver.on_frame(due).unwrap();
        assert_eq!(driver.scene().stars.len(), 1);

        let (surface, report) = driver.teardown().unwrap();
        assert_eq!(report.layers_released, 3);
        assert_eq!(report.lines_removed, 1);
        assert!(surface.log().borrow().live_layers.is_empty());
        assert!(surface.log().borrow().live_lines.is_empty());

        assert!(driver.teardown().is_none());
        assert!(matches!(driver.on_frame(10.0), Err(StarfieldError::Detached)));
    }
}
