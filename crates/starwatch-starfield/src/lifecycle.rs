//! Mounting and unmounting the starfield on a host display.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use starwatch_config::StarfieldConfig;
use starwatch_render::{LayerHandle, RenderSurface, SurfaceSize, circle_sprite};
use tracing::{error, info, warn};

use crate::error::StarfieldError;
use crate::host::{HostDisplay, ListenerId};
use crate::layer::ParticleLayer;
use crate::scene::{FrameDriver, FrameStats, SceneLayer};

/// What `stop` released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub layers_released: usize,
    pub lines_removed: usize,
    pub listener_removed: bool,
    pub surface_detached: bool,
}

/// Whether the host should schedule another frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// A mounted starfield. Pass it to [`stop`] to unmount.
pub struct StarfieldHandle<S: RenderSurface> {
    driver: Rc<RefCell<FrameDriver<S>>>,
    alive: Rc<Cell<bool>>,
    listener: ListenerId,
}

impl<S: RenderSurface> StarfieldHandle<S> {
    /// The per-frame scheduler for this mount.
    pub fn animation_loop(&self) -> AnimationLoop<S> {
        AnimationLoop {
            driver: Rc::downgrade(&self.driver),
            alive: self.alive.clone(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub fn set_dragging(&self, dragging: bool) {
        self.driver.borrow_mut().set_dragging(dragging);
    }

    /// Run `f` with mutable access to the frame driver.
    pub fn with_driver<R>(&self, f: impl FnOnce(&mut FrameDriver<S>) -> R) -> R {
        f(&mut self.driver.borrow_mut())
    }
}

/// Drives frames until the starfield is stopped.
///
/// Holds only a weak reference, so a loop that outlives its mount never keeps
/// the scene alive and never touches it after `stop`.
pub struct AnimationLoop<S: RenderSurface> {
    driver: Weak<RefCell<FrameDriver<S>>>,
    alive: Rc<Cell<bool>>,
}

impl<S: RenderSurface> AnimationLoop<S> {
    /// Run one frame at `t` seconds since mount.
    pub fn tick(&self, t: f64) -> LoopControl {
        self.tick_with_stats(t).0
    }

    pub fn tick_with_stats(&self, t: f64) -> (LoopControl, Option<FrameStats>) {
        if !self.alive.get() {
            return (LoopControl::Stop, None);
        }
        let Some(driver) = self.driver.upgrade() else {
            return (LoopControl::Stop, None);
        };
        let Ok(mut driver) = driver.try_borrow_mut() else {
            warn!("Frame requested while the starfield is busy, skipping");
            return (LoopControl::Continue, None);
        };

        match driver.on_frame(t) {
            Ok(stats) if self.alive.get() => (LoopControl::Continue, Some(stats)),
            Ok(stats) => (LoopControl::Stop, Some(stats)),
            Err(e) => {
                error!("Starfield frame failed: {e}");
                (LoopControl::Stop, None)
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }
}

/// Mount a starfield of `width`×`height` on `host`.
///
/// Rasterizes the point sprite, creates and attaches a surface, generates and
/// uploads every layer, and registers a resize listener. On failure everything
/// allocated so far is released before the error is returned.
pub fn start<H: HostDisplay>(
    host: &mut H,
    width: u32,
    height: u32,
    config: &StarfieldConfig,
) -> Result<StarfieldHandle<H::Surface>, StarfieldError> {
    let sprite = circle_sprite(config.sprite_size).map_err(StarfieldError::Sprite)?;
    let size = SurfaceSize::new(width, height);
    let mut surface = host.create_surface(size)?;
    if let Err(e) = surface.set_sprite(&sprite) {
        error!("Failed to upload point sprite: {e}");
        host.detach_surface(surface);
        return Err(e.into());
    }

    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, "Starfield seed");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut layers = Vec::with_capacity(config.layers.len());
    for layer_config in &config.layers {
        let layer = ParticleLayer::generate(layer_config, &mut rng);
        let instances = layer.instances();
        let uploaded = surface.upload_layer(&layer.desc(&instances));
        match uploaded {
            Ok(handle) => layers.push(SceneLayer::new(layer, handle)),
            Err(e) => {
                error!("Failed to upload layer '{}': {e}", layer.name());
                let handles: Vec<LayerHandle> = layers.iter().map(|l| l.handle).collect();
                release_layers(&mut surface, &handles);
                host.detach_surface(surface);
                return Err(e.into());
            }
        }
    }

    let point_total: usize = layers.iter().map(|l| l.layer.len()).sum();
    info!(
        layers = layers.len(),
        points = point_total,
        width = size.width,
        height = size.height,
        "Starfield mounted"
    );

    let driver = Rc::new(RefCell::new(FrameDriver::new(surface, layers, rng, config)));
    let alive = Rc::new(Cell::new(true));

    let weak = Rc::downgrade(&driver);
    let listener = host.add_resize_listener(Box::new(move |size: SurfaceSize| {
        let Some(driver) = weak.upgrade() else {
            return;
        };
        match driver.try_borrow_mut() {
            Ok(mut driver) => driver.on_resize(size.width, size.height),
            Err(_) => warn!("Resize arrived mid-frame, dropped"),
        }
    }));

    Ok(StarfieldHandle {
        driver,
        alive,
        listener,
    })
}

/// Unmount: deregister the resize listener, stop the loop, remove every
/// shooting star, release every layer and detach the surface.
pub fn stop<H: HostDisplay>(host: &mut H, handle: StarfieldHandle<H::Surface>) -> ReleaseReport {
    let listener_removed = host.remove_resize_listener(handle.listener);
    handle.alive.set(false);

    let torn_down = handle.driver.borrow_mut().teardown();
    let mut report = match torn_down {
        Some((surface, report)) => {
            host.detach_surface(surface);
            ReleaseReport {
                surface_detached: true,
                ..report
            }
        }
        None => ReleaseReport::default(),
    };
    report.listener_removed = listener_removed;

    info!(
        layers = report.layers_released,
        lines = report.lines_removed,
        "Starfield stopped"
    );
    report
}

fn release_layers<S: RenderSurface>(surface: &mut S, handles: &[LayerHandle]) {
    for handle in handles {
        if let Err(e) = surface.release_layer(*handle) {
            warn!("Failed to release layer {handle:?}: {e}");
        }
    }
}
