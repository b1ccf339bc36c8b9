//! Window creation and event handling via winit.
//!
//! [`WindowHost`] is the [`HostDisplay`] the starfield mounts into; [`App`]
//! implements winit's [`ApplicationHandler`] and drives one starfield frame
//! per redraw.

use std::path::PathBuf;
use std::sync::Arc;

use starwatch_config::{CliArgs, Config};
use starwatch_render::{GpuSurface, RenderError, RenderSurface, SurfaceSize};
use starwatch_starfield::{
    AnimationLoop, HostDisplay, ListenerId, LoopControl, ResizeCallback, ResizeListeners,
    StarfieldHandle, start, stop,
};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::frame_clock::FrameClock;

/// Seconds of animation time between checks of `config.ron` for edits.
pub const CONFIG_POLL_INTERVAL: f64 = 2.0;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// A winit window acting as the starfield's host display.
pub struct WindowHost {
    window: Arc<Window>,
    vsync: bool,
    listeners: ResizeListeners,
}

impl WindowHost {
    pub fn new(window: Arc<Window>, vsync: bool) -> Self {
        Self {
            window,
            vsync,
            listeners: ResizeListeners::new(),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Forward a window resize to every registered listener.
    pub fn notify_resize(&mut self, width: u32, height: u32) -> usize {
        self.listeners.notify(SurfaceSize::new(width, height))
    }
}

impl HostDisplay for WindowHost {
    type Surface = GpuSurface;

    fn create_surface(&mut self, size: SurfaceSize) -> Result<GpuSurface, RenderError> {
        let mut surface = GpuSurface::new(self.window.clone(), self.vsync)?;
        surface.resize(size);
        Ok(surface)
    }

    fn detach_surface(&mut self, surface: GpuSurface) {
        debug!(
            layers = surface.layer_count(),
            lines = surface.line_count(),
            "Detaching surface"
        );
        drop(surface);
    }

    fn add_resize_listener(&mut self, listener: ResizeCallback) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// Application state: the window, the mounted starfield and its clock.
pub struct App {
    config: Config,
    config_dir: Option<PathBuf>,
    overrides: CliArgs,
    host: Option<WindowHost>,
    starfield: Option<StarfieldHandle<GpuSurface>>,
    animation: Option<AnimationLoop<GpuSurface>>,
    clock: FrameClock,
    next_config_check: f64,
}

impl App {
    /// `overrides` are re-applied to every reloaded `config.ron`.
    pub fn new(config: Config, config_dir: Option<PathBuf>, overrides: CliArgs) -> Self {
        Self {
            config,
            config_dir,
            overrides,
            host: None,
            starfield: None,
            animation: None,
            clock: FrameClock::new(),
            next_config_check: CONFIG_POLL_INTERVAL,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.starfield.is_some()
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) {
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        self.host = Some(WindowHost::new(window, self.config.window.vsync));
        if !self.start_starfield() {
            event_loop.exit();
        }
    }

    fn start_starfield(&mut self) -> bool {
        let Some(host) = self.host.as_mut() else {
            return false;
        };
        let inner_size = host.window().inner_size();
        match start(
            host,
            inner_size.width,
            inner_size.height,
            &self.config.starfield,
        ) {
            Ok(handle) => {
                self.animation = Some(handle.animation_loop());
                self.starfield = Some(handle);
                self.clock = FrameClock::new();
                self.next_config_check = CONFIG_POLL_INTERVAL;
                host.window().request_redraw();
                true
            }
            Err(e) => {
                error!("Starfield initialization failed: {e}");
                false
            }
        }
    }

    fn unmount(&mut self) {
        self.animation = None;
        if let (Some(host), Some(handle)) = (self.host.as_mut(), self.starfield.take()) {
            let report = stop(host, handle);
            debug!(?report, "Starfield released");
        }
    }

    /// Pick up edits to `config.ron`. A changed starfield section remounts
    /// the starfield; window and feed settings apply on the next launch.
    /// Returns whether the config changed.
    fn poll_config(&mut self) -> bool {
        let Some(dir) = &self.config_dir else {
            return false;
        };
        let mut fresh = match self.config.reload(dir) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => return false,
            Err(e) => {
                warn!("Keeping current config: {e}");
                return false;
            }
        };
        fresh.apply_cli_overrides(&self.overrides);
        if fresh == self.config {
            return false;
        }

        let remount = fresh.starfield != self.config.starfield;
        self.config = fresh;
        info!(remount, "Config reloaded");
        if remount && self.is_mounted() {
            self.unmount();
            self.start_starfield();
        }
        true
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_none() {
            self.mount(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(host) = &mut self.host {
                    host.notify_resize(new_size.width, new_size.height);
                    debug!("Window resized to {}x{}", new_size.width, new_size.height);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(handle) = &self.starfield {
                    handle.set_dragging(state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(animation) = &self.animation else {
                    return;
                };
                let t = self.clock.tick();
                match animation.tick(t) {
                    LoopControl::Continue => {
                        if t >= self.next_config_check {
                            self.next_config_check = t + CONFIG_POLL_INTERVAL;
                            self.poll_config();
                        }
                        if let Some(host) = &self.host {
                            host.window().request_redraw();
                        }
                    }
                    LoopControl::Stop => {
                        info!(
                            "Animation loop stopped after {} frames ({:.1}s)",
                            self.clock.frame_count(),
                            self.clock.elapsed()
                        );
                        self.animation = None;
                    }
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.is_mounted() {
            self.unmount();
        }
    }
}

/// Creates an event loop and runs the starfield window.
///
/// Blocks until the window is closed.
#[instrument(skip_all)]
pub fn run(
    config: Config,
    config_dir: Option<PathBuf>,
    overrides: CliArgs,
) -> Result<(), EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, config_dir, overrides);
    event_loop.run_app(&mut app)
}
