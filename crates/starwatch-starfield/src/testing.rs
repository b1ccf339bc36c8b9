//! In-memory surface and host for tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use glam::Mat4;
use rand_chacha::ChaCha8Rng;
use starwatch_config::StarfieldConfig;
use starwatch_render::{
    FrameDesc, LayerDraw, LayerHandle, LineDesc, LineDraw, LineHandle, PointLayerDesc,
    RenderError, RenderSurface, SpriteImage, SurfaceSize, circle_sprite,
};

use crate::host::{HostDisplay, ListenerId, ResizeCallback, ResizeListeners};
use crate::layer::ParticleLayer;
use crate::scene::SceneLayer;

#[derive(Clone, Debug, Default)]
pub struct RecordedFrame {
    pub view_proj: Mat4,
    pub layers: Vec<LayerDraw>,
    pub lines: Vec<LineDraw>,
}

/// Everything a [`RecordingSurface`] saw. Shared so it outlives the surface.
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub sprites: Vec<(u32, u32)>,
    pub uploads: Vec<(LayerHandle, String, usize)>,
    pub live_layers: BTreeSet<LayerHandle>,
    pub released_layers: Vec<LayerHandle>,
    pub live_lines: BTreeMap<LineHandle, LineDesc>,
    pub removed_lines: Vec<LineHandle>,
    pub frames: Vec<RecordedFrame>,
    pub resizes: Vec<SurfaceSize>,
    /// Number of upcoming `remove_line` calls that fail.
    pub fail_line_removals: usize,
}

pub struct RecordingSurface {
    size: SurfaceSize,
    log: Rc<RefCell<SurfaceLog>>,
    next_id: u32,
    fail_upload_at: Option<usize>,
}

impl RecordingSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self::with_log(size, Rc::default(), None)
    }

    pub fn with_log(
        size: SurfaceSize,
        log: Rc<RefCell<SurfaceLog>>,
        fail_upload_at: Option<usize>,
    ) -> Self {
        Self {
            size,
            log,
            next_id: 1,
            fail_upload_at,
        }
    }

    pub fn log(&self) -> Rc<RefCell<SurfaceLog>> {
        self.log.clone()
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.log.borrow_mut().resizes.push(size);
    }

    fn set_sprite(&mut self, sprite: &SpriteImage) -> Result<(), RenderError> {
        self.log
            .borrow_mut()
            .sprites
            .push((sprite.width(), sprite.height()));
        Ok(())
    }

    fn upload_layer(&mut self, desc: &PointLayerDesc<'_>) -> Result<LayerHandle, RenderError> {
        let mut log = self.log.borrow_mut();
        if log.sprites.is_empty() {
            return Err(RenderError::MissingSprite);
        }
        if self.fail_upload_at == Some(log.uploads.len()) {
            return Err(RenderError::OutOfMemory);
        }
        let handle = LayerHandle(self.next_id);
        self.next_id += 1;
        log.uploads
            .push((handle, desc.label.to_string(), desc.points.len()));
        log.live_layers.insert(handle);
        Ok(handle)
    }

    fn release_layer(&mut self, handle: LayerHandle) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if !log.live_layers.remove(&handle) {
            return Err(RenderError::UnknownLayer(handle.0));
        }
        log.released_layers.push(handle);
        Ok(())
    }

    fn add_line(&mut self, desc: &LineDesc) -> Result<LineHandle, RenderError> {
        let handle = LineHandle(self.next_id);
        self.next_id += 1;
        self.log.borrow_mut().live_lines.insert(handle, *desc);
        Ok(handle)
    }

    fn remove_line(&mut self, handle: LineHandle) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.fail_line_removals > 0 {
            log.fail_line_removals -= 1;
            return Err(RenderError::SurfaceLost);
        }
        if log.live_lines.remove(&handle).is_none() {
            return Err(RenderError::UnknownLine(handle.0));
        }
        log.removed_lines.push(handle);
        Ok(())
    }

    fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        for draw in frame.layers {
            if !log.live_layers.contains(&draw.handle) {
                return Err(RenderError::UnknownLayer(draw.handle.0));
            }
        }
        for draw in frame.lines {
            if !log.live_lines.contains_key(&draw.handle) {
                return Err(RenderError::UnknownLine(draw.handle.0));
            }
        }
        log.frames.push(RecordedFrame {
            view_proj: frame.view_proj,
            layers: frame.layers.to_vec(),
            lines: frame.lines.to_vec(),
        });
        Ok(())
    }
}

/// Host display that hands out [`RecordingSurface`]s sharing one log.
#[derive(Default)]
pub struct FakeHost {
    pub log: Rc<RefCell<SurfaceLog>>,
    pub listeners: ResizeListeners,
    pub surfaces_created: usize,
    pub surfaces_detached: usize,
    pub fail_create: bool,
    pub fail_upload_at: Option<usize>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the display resizing. Returns how many listeners ran.
    pub fn resize(&mut self, width: u32, height: u32) -> usize {
        self.listeners.notify(SurfaceSize::new(width, height))
    }
}

impl HostDisplay for FakeHost {
    type Surface = RecordingSurface;

    fn create_surface(&mut self, size: SurfaceSize) -> Result<RecordingSurface, RenderError> {
        if self.fail_create {
            return Err(RenderError::NoAdapter);
        }
        self.surfaces_created += 1;
        Ok(RecordingSurface::with_log(
            size,
            self.log.clone(),
            self.fail_upload_at,
        ))
    }

    fn detach_surface(&mut self, _surface: RecordingSurface) {
        self.surfaces_detached += 1;
    }

    fn add_resize_listener(&mut self, listener: ResizeCallback) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// Generate and upload every configured layer onto `surface`.
pub fn upload_layers(
    surface: &mut RecordingSurface,
    config: &StarfieldConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<SceneLayer> {
    let sprite = circle_sprite(config.sprite_size).unwrap();
    surface.set_sprite(&sprite).unwrap();
    config
        .layers
        .iter()
        .map(|layer_config| {
            let layer = ParticleLayer::generate(layer_config, rng);
            let instances = layer.instances();
            let handle = surface.upload_layer(&layer.desc(&instances)).unwrap();
            SceneLayer::new(layer, handle)
        })
        .collect()
}
