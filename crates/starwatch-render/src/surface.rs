//! The render surface capability the starfield draws through.
//!
//! [`RenderSurface`] is the seam between scene logic and the GPU: the wgpu
//! implementation lives in [`crate::gpu_surface`], and the scene crate tests
//! against a recording implementation.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::error::RenderError;
use crate::sprite::SpriteImage;

/// Pixel dimensions of a drawing surface. Both axes are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// Create a size, clamping zero dimensions to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Width / height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Opaque handle to a point layer uploaded to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(pub u32);

/// Opaque handle to a line segment added to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineHandle(pub u32);

/// Per-point vertex attributes uploaded once per layer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub base_opacity: f32,
    pub twinkle_speed: f32,
    pub phase_offset: f32,
}

impl PointInstance {
    pub const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
        2 => Float32,
        3 => Float32,
    ];

    /// Instance-rate vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Everything a surface needs to upload one point layer.
#[derive(Clone, Debug)]
pub struct PointLayerDesc<'a> {
    pub label: &'a str,
    pub color: [f32; 3],
    /// World-space point size; the surface maps it to pixels.
    pub point_size: f32,
    pub points: &'a [PointInstance],
}

/// A straight segment drawn with a uniform color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineDesc {
    pub start: Vec3,
    pub end: Vec3,
    pub color: [f32; 3],
}

/// How a layer's per-point opacity is produced this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerOpacity {
    /// The surface evaluates the twinkle formula per point.
    PerPoint { time: f32, amplitude: f32 },
    /// One opacity computed on the host applies to every point.
    Shared(f32),
}

/// One layer draw in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerDraw {
    pub handle: LayerHandle,
    pub model: Mat4,
    pub opacity: LayerOpacity,
}

/// One line draw in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineDraw {
    pub handle: LineHandle,
    pub opacity: f32,
}

/// A complete frame: camera transform plus every visible object.
#[derive(Clone, Copy, Debug)]
pub struct FrameDesc<'a> {
    pub view_proj: Mat4,
    pub layers: &'a [LayerDraw],
    pub lines: &'a [LineDraw],
}

/// A drawing surface that owns GPU-side resources for layers and lines.
///
/// Handles are only valid for the surface that issued them. Releasing or
/// removing an unknown handle is an error so leaks and double frees show up.
pub trait RenderSurface {
    /// Current pixel size.
    fn size(&self) -> SurfaceSize;

    /// Resize the drawable area.
    fn resize(&mut self, size: SurfaceSize);

    /// Upload the point sprite every layer samples. Layers uploaded earlier
    /// keep the sprite they were created with.
    fn set_sprite(&mut self, sprite: &SpriteImage) -> Result<(), RenderError>;

    /// Upload a point layer. Fails with [`RenderError::MissingSprite`] before
    /// [`set_sprite`](Self::set_sprite).
    fn upload_layer(&mut self, desc: &PointLayerDesc<'_>) -> Result<LayerHandle, RenderError>;

    /// Free the buffers and bind group of a layer.
    fn release_layer(&mut self, handle: LayerHandle) -> Result<(), RenderError>;

    /// Add a line segment.
    fn add_line(&mut self, desc: &LineDesc) -> Result<LineHandle, RenderError>;

    /// Remove a line segment and free its geometry.
    fn remove_line(&mut self, handle: LineHandle) -> Result<(), RenderError>;

    /// Draw one frame.
    fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), RenderError>;
}

/// Convert a packed `0xRRGGBB` color to linear `[r, g, b]` in `[0, 1]`.
pub fn unpack_rgb(color: u32) -> [f32; 3] {
    [
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
    ]
}
