//! wgpu rendering for the starfield: camera, point sprite, the render surface
//! capability and its GPU implementation.

pub mod camera;
pub mod error;
pub mod gpu;
pub mod gpu_surface;
pub mod pipeline;
pub mod sprite;
pub mod surface;

pub use camera::Camera;
pub use error::RenderError;
pub use gpu::{RenderContext, init_render_context_blocking};
pub use gpu_surface::GpuSurface;
pub use pipeline::{LayerUniform, LineUniform, POINT_SHADER_SOURCE, LINE_SHADER_SOURCE, StarfieldPipelines};
pub use sprite::{SpriteImage, circle_sprite};
pub use surface::{
    FrameDesc, LayerDraw, LayerHandle, LayerOpacity, LineDesc, LineDraw, LineHandle,
    PointInstance, PointLayerDesc, RenderSurface, SurfaceSize, unpack_rgb,
};
