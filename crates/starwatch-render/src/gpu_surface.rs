//! wgpu-backed [`RenderSurface`] drawing into a window.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::RenderError;
use crate::gpu::{RenderContext, init_render_context_blocking};
use crate::pipeline::{LayerUniform, LineUniform, StarfieldPipelines};
use crate::sprite::SpriteImage;
use crate::surface::{
    FrameDesc, LayerHandle, LayerOpacity, LineDesc, LineHandle, PointLayerDesc, RenderSurface,
    SurfaceSize,
};

/// Smallest on-screen point size, in pixels.
pub const MIN_POINT_PIXELS: f32 = 1.5;

struct GpuLayer {
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    color: [f32; 3],
    point_size: f32,
}

/// The point sprite shared by every layer's bind group.
struct SpriteTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuLine {
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    color: [f32; 3],
}

/// A window surface plus the GPU resources of every uploaded layer and line.
pub struct GpuSurface {
    context: RenderContext,
    pipelines: StarfieldPipelines,
    sprite: Option<SpriteTexture>,
    layers: HashMap<LayerHandle, GpuLayer>,
    lines: HashMap<LineHandle, GpuLine>,
    next_id: u32,
}

impl GpuSurface {
    /// Create the GPU device for `window` and build the starfield pipelines.
    pub fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RenderError> {
        let context = init_render_context_blocking(window, vsync)?;
        let pipelines = StarfieldPipelines::new(&context.device, context.surface_format);
        Ok(Self {
            context,
            pipelines,
            sprite: None,
            layers: HashMap::new(),
            lines: HashMap::new(),
            next_id: 1,
        })
    }

    /// Number of layers currently holding GPU resources.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of lines currently holding GPU resources.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn upload_sprite(&self, sprite: &SpriteImage) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: sprite.width(),
            height: sprite.height(),
            depth_or_array_layers: 1,
        };
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("point-sprite"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            sprite.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(sprite.width() * 4),
                rows_per_image: Some(sprite.height()),
            },
            size,
        );
        texture
    }
}

impl RenderSurface for GpuSurface {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(
            self.context.surface_config.width,
            self.context.surface_config.height,
        )
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.context.resize(size.width, size.height);
    }

    fn set_sprite(&mut self, sprite: &SpriteImage) -> Result<(), RenderError> {
        let texture = self.upload_sprite(sprite);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Bind groups of existing layers keep the old texture alive.
        self.sprite = Some(SpriteTexture { texture, view });
        log::debug!("Uploaded {}x{} point sprite", sprite.width(), sprite.height());
        Ok(())
    }

    fn upload_layer(&mut self, desc: &PointLayerDesc<'_>) -> Result<LayerHandle, RenderError> {
        let sprite = self.sprite.as_ref().ok_or(RenderError::MissingSprite)?;
        let device = &self.context.device;

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label),
            contents: bytemuck::cast_slice(desc.points),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: std::mem::size_of::<LayerUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(desc.label),
            layout: &self.pipelines.point_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sprite.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.pipelines.sprite_sampler),
                },
            ],
        });

        let handle = LayerHandle(self.allocate_id());
        self.layers.insert(
            handle,
            GpuLayer {
                instance_buffer,
                instance_count: desc.points.len() as u32,
                uniform_buffer,
                bind_group,
                color: desc.color,
                point_size: desc.point_size,
            },
        );
        log::debug!(
            "Uploaded layer '{}' ({} points) as {:?}",
            desc.label,
            desc.points.len(),
            handle
        );
        Ok(handle)
    }

    fn release_layer(&mut self, handle: LayerHandle) -> Result<(), RenderError> {
        let layer = self
            .layers
            .remove(&handle)
            .ok_or(RenderError::UnknownLayer(handle.0))?;
        layer.instance_buffer.destroy();
        layer.uniform_buffer.destroy();
        Ok(())
    }

    fn add_line(&mut self, desc: &LineDesc) -> Result<LineHandle, RenderError> {
        let device = &self.context.device;
        let vertices = [desc.start.to_array(), desc.end.to_array()];
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("line-vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line-uniform"),
            size: std::mem::size_of::<LineUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("line-bg"),
        layout: &self.pipelines.line_bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    let handle = LineHandle(self.allocate_id());
    self.lines.insert(
        handle,
        GpuLine {
            vertex_buffer,
            uniform_buffer,
            bind_group,
            color: desc.color,
        },
    );
    Ok(handle)
}

fn remove_line(&mut self, handle: LineHandle) -> Result<(), RenderError> {
    let line = self
        .lines
        .remove(&handle)
        .ok_or(RenderError::UnknownLine(handle.0))?;
    line.vertex_buffer.destroy();
    line.uniform_buffer.destroy();
    Ok(())
}

fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), RenderError> {
    let size = self.size();
    let view_proj = frame.view_proj.to_cols_array_2d();

    let mut layer_draws = Vec::with_capacity(frame.layers.len());
    for draw in frame.layers {
        let layer = self
            .layers
            .get(&draw.handle)
            .ok_or(RenderError::UnknownLayer(draw.handle.0))?;
        let params = match draw.opacity {
            LayerOpacity::PerPoint { time, amplitude } => [time, amplitude, 0.0, 0.0],
            LayerOpacity::Shared(opacity) => [0.0, 0.0, opacity, 1.0],
        };
        let uniform = LayerUniform {
            view_proj,
            model: draw.model.to_cols_array_2d(),
            color: [layer.color[0], layer.color[1], layer.color[2], layer.point_size],
            params,
            viewport: [size.width as f32, size.height as f32, MIN_POINT_PIXELS, 0.0],
        };
        self.context
            .queue
            .write_buffer(&layer.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
        if layer.instance_count > 0 {
            layer_draws.push(layer);
        }
    }

    let mut line_draws = Vec::with_capacity(frame.lines.len());
    for draw in frame.lines {
        let line = self
            .lines
            .get(&draw.handle)
            .ok_or(RenderError::UnknownLine(draw.handle.0))?;
        let uniform = LineUniform {
            view_proj,
            color: [line.color[0], line.color[1], line.color[2], draw.opacity],
        };
        self.context
            .queue
            .write_buffer(&line.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
        line_draws.push(line);
    }

    let output = match self.context.get_current_texture() {
        Ok(texture) => texture,
        Err(RenderError::Timeout) => {
            log::warn!("Surface timeout, skipping frame");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder =
        self.context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("starfield-encoder"),
            });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("starfield-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

            pass.set_pipeline(&self.pipelines.point_pipeline);
            for layer in &layer_draws {
                pass.set_bind_group(0, &layer.bind_group, &[]);
                pass.set_vertex_buffer(0, layer.instance_buffer.slice(..));
                pass.draw(0..6, 0..layer.instance_count);
            }

            pass.set_pipeline(&self.pipelines.line_pipeline);
            for line in &line_draws {
                pass.set_bind_group(0, &line.bind_group, &[]);
                pass.set_vertex_buffer(0, line.vertex_buffer.slice(..));
                pass.draw(0..2, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Drop for GpuSurface {
    fn drop(&mut self) {
        if let Some(sprite) = self.sprite.take() {
            sprite.texture.destroy();
        }
    }
}
