//! Render pipelines for instanced point sprites and line segments.

use bytemuck::{Pod, Zeroable};

/// Per-layer uniform block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LayerUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// rgb, world-space point size.
    pub color: [f32; 4],
    /// time, amplitude, shared opacity, mode (0 per-point, 1 shared).
    pub params: [f32; 4],
    /// viewport width, viewport height, minimum point size in pixels, unused.
    pub viewport: [f32; 4],
}

/// Per-line uniform block. `color.a` carries the line opacity.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LineUniform {
    pub view_proj: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// WGSL for camera-facing point sprites, one quad per instance.
pub const POINT_SHADER_SOURCE: &str = r#"
struct LayerUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
    viewport: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: LayerUniform;
@group(0) @binding(1)
var sprite_texture: texture_2d<f32>;
@group(0) @binding(2)
var sprite_sampler: sampler;

struct PointInput {
    @location(0) position: vec3<f32>,
    @location(1) base_opacity: f32,
    @location(2) twinkle_speed: f32,
    @location(3) phase_offset: f32,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) opacity: f32,
};

@vertex
fn vs_point(@builtin(vertex_index) idx: u32, point: PointInput) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[idx];
    let center = u.view_proj * u.model * vec4<f32>(point.position, 1.0);
    // Size attenuates with distance but never drops below the pixel floor.
    let size_px = max(u.color.w * u.viewport.y * 0.5 / max(center.w, 1e-4), u.viewport.z);
    let offset = corner * size_px / u.viewport.xy * center.w;

    var out: VertexOutput;
    out.clip = vec4<f32>(center.xy + offset, center.z, center.w);
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    if (u.params.w < 0.5) {
        out.opacity = point.base_opacity
            + sin(u.params.x * point.twinkle_speed + point.phase_offset) * u.params.y;
    } else {
        out.opacity = u.params.z;
    }
    return out;
}

@fragment
fn fs_point(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(sprite_texture, sprite_sampler, in.uv);
    let alpha = texel.a * clamp(in.opacity, 0.0, 1.0);
    return vec4<f32>(texel.rgb * u.color.rgb, alpha);
}
"#;

/// WGSL for uniformly colored line segments.
pub const LINE_SHADER_SOURCE: &str = r#"
struct LineUniform {
    view_proj: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: LineUniform;

@vertex
fn vs_line(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_line() -> @location(0) vec4<f32> {
    return vec4<f32>(u.color.rgb, clamp(u.color.a, 0.0, 1.0));
}
"#;

/// Pipelines and layouts shared by every layer and line on a surface.
pub struct StarfieldPipelines {
    pub point_pipeline: wgpu::RenderPipeline,
    pub point_bgl: wgpu::BindGroupLayout,
    pub line_pipeline: wgpu::RenderPipeline,
    pub line_bgl: wgpu::BindGroupLayout,
    pub sprite_sampler: wgpu::Sampler,
}

impl StarfieldPipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let point_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("point-shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER_SOURCE.into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line-shader"),
            source: wgpu::ShaderSource::Wgsl(LINE_SHADER_SOURCE.into()),
        });

        let point_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("point-layer-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<LayerUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let line_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("line-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<LineUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let point_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("point-pipeline-layout"),
            bind_group_layouts: &[&point_bgl],
            immediate_size: 0,
        });
        let line_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("line-pipeline-layout"),
            bind_group_layouts: &[&line_bgl],
            immediate_size: 0,
        });

        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let point_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("point-pipeline"),
            layout: Some(&point_layout),
            vertex: wgpu::VertexState {
                module: &point_shader,
                entry_point: Some("vs_point"),
                buffers: &[crate::surface::PointInstance::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &point_shader,
                entry_point: Some("fs_point"),
                targets: &color_target,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let line_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        };

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line-pipeline"),
            layout: Some(&line_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                buffers: &[line_vertex_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                targets: &color_target,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let sprite_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::info!("Starfield pipelines created for {surface_format:?}");

        Self {
            point_pipeline,
            point_bgl,
            line_pipeline,
            line_bgl,
            sprite_sampler,
        }
    }
}
