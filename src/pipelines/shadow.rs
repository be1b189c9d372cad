//! The sun as a directional light and the depth pass that fills its shadow map.

use cgmath::{InnerSpace, Matrix4, Vector3, ortho};
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    config::SunLightConfig,
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::{self, mk_pipeline_layout},
};

/// The light data as laid out in the `Light` WGSL struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Points from the scene towards the sun.
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub shadow_bias: f32,
}

impl LightUniform {
    pub fn new(config: &SunLightConfig, direction: Vector3<f32>) -> Self {
        let direction = normalize_or_up(direction);
        Self {
            view_proj: light_view_proj(config, direction).into(),
            direction: direction.into(),
            intensity: config.intensity,
            color: config.color,
            shadow_bias: config.shadow_bias,
        }
    }
}

fn normalize_or_up(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > f32::EPSILON {
        v.normalize()
    } else {
        Vector3::unit_y()
    }
}

/// Orthographic projection looking along `-direction` onto the configured
/// shadow region.
pub fn light_view_proj(config: &SunLightConfig, direction: Vector3<f32>) -> Matrix4<f32> {
    let direction = normalize_or_up(direction);
    let center = config.shadow_center;
    let eye = center + direction * config.shadow_distance;
    // look_at degenerates when looking straight down the up axis
    let up = if direction.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let view = Matrix4::look_at_rh(eye, center, up);
    let e = config.shadow_extent;
    let proj = ortho(-e, e, -e, e, 1.0, 2.0 * config.shadow_distance);
    OPENGL_TO_WGPU_MATRIX * proj * view
}

#[derive(Debug)]
pub struct SunLight {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: Texture,
    /// Light uniform only, for the shadow pass.
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    config: SunLightConfig,
}

impl SunLight {
    pub fn new(device: &wgpu::Device, config: &SunLightConfig, direction: Vector3<f32>) -> Self {
        let uniform = LightUniform::new(config, direction);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[pipelines::uniform_layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
            label: Some("light_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });
        let shadow_map = Texture::create_shadow_map(device, config.shadow_map_size);

        Self {
            uniform,
            buffer,
            shadow_map,
            bind_group_layout,
            bind_group,
            config: config.clone(),
        }
    }

    pub fn set_direction(&mut self, queue: &wgpu::Queue, direction: Vector3<f32>) {
        self.uniform = LightUniform::new(&self.config, direction);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_shadow_pipeline(
    device: &wgpu::Device,
    light_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Shadow Pipeline Layout", &[light_layout]);
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Shadow Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[ModelVertex::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Thin props and open meshes still cast shadows
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
