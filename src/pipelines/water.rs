//! The animated water plane.
//!
//! [`WaterSurface`] owns the plane geometry, the water uniform and the
//! tiled normal map. A [`WaterClock`] grows by a fixed step every rendered
//! frame; its wrapped value is the uniform `time` which scrolls the normal
//! map samples in `water.wgsl`.

use cgmath::{Deg, InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    config::WaterConfig,
    context::Context,
    data_structures::{
        instance::Instance,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::{self, PipelineOptions, mirror, mk_pipeline_layout, mk_render_pipeline},
    resources::mesh::plane_geometry,
};

/// Water parameters as laid out in the `Water` WGSL struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniform {
    pub sun_direction: [f32; 3],
    pub distortion_scale: f32,
    pub sun_color: [f32; 3],
    pub size: f32,
    pub water_color: [f32; 3],
    pub time: f32,
    pub alpha: f32,
    pub _padding: [f32; 3],
}

impl WaterUniform {
    pub fn new(config: &WaterConfig, sun: Vector3<f32>) -> Self {
        let mut uniform = Self {
            sun_direction: [0.0, 1.0, 0.0],
            distortion_scale: config.distortion_scale,
            sun_color: config.sun_color,
            size: config.size,
            water_color: config.water_color,
            time: 0.0,
            alpha: config.alpha,
            _padding: [0.0; 3],
        };
        uniform.set_sun_direction(sun);
        uniform
    }

    /// Stores the normalized direction; a zero vector keeps the previous one.
    pub fn set_sun_direction(&mut self, sun: Vector3<f32>) {
        if sun.magnitude2() > f32::EPSILON {
            self.sun_direction = sun.normalize().into();
        }
    }

    pub fn set_waves(&mut self, distortion_scale: f32, size: f32) {
        self.distortion_scale = distortion_scale;
        self.size = size;
    }
}

/// Seconds after which the shader time starts over. Keeps the f32 uniform
/// precise enough that every frame still moves the waves.
pub const SHADER_TIME_PERIOD: f64 = 3600.0;

/// Animation time accumulated in f64 so the step stays fixed however long
/// the scene runs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WaterClock {
    elapsed: f64,
    step: f64,
}

impl WaterClock {
    pub fn new(step: f64) -> Self {
        Self { elapsed: 0.0, step }
    }

    /// A clock that has already run for `elapsed` seconds.
    pub fn starting_at(elapsed: f64, step: f64) -> Self {
        Self { elapsed, step }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advances by one step and returns the new elapsed time.
    pub fn tick(&mut self) -> f64 {
        self.elapsed += self.step;
        self.elapsed
    }

    pub fn shader_time(&self) -> f32 {
        (self.elapsed % SHADER_TIME_PERIOD) as f32
    }
}

#[derive(Debug)]
pub struct WaterSurface {
    pub uniform: WaterUniform,
    clock: WaterClock,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

impl WaterSurface {
    pub fn new(
        device: &wgpu::Device,
        config: &WaterConfig,
        normals: &Texture,
        sun: Vector3<f32>,
    ) -> Self {
        let uniform = WaterUniform::new(config, sun);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = normals.sampler_or_default(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &mk_bind_group_layout(device),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normals.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("water_bind_group"),
        });

        let (vertices, indices) = surface_geometry(config.extent);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            uniform,
            clock: WaterClock::new(config.time_step),
            buffer,
            bind_group,
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    /// One frame worth of animation. Returns the new elapsed time.
    pub fn advance_time(&mut self) -> f64 {
        let elapsed = self.clock.tick();
        self.uniform.time = self.clock.shader_time();
        elapsed
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }

    pub fn draw(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_pipeline(&ctx.pipelines.water);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(1, &self.bind_group, &[]);
        render_pass.set_bind_group(2, &ctx.mirror.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

/// A square of `extent` laid flat at y = 0, in world space.
pub fn surface_geometry(extent: f32) -> (Vec<ModelVertex>, Vec<u32>) {
    let (mut vertices, indices) = plane_geometry(extent, extent);
    let flat = Instance::rotated_x(Deg(-90.0)).to_matrix();
    for v in vertices.iter_mut() {
        let p = flat * Vector3::from(v.position).extend(1.0);
        let n = flat * Vector3::from(v.normal).extend(0.0);
        v.position = p.truncate().into();
        v.normal = n.truncate().into();
    }
    (vertices, indices)
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            pipelines::uniform_layout_entry(0, wgpu::ShaderStages::FRAGMENT),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
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
        label: Some("water_bind_group_layout"),
    })
}

pub fn mk_water_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Water Pipeline Layout",
        &[
            camera_layout,
            &mk_bind_group_layout(device),
            &mirror::mk_bind_group_layout(device),
        ],
    );
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Water Shader"),
        source: wgpu::ShaderSource::Wgsl(pipelines::shader_source!("water.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        &[ModelVertex::desc()],
        shader,
        PipelineOptions {
            label: "Water Pipeline",
            sample_count,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            cull_mode: None,
            ..Default::default()
        },
    )
}
