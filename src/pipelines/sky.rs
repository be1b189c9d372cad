//! Atmospheric sky dome.

use cgmath::Vector3;
use wgpu::util::DeviceExt;

use crate::{
    config::SkyConfig,
    data_structures::model::{ModelVertex, Vertex},
    pipelines::{self, PipelineOptions, depth_state, mk_pipeline_layout, mk_render_pipeline},
    resources::mesh::box_geometry,
};

/// Sky parameters as laid out in the `Sky` WGSL struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    pub sun_position: [f32; 3],
    pub turbidity: f32,
    pub up: [f32; 3],
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub scale: f32,
    pub _padding: f32,
}

impl SkyUniform {
    pub fn new(config: &SkyConfig, sun: Vector3<f32>) -> Self {
        Self {
            sun_position: sun.into(),
            turbidity: config.turbidity,
            up: [0.0, 1.0, 0.0],
            rayleigh: config.rayleigh,
            mie_coefficient: config.mie_coefficient,
            mie_directional_g: config.mie_directional_g,
            scale: config.scale,
            _padding: 0.0,
        }
    }

    /// The sky model takes the unnormalized sun vector.
    pub fn set_sun_position(&mut self, sun: Vector3<f32>) {
        self.sun_position = sun.into();
    }
}

#[derive(Debug)]
pub struct Sky {
    pub uniform: SkyUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

impl Sky {
    pub fn new(device: &wgpu::Device, config: &SkyConfig, sun: Vector3<f32>) -> Self {
        let uniform = SkyUniform::new(config, sun);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("sky_bind_group"),
        });

        // Unit box, scaled in the vertex shader
        let (vertices, indices) = box_geometry(Vector3::new(1.0, 1.0, 1.0));
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            uniform,
            buffer,
            bind_group_layout,
            bind_group,
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    pub fn set_sun_position(&mut self, queue: &wgpu::Queue, sun: Vector3<f32>) {
        self.uniform.set_sun_position(sun);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }

    /// Expects the sky pipeline to be set.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass, camera_bind_group: &wgpu::BindGroup) {
        render_pass.set_bind_group(0, camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[pipelines::uniform_layout_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
        label: Some("sky_bind_group_layout"),
    })
}

pub fn mk_sky_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
    camera_layout: &wgpu::BindGroupLayout,
    sky_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Sky Pipeline Layout", &[camera_layout, sky_layout]);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(pipelines::shader_source!("sky.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        &[ModelVertex::desc()],
        shader,
        PipelineOptions {
            label: "Sky Pipeline",
            sample_count,
            // Seen from inside, behind everything else
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
            cull_mode: None,
            ..Default::default()
        },
    )
}

