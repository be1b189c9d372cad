//! Opaque physically based surfaces and the shadow catcher.
//!
//! Both pipelines share `standard.wgsl` and its bind groups: material,
//! camera and lighting. The shadow catcher only writes the darkening from
//! received shadows and blends it over what is already drawn.

use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{self, Vertex},
    },
    pipelines::{self, PipelineOptions, depth_state, mk_pipeline_layout, mk_render_pipeline},
    resources::texture::material_layout,
};

fn standard_shader() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("Standard Shader"),
        source: wgpu::ShaderSource::Wgsl(pipelines::shader_source!("standard.wgsl").into()),
    }
}

pub fn mk_standard_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
    camera_layout: &wgpu::BindGroupLayout,
    lighting_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Standard Pipeline Layout",
        &[&material_layout(device), camera_layout, lighting_layout],
    );
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        &[model::ModelVertex::desc(), InstanceRaw::desc()],
        standard_shader(),
        PipelineOptions {
            label: "Standard Pipeline",
            sample_count,
            ..Default::default()
        },
    )
}

pub fn mk_shadow_catcher_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
    camera_layout: &wgpu::BindGroupLayout,
    lighting_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Shadow Catcher Pipeline Layout",
        &[&material_layout(device), camera_layout, lighting_layout],
    );
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        &[model::ModelVertex::desc(), InstanceRaw::desc()],
        standard_shader(),
        PipelineOptions {
            label: "Shadow Catcher Pipeline",
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Less)),
            cull_mode: None,
            fs_entry: "fs_catcher",
            sample_count,
        },
    )
}
