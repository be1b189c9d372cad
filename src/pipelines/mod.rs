//! Render pipelines and the GPU resources they read.
//!
//! [`Pipelines`] holds one pipeline per kind of geometry. They run in this
//! order each frame: shadow (depth only, from the sun), the reflection (sky
//! and standard again, into the mirror target), then sky, standard, custom
//! effects such as water, shadow catcher and finally the panel.

use crate::data_structures::texture::Texture;

/// WGSL sources assembled from the shared parts.
macro_rules! shader_source {
    ($file:literal) => {
        concat!(
            include_str!("tonemap.wgsl"),
            include_str!("sky_common.wgsl"),
            include_str!($file)
        )
    };
}
pub(crate) use shader_source;

pub mod environment;
pub mod mirror;
pub mod panel;
pub mod shadow;
pub mod sky;
pub mod standard;
pub mod water;

#[derive(Debug)]
pub struct Pipelines {
    pub standard: wgpu::RenderPipeline,
    pub shadow_catcher: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
    /// Standard and sky drawn into [`mirror::Mirror::FORMAT`].
    pub mirror_standard: wgpu::RenderPipeline,
    pub mirror_sky: wgpu::RenderPipeline,
    pub water: wgpu::RenderPipeline,
    pub panel: wgpu::RenderPipeline,
}

impl Pipelines {
    /// `sample_count` applies to the main pass only; the shadow map and the
    /// reflection are drawn single sampled.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        sample_count: u32,
        camera_layout: &wgpu::BindGroupLayout,
        environment: &environment::Environment,
    ) -> Self {
        let lighting_layout = &environment.lighting_layout;
        Self {
            standard: standard::mk_standard_pipeline(
                device,
                color_format,
                sample_count,
                camera_layout,
                lighting_layout,
            ),
            shadow_catcher: standard::mk_shadow_catcher_pipeline(
                device,
                color_format,
                sample_count,
                camera_layout,
                lighting_layout,
            ),
            shadow: shadow::mk_shadow_pipeline(device, &environment.sun.bind_group_layout),
            sky: sky::mk_sky_pipeline(
                device,
                color_format,
                sample_count,
                camera_layout,
                &environment.sky.bind_group_layout,
            ),
            mirror_standard: standard::mk_standard_pipeline(
                device,
                mirror::Mirror::FORMAT,
                1,
                camera_layout,
                lighting_layout,
            ),
            mirror_sky: sky::mk_sky_pipeline(
                device,
                mirror::Mirror::FORMAT,
                1,
                camera_layout,
                &environment.sky.bind_group_layout,
            ),
            water: water::mk_water_pipeline(device, color_format, sample_count, camera_layout),
            panel: panel::mk_panel_pipeline(device, color_format, sample_count),
        }
    }
}

/// Fixed function state that differs between the pipelines.
#[derive(Clone, Debug)]
pub struct PipelineOptions<'a> {
    pub label: &'a str,
    pub blend: Option<wgpu::BlendState>,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub cull_mode: Option<wgpu::Face>,
    pub fs_entry: &'a str,
    pub sample_count: u32,
}

impl Default for PipelineOptions<'_> {
    fn default() -> Self {
        Self {
            label: "Render Pipeline",
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            cull_mode: Some(wgpu::Face::Back),
            fs_entry: "fs_main",
            sample_count: 1,
        }
    }
}

pub fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn mk_pipeline_layout(
    device: &wgpu::Device,
    label: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        push_constant_ranges: &[],
    })
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
    options: PipelineOptions,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(options.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(options.fs_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: options.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: options.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: options.depth_stencil,
        multisample: wgpu::MultisampleState {
            count: options.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

pub fn uniform_layout_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
