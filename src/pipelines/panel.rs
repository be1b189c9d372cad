//! Flat screen-space geometry for the debug panel.

use crate::{
    data_structures::model::Vertex,
    pipelines::{PipelineOptions, depth_state, mk_pipeline_layout, mk_render_pipeline},
};

/// A panel vertex in normalized device coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PanelVertex {
    pub position: [f32; 2],
    pub colour: [f32; 4],
}

impl Vertex for PanelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PanelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

pub fn mk_panel_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Panel Pipeline Layout", &[]);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Panel Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("panel.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        &[PanelVertex::desc()],
        shader,
        PipelineOptions {
            label: "Panel Pipeline",
            sample_count,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            // Always on top of the scene
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
            cull_mode: None,
            ..Default::default()
        },
    )
}
