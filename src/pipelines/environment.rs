//! Sky, sun and the environment cube baked from the sky.
//!
//! The standard materials take their ambient light from a small cube map
//! holding the sky as seen from the origin. Whenever the sun moves, the sky
//! uniform and the light are updated and the cube is baked again; the old
//! cube is released as the new one replaces it.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    config::SceneConfig,
    data_structures::texture::Texture,
    pipelines::{
        self, PipelineOptions, mk_pipeline_layout, mk_render_pipeline,
        shadow::SunLight,
        sky::Sky,
    },
};

/// Orientation of one cube face: the direction through its centre and the
/// directions of +x and +y in normalized device coordinates of the face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeFace {
    pub forward: [f32; 3],
    pub right: [f32; 3],
    pub up: [f32; 3],
}

/// Faces in layer order +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: [CubeFace; 6] = [
    CubeFace {
        forward: [1.0, 0.0, 0.0],
        right: [0.0, 0.0, -1.0],
        up: [0.0, 1.0, 0.0],
    },
    CubeFace {
        forward: [-1.0, 0.0, 0.0],
        right: [0.0, 0.0, 1.0],
        up: [0.0, 1.0, 0.0],
    },
    CubeFace {
        forward: [0.0, 1.0, 0.0],
        right: [1.0, 0.0, 0.0],
        up: [0.0, 0.0, -1.0],
    },
    CubeFace {
        forward: [0.0, -1.0, 0.0],
        right: [1.0, 0.0, 0.0],
        up: [0.0, 0.0, 1.0],
    },
    CubeFace {
        forward: [0.0, 0.0, 1.0],
        right: [1.0, 0.0, 0.0],
        up: [0.0, 1.0, 0.0],
    },
    CubeFace {
        forward: [0.0, 0.0, -1.0],
        right: [-1.0, 0.0, 0.0],
        up: [0.0, 1.0, 0.0],
    },
];

impl CubeFace {
    /// World direction through the point `(x, y)` of the face, both in [-1, 1].
    pub fn direction(&self, x: f32, y: f32) -> Vector3<f32> {
        (Vector3::from(self.forward) + Vector3::from(self.right) * x + Vector3::from(self.up) * y)
            .normalize()
    }
}

/// The `Face` WGSL struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FaceUniform {
    forward: [f32; 4],
    right: [f32; 4],
    up: [f32; 4],
}

impl From<&CubeFace> for FaceUniform {
    fn from(face: &CubeFace) -> Self {
        let pad = |v: [f32; 3]| [v[0], v[1], v[2], 0.0];
        Self {
            forward: pad(face.forward),
            right: pad(face.right),
            up: pad(face.up),
        }
    }
}

#[derive(Debug)]
struct Baker {
    pipeline: wgpu::RenderPipeline,
    faces: Vec<wgpu::BindGroup>,
}

impl Baker {
    fn new(device: &wgpu::Device, sky_layout: &wgpu::BindGroupLayout) -> Self {
        let face_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[pipelines::uniform_layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
            label: Some("environment_face_layout"),
        });
        let faces = CUBE_FACES
            .iter()
            .map(|face| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Environment Face Buffer"),
                    contents: bytemuck::cast_slice(&[FaceUniform::from(face)]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &face_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                    label: Some("environment_face_bind_group"),
                })
            })
            .collect();

        let layout = mk_pipeline_layout(
            device,
            "Environment Bake Pipeline Layout",
            &[sky_layout, &face_layout],
        );
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Environment Bake Shader"),
            source: wgpu::ShaderSource::Wgsl(pipelines::shader_source!("bake.wgsl").into()),
        };
        let pipeline = mk_render_pipeline(
            device,
            &layout,
            Texture::ENVIRONMENT_FORMAT,
            &[],
            shader,
            PipelineOptions {
                label: "Environment Bake Pipeline",
                depth_stencil: None,
                cull_mode: None,
                ..Default::default()
            },
        );

        Self { pipeline, faces }
    }

    fn bake(&self, device: &wgpu::Device, queue: &wgpu::Queue, sky: &Sky, size: u32) -> Texture {
        let cube = Texture::create_environment_cube(device, size);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Environment Bake Encoder"),
        });
        for (layer, face) in self.faces.iter().enumerate() {
            let view = cube.face_view(layer as u32);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Environment Bake Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &sky.bind_group, &[]);
            pass.set_bind_group(1, face, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
        cube
    }
}

#[derive(Debug)]
pub struct Environment {
    pub sky: Sky,
    pub sun: SunLight,
    /// The baked sky, sampled for ambient light and reflections.
    pub map: Texture,
    pub lighting_layout: wgpu::BindGroupLayout,
    pub lighting_bind_group: wgpu::BindGroup,
    baker: Baker,
    resolution: u32,
}

impl Environment {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, config: &SceneConfig) -> Self {
        let sun = config.sun.direction();
        let sky = Sky::new(device, &config.sky, sun);
        let sun_light = SunLight::new(device, &config.light, sun);
        let baker = Baker::new(device, &sky.bind_group_layout);
        let resolution = config.sky.environment_resolution;
        let map = baker.bake(device, queue, &sky, resolution);
        let lighting_layout = mk_lighting_layout(device);
        let lighting_bind_group = mk_lighting_bind_group(device, &lighting_layout, &sun_light, &map);

        Self {
            sky,
            sun: sun_light,
            map,
            lighting_layout,
            lighting_bind_group,
            baker,
            resolution,
        }
    }

    /// Moves the sun to `sun`, pointing from the origin towards it, and
    /// bakes the environment again.
    pub fn set_sun(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, sun: Vector3<f32>) {
        self.sky.set_sun_position(queue, sun);
        self.sun.set_direction(queue, sun);

        let map = self.baker.bake(device, queue, &self.sky, self.resolution);
        drop(std::mem::replace(&mut self.map, map));
        self.lighting_bind_group =
            mk_lighting_bind_group(device, &self.lighting_layout, &self.sun, &self.map);
        log::debug!("Environment baked for sun at {:?}", sun);
    }
}

/// Group 2 of the standard pipelines: sun, shadow map and environment.
pub fn mk_lighting_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            pipelines::uniform_layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::Cube,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("lighting_bind_group_layout"),
    })
}

fn mk_lighting_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sun: &SunLight,
    map: &Texture,
) -> wgpu::BindGroup {
    let shadow_sampler = sun.shadow_map.sampler_or_default(device);
    let environment_sampler = map.sampler_or_default(device);
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: sun.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&sun.shadow_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&shadow_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&map.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&environment_sampler),
            },
        ],
        label: Some("lighting_bind_group"),
    })
}
