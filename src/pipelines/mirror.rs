//! Planar reflection of the scene in the water.
//!
//! Every frame the sky and the opaque meshes are drawn a second time into a
//! small HDR target, seen from the camera mirrored in the water plane. The
//! water shader projects its fragments with the same mirrored camera and
//! samples that target, shifted by the wave distortion.

use cgmath::{InnerSpace, Matrix, Matrix4, Point3, SquareMatrix, Vector3, Vector4, perspective};
use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraUniform, OPENGL_TO_WGPU_MATRIX, Projection},
    data_structures::texture::Texture,
    pipelines,
};

/// `camera` reflected in the horizontal plane at height `level`.
pub fn mirror_camera(camera: &Camera, level: f32) -> Camera {
    let reflect = |p: Point3<f32>| Point3::new(p.x, 2.0 * level - p.y, p.z);
    Camera {
        position: reflect(camera.position),
        target: reflect(camera.target),
        up: Vector3::new(camera.up.x, -camera.up.y, camera.up.z),
    }
}

/// Moves the near plane of an OpenGL style `projection` onto `plane`, given
/// in view space with the camera on its negative side. Everything behind
/// the plane falls outside the depth range.
pub fn oblique_near_plane(projection: Matrix4<f32>, plane: Vector4<f32>) -> Matrix4<f32> {
    let sign = |v: f32| if v >= 0.0 { 1.0 } else { -1.0 };
    let mut m = projection;
    // Frustum corner opposite the plane
    let corner = Vector4::new(
        (sign(plane.x) + m.z.x) / m.x.x,
        (sign(plane.y) + m.z.y) / m.y.y,
        -1.0,
        (1.0 + m.z.z) / m.w.z,
    );
    let denominator = plane.dot(corner);
    if denominator.abs() < f32::EPSILON {
        return projection;
    }
    let clip = plane * (2.0 / denominator);
    m.x.z = clip.x;
    m.y.z = clip.y;
    m.z.z = clip.z + 1.0;
    m.w.z = clip.w;
    m
}

/// The mirrored camera and its view-projection, clipped at the water plane.
pub fn mirror_view_proj(camera: &Camera, projection: &Projection, level: f32) -> (Camera, Matrix4<f32>) {
    let mirrored = mirror_camera(camera, level);
    let view = mirrored.calc_matrix();
    let lens = perspective(projection.fovy, projection.aspect(), projection.znear, projection.zfar);
    let water_plane = Vector4::new(0.0, 1.0, 0.0, -level);
    let lens = match view.invert() {
        Some(inverse) => oblique_near_plane(lens, inverse.transpose() * water_plane),
        None => lens,
    };
    (mirrored, OPENGL_TO_WGPU_MATRIX * lens * view)
}

#[derive(Debug)]
pub struct Mirror {
    pub level: f32,
    pub uniform: CameraUniform,
    buffer: wgpu::Buffer,
    /// Group 0 of the sky and standard pipelines during the reflection pass.
    pub camera_bind_group: wgpu::BindGroup,
    /// Group 2 of the water pipeline: the mirrored camera and its image.
    pub bind_group: wgpu::BindGroup,
    pub target: Texture,
    pub depth: Texture,
}

impl Mirror {
    /// Colour format of the reflection; linear HDR so the water shader
    /// tone maps it once together with the rest of the surface.
    pub const FORMAT: wgpu::TextureFormat = Texture::ENVIRONMENT_FORMAT;

    pub fn new(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        resolution: u32,
        level: f32,
    ) -> Self {
        // Zero exposure makes the shaders skip tone mapping
        let uniform = CameraUniform {
            exposure: 0.0,
            ..CameraUniform::new()
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mirror Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("mirror_camera_bind_group"),
        });

        let size = [resolution, resolution];
        let target = Texture::create_render_target(device, size, Self::FORMAT, "mirror_target");
        let depth = Texture::create_depth_texture(device, size, 1, "mirror_depth");
        let sampler = target.sampler_or_default(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &mk_bind_group_layout(device),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("mirror_bind_group"),
        });

        Self {
            level,
            uniform,
            buffer,
            camera_bind_group,
            bind_group,
            target,
            depth,
        }
    }

    /// Follows the main camera. Called once per frame before the reflection pass.
    pub fn update(&mut self, queue: &wgpu::Queue, camera: &Camera, projection: &Projection) {
        let (mirrored, view_proj) = mirror_view_proj(camera, projection, self.level);
        self.uniform.view_position = mirrored.position.to_homogeneous().into();
        self.uniform.view_proj = view_proj.into();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
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
        label: Some("mirror_bind_group_layout"),
    })
}
