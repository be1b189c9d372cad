//! Perspective camera with orbit controls.
//!
//! The camera always looks at a target point. [`OrbitController`] collects
//! pointer input (left drag rotates, right drag pans, wheel dollies) and
//! applies it once per frame in spherical coordinates around the target,
//! clamping distance and polar angle to the configured limits.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::{
    config::{CameraConfig, OrbitConfig},
    sun::{from_spherical, to_spherical},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle away from the poles where the view matrix degenerates.
const POLE_EPSILON: f32 = 0.000001;

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_config(width: u32, height: u32, config: &CameraConfig) -> Self {
        Self::new(width, height, config.fovy, config.znear, config.zfar)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// The camera data as laid out in the `Camera` WGSL struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub exposure: f32,
    pub _padding: [f32; 3],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            exposure: 1.0,
            _padding: [0.0; 3],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    Rotate,
    Pan,
}

#[derive(Debug)]
pub struct OrbitController {
    config: OrbitConfig,
    delta_theta: f32,
    delta_phi: f32,
    zoom: f32,
    pan_pixels: (f32, f32),
    drag: Option<Drag>,
    cursor: Option<PhysicalPosition<f64>>,
    viewport_height: f32,
    suspended: bool,
}

impl OrbitController {
    pub fn new(config: OrbitConfig, viewport_height: u32) -> Self {
        Self {
            config,
            delta_theta: 0.0,
            delta_phi: 0.0,
            zoom: 1.0,
            pan_pixels: (0.0, 0.0),
            drag: None,
            cursor: None,
            viewport_height: viewport_height.max(1) as f32,
            suspended: false,
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OrbitConfig) {
        self.config = config;
    }

    /// While suspended all pointer input is ignored, e.g. when another
    /// element owns the current drag.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
        if suspended {
            self.drag = None;
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Rotates by a pointer movement of `dx`, `dy` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        let full_turn = 2.0 * std::f32::consts::PI * self.config.rotate_speed;
        self.delta_theta -= full_turn * dx / self.viewport_height;
        self.delta_phi -= full_turn * dy / self.viewport_height;
    }

    /// Pans by a pointer movement of `dx`, `dy` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_pixels.0 += dx * self.config.pan_speed;
        self.pan_pixels.1 += dy * self.config.pan_speed;
    }

    /// Positive steps move the camera towards the target.
    pub fn zoom(&mut self, steps: f32) {
        let scale = 0.95f32.powf(self.config.zoom_speed);
        self.zoom *= scale.powf(steps);
    }

    /// Returns whether the event was used.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(size) => {
                self.viewport_height = size.height.max(1) as f32;
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                if self.suspended {
                    return false;
                }
                match (self.drag, previous) {
                    (Some(drag), Some(previous)) => {
                        let dx = (position.x - previous.x) as f32;
                        let dy = (position.y - previous.y) as f32;
                        match drag {
                            Drag::Rotate => self.rotate(dx, dy),
                            Drag::Pan => self.pan(dx, dy),
                        }
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if self.suspended {
                    return false;
                }
                match (button, state) {
                    (MouseButton::Left, ElementState::Pressed) => self.drag = Some(Drag::Rotate),
                    (MouseButton::Right, ElementState::Pressed) => self.drag = Some(Drag::Pan),
                    (_, ElementState::Released) => self.drag = None,
                    _ => return false,
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.suspended {
                    return false;
                }
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 50.0,
                };
                self.zoom(steps);
                true
            }
            _ => false,
        }
    }

    /// Applies the collected input to `camera` and clamps it to the limits.
    pub fn update(&mut self, camera: &mut Camera, projection: &Projection) {
        let offset = camera.position - camera.target;
        let (radius, phi, theta) = to_spherical(offset);

        if self.pan_pixels != (0.0, 0.0) {
            let forward = (-offset).normalize();
            let right = forward.cross(camera.up).normalize();
            let up = right.cross(forward);
            let target_distance = radius * (projection.fovy.0 / 2.0).tan();
            let per_pixel = 2.0 * target_distance / self.viewport_height;
            let shift = -right * (self.pan_pixels.0 * per_pixel) + up * (self.pan_pixels.1 * per_pixel);
            camera.target += shift;
        }

        let theta = theta.0 + self.delta_theta;
        let phi = (phi.0 + self.delta_phi)
            .min(self.config.max_polar_angle)
            .clamp(POLE_EPSILON, std::f32::consts::PI - POLE_EPSILON);
        let radius = (radius * self.zoom).clamp(self.config.min_distance, self.config.max_distance);

        camera.position = camera.target + from_spherical(radius, Rad(phi), Rad(theta));

        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.zoom = 1.0;
        self.pan_pixels = (0.0, 0.0);
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// Recomputes the uniform and uploads it.
    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}
