//! GPU context and rendering state.
//!
//! This module provides [`Context`], which owns every GPU resource shared
//! between flows: the surface, device and queue, the orbit camera, the sky,
//! sun and baked environment, the water's mirror and the render pipelines.

use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, Camera, CameraResources, CameraUniform, OrbitController, Projection},
    config::SceneConfig,
    data_structures::texture,
    pipelines::{Pipelines, environment::Environment, mirror::Mirror},
};

/// The subset of the context flows need while they are being constructed.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            surface_format: ctx.config.format,
        }
    }
}

/// The main GPU and rendering context.
///
/// Flows receive it mutably in `on_init` and through `Out::Configure`, and
/// read-only everywhere else.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    /// Drawn into instead of the frame when multisampling; resolved into it.
    pub(crate) msaa_texture: Option<texture::Texture>,
    pub sample_count: u32,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub environment: Environment,
    pub mirror: Mirror,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
}

impl Context {
    pub async fn new(window: Arc<Window>, scene: &SceneConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("Could not open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour, so prefer an sRGB surface
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface supports no texture format")?;

        let config = wgpu::SurfaceConfiguration {
            #[cfg(not(feature = "integration-tests"))]
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            #[cfg(feature = "integration-tests")]
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let depth_features = adapter.get_texture_format_features(texture::Texture::DEPTH_FORMAT);
        let colour_features = adapter.get_texture_format_features(config.format);
        let sample_count = supported_sample_count(
            scene.sample_count(),
            colour_features.flags & depth_features.flags,
        );

        let projection = Projection::from_config(config.width, config.height, &scene.camera);
        let mut camera = Camera::new(scene.camera.position, scene.orbit.target);
        let mut controller = OrbitController::new(scene.orbit.clone(), config.height);
        // Start inside the orbit limits
        controller.update(&mut camera, &projection);

        let mut camera_uniform = CameraUniform {
            exposure: scene.camera.exposure,
            ..CameraUniform::new()
        };
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = camera::mk_bind_group_layout(&device);

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let environment = Environment::new(&device, &queue, scene);
        let mirror = Mirror::new(
            &device,
            &camera_bind_group_layout,
            scene.water.reflection_resolution,
            0.0,
        );
        let pipelines = Pipelines::new(
            &device,
            config.format,
            sample_count,
            &camera_bind_group_layout,
            &environment,
        );

        let (depth_texture, msaa_texture) = frame_targets(&device, &config, sample_count);

        log::info!(
            "Rendering {}x{} to {:?} at {}x MSAA with {:?}",
            config.width,
            config.height,
            config.format,
            sample_count,
            adapter.get_info().backend
        );

        Ok(Self {
            window,
            depth_texture,
            msaa_texture,
            sample_count,
            surface,
            device,
            queue,
            config,
            camera: CameraResources {
                camera,
                controller,
                uniform: camera_uniform,
                buffer: camera_buffer,
                bind_group: camera_bind_group,
                bind_group_layout: camera_bind_group_layout,
            },
            projection,
            environment,
            mirror,
            pipelines,
            clear_colour: wgpu::Color::BLACK,
            tick_duration_millis: scene.stats_interval_millis,
        })
    }
}

/// Applies a new window size to the surface configuration and projection.
///
/// A zero width or height (e.g. a minimised window) leaves both untouched
/// and returns `false`; the surface must then not be reconfigured.
pub fn apply_resize(
    config: &mut wgpu::SurfaceConfiguration,
    projection: &mut Projection,
    width: u32,
    height: u32,
) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    config.width = width;
    config.height = height;
    projection.resize(width, height);
    true
}

/// `requested` if both attachments can be multisampled that many times,
/// otherwise one.
pub fn supported_sample_count(requested: u32, flags: wgpu::TextureFormatFeatureFlags) -> u32 {
    if requested > 1 && flags.sample_count_supported(requested) {
        requested
    } else {
        1
    }
}

/// The depth attachment of the main pass and, when multisampling, the
/// colour attachment that resolves into the frame.
pub(crate) fn frame_targets(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> (texture::Texture, Option<texture::Texture>) {
    let size = [config.width, config.height];
    let depth = texture::Texture::create_depth_texture(device, size, sample_count, "depth_texture");
    let msaa = (sample_count > 1).then(|| {
        texture::Texture::create_multisampled_target(
            device,
            size,
            config.format,
            sample_count,
            "msaa_texture",
        )
    });
    (depth, msaa)
}
