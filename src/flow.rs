//! Flow control and application event loop.
//!
//! This module provides the main event loop and the flow abstraction. A
//! "flow" is a unit of scene logic that handles input, updates its state
//! and provides renderable objects each frame. The engine owns a list of
//! flows, distributes events to them and composes their renders.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for scenes that handle events and rendering
//! - [`Out<E>`] is the output type for background loads and context configuration
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each frame:
//! 1. Pass window events to every flow, then to the orbit controller
//! 2. Hand finished background loads to `on_custom_events`
//! 3. Update flow state (via `on_update`) and the camera
//! 4. Call flows' `on_render()` and sort the results into pipeline batches
//! 5. Render the shadow map, then sky, opaque, custom, shadow catcher and panel geometry
//! 6. Present frame and run `on_tick` when the tick interval elapsed

use std::{
    fmt::Debug,
    iter,
    pin::Pin,
    sync::{Arc, mpsc},
};

use instant::{Duration, Instant};

#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::{Context, InitContext, apply_resize, frame_targets},
    data_structures::model::{DrawModel, DrawShadow},
    render::{Batches, Instanced},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// `Send` on native targets, where background loads run on a thread pool.
/// On the web everything stays on the browser's thread and no bound applies.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + ?Sized> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}

/// A background load resolving to an event for `on_custom_events`.
#[cfg(not(target_arch = "wasm32"))]
pub type Load<E> = Pin<Box<dyn Future<Output = E> + Send + 'static>>;
#[cfg(target_arch = "wasm32")]
pub type Load<E> = Pin<Box<dyn Future<Output = E> + 'static>>;

///
/// This is the Output Type for every lifecycle hook where the user can pass async work that is
/// handled according to the platform you're running on.
///
/// `Out::Spawn` starts each load in the background: on the tokio runtime natively and with
/// `spawn_local` on the web. Results are queued and handed to `on_custom_events` at the start of
/// a later frame; the render loop never waits for them.
///
/// `Out::Configure` can be used to modify the Context during runtime, for instance to re-bake the
/// environment or to suspend the orbit controls.
///
/// `Empty` is the default output used when nothing needs to be handled.
///
pub enum Out<E> {
    Spawn(Vec<Load<E>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<E> Default for Out<E> {
    fn default() -> Self {
        Self::Empty
    }
}

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// Trait for implementing a renderable part of the scene.
///
/// A `GraphicsFlow` manages a self-contained portion of the application:
/// rendering, input handling and state updates. The engine coordinates
/// multiple flows, passes events to them, and composes their renders.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure context (camera, environment, etc.)
/// 2. `on_window_events()` is called for each winit window event
/// 3. `on_custom_events()` is called with the result of every finished background load
/// 4. `on_update()` is called every frame
/// 5. `on_tick()` is called every `tick_duration_millis`
/// 6. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<E>;

    /// Update state every frame with the elapsed time `dt`.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<E>;

    /// Called every `tick_duration_millis` milliseconds (configurable via context).
    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Out<E>;

    /// Handle window events (mouse, window resizing, etc.). Flows see every
    /// event before the orbit controller does.
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<E>;

    /// Handle the result of a background load.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Return renderable objects for this flow.
    ///
    /// Called each frame. Collect your objects into a [`Render`](crate::render::Render) and
    /// return it. The engine will batch and render all flows' renders in pipeline order.
    fn on_render<'pass>(&self) -> crate::render::Render<'_, 'pass>;

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut S,
        texture: &mut image::RgbaImage,
    ) -> Result<ImageTestResult, anyhow::Error>;
}

// Dummy impl to make wasm work
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`. This allows lazy initialization and resource loading.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if apply_resize(
            &mut self.ctx.config,
            &mut self.ctx.projection,
            width,
            height,
        ) {
            self.is_surface_configured = true;
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            let (depth, msaa) =
                frame_targets(&self.ctx.device, &self.ctx.config, self.ctx.sample_count);
            self.ctx.depth_texture = depth;
            self.ctx.msaa_texture = msaa;
        }
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.ctx.config.width,
            height: self.ctx.config.height,
            depth_or_array_layers: 1,
        }
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_texture(&self) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Golden Image Test Output Texture"),
            size: self.get_test_extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.ctx.config.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    /// Renders the sun's view of every shadow casting object into the shadow map.
    fn draw_shadows(&self, encoder: &mut wgpu::CommandEncoder, casters: &[Instanced]) {
        let sun = &self.ctx.environment.sun;
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &sun.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        shadow_pass.set_pipeline(&self.ctx.pipelines.shadow);
        for instanced in casters.iter().filter(|i| has_instances(i)) {
            shadow_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            shadow_pass.draw_model_depth(
                instanced.model,
                0..instanced.amount as u32,
                &sun.bind_group,
            );
        }
    }

    /// Draws the sky and opaque meshes as seen from below the water into
    /// the mirror target. Water, catchers and the panel are left out.
    fn draw_reflection(&self, encoder: &mut wgpu::CommandEncoder, basics: &[Instanced]) {
        let ctx = &self.ctx;
        let mirror = &ctx.mirror;
        let mut reflection_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Reflection Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &mirror.target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &mirror.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        reflection_pass.set_pipeline(&ctx.pipelines.mirror_sky);
        ctx.environment
            .sky
            .draw(&mut reflection_pass, &mirror.camera_bind_group);

        reflection_pass.set_pipeline(&ctx.pipelines.mirror_standard);
        draw_instanced(&mut reflection_pass, ctx, &mirror.camera_bind_group, basics);
    }

    fn render<Event>(
        &mut self,
        graphics_flows: &mut [Box<dyn GraphicsFlow<State, Event>>],
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] event_loop: &winit::event_loop::EventLoopProxy<
            FlowEvent<State, Event>,
        >,
    ) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        #[cfg(not(feature = "integration-tests"))]
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        #[cfg(feature = "integration-tests")]
        let test_texture = self.get_test_texture();
        #[cfg(feature = "integration-tests")]
        let view = test_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut batches = Batches::default();
        graphics_flows
            .iter()
            .for_each(|flow| flow.on_render().batch(&mut batches));

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        self.draw_shadows(&mut encoder, &batches.basics);
        self.draw_reflection(&mut encoder, &batches.basics);

        {
            let ctx = &self.ctx;
            // Multisampled frames are drawn off screen and resolved into the view
            let (target, resolve_target) = match &ctx.msaa_texture {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            render_pass.set_pipeline(&ctx.pipelines.sky);
            ctx.environment
                .sky
                .draw(&mut render_pass, &ctx.camera.bind_group);

            render_pass.set_pipeline(&ctx.pipelines.standard);
            draw_instanced(&mut render_pass, ctx, &ctx.camera.bind_group, &batches.basics);

            for custom in std::mem::take(&mut batches.customs) {
                custom(ctx, &mut render_pass);
            }

            render_pass.set_pipeline(&ctx.pipelines.shadow_catcher);
            draw_instanced(&mut render_pass, ctx, &ctx.camera.bind_group, &batches.catchers);

            render_pass.set_pipeline(&ctx.pipelines.panel);
            for flat in batches.panels.iter().filter(|flat| flat.amount > 0) {
                render_pass.set_vertex_buffer(0, flat.vertex.slice(..));
                render_pass.set_index_buffer(flat.index.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..flat.amount as u32, 0, 0..1);
            }
        }
        // Release the batches' borrows of `graphics_flows`
        drop(batches);

        #[cfg(feature = "integration-tests")]
        let (output_buffer, padded_row) = {
            let u32_size = std::mem::size_of::<u32>() as u32;
            let extent = self.get_test_extent();
            let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
            let padded_row = (u32_size * extent.width).div_ceil(align) * align;
            let output_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
                size: (padded_row * extent.height) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                label: Some("Golden Image Readback Buffer"),
                mapped_at_creation: false,
            });
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &test_texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &output_buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(padded_row),
                        rows_per_image: Some(extent.height),
                    },
                },
                extent,
            );
            (output_buffer, padded_row)
        };

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        {
            let extent = self.get_test_extent();
            let is_bgra = matches!(
                self.ctx.config.format,
                wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
            );
            let fut_img = async {
                let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
                let buffer_slice = output_buffer.slice(..);
                buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
                    tx.send(result).ok();
                });
                self.ctx
                    .device
                    .poll(wgpu::PollType::Wait {
                        submission_index: None,
                        timeout: Some(Duration::from_secs(3)),
                    })
                    .ok();
                rx.receive().await?.ok()?;
                let data = buffer_slice.get_mapped_range();
                let row_bytes = (extent.width * 4) as usize;
                let mut pixels = Vec::with_capacity(row_bytes * extent.height as usize);
                for row in data.chunks(padded_row as usize) {
                    pixels.extend_from_slice(&row[..row_bytes]);
                }
                if is_bgra {
                    pixels.chunks_exact_mut(4).for_each(|px| px.swap(0, 2));
                }
                image::RgbaImage::from_raw(extent.width, extent.height, pixels)
            };
            let mut img = match async_runtime.block_on(fut_img) {
                Some(img) => img,
                None => panic!("Could not read back the rendered frame"),
            };
            let state = &mut self.state;
            let all_passed = graphics_flows
                .iter_mut()
                .map(|flow| flow.render_to_texture(&self.ctx, state, &mut img))
                .map(|res| match res {
                    Err(e) => panic!("{}", e),
                    Ok(ImageTestResult::Passed) => true,
                    Ok(ImageTestResult::Failed) => panic!("Assertion failed"),
                    Ok(ImageTestResult::Waiting) => false,
                })
                .fold(true, |all, passed| all && passed);
            if all_passed && event_loop.send_event(FlowEvent::Exit).is_err() {
                panic!("All assertions passed but the winit event-loop could not safely exit")
            }
        }

        output.present();
        Ok(())
    }
}

fn has_instances(instanced: &Instanced) -> bool {
    if instanced.amount == 0 || instanced.instance.size() == 0 {
        log::warn!("you attemted to render something with zero instances");
        return false;
    }
    true
}

fn draw_instanced(
    render_pass: &mut wgpu::RenderPass,
    ctx: &Context,
    camera: &wgpu::BindGroup,
    batch: &[Instanced],
) {
    for instanced in batch.iter().filter(|i| has_instances(i)) {
        render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        render_pass.draw_model_instanced(
            instanced.model,
            0..instanced.amount as u32,
            camera,
            &ctx.environment.lighting_bind_group,
        );
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    // Web init and the image tests report back through the event loop
    #[cfg(any(target_arch = "wasm32", feature = "integration-tests"))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    config: SceneConfig,
    state: Option<AppState<State>>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    // Finished background loads, drained once per frame
    loaded_tx: mpsc::Sender<Event>,
    loaded_rx: mpsc::Receiver<Event>,
    init_error: Option<anyhow::Error>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl<State, Event> App<State, Event>
where
    State: 'static,
    Event: 'static,
{
    #[cfg_attr(
        not(any(target_arch = "wasm32", feature = "integration-tests")),
        allow(unused_variables)
    )]
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        config: SceneConfig,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> anyhow::Result<Self> {
        #[cfg(any(target_arch = "wasm32", feature = "integration-tests"))]
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let (loaded_tx, loaded_rx) = mpsc::channel();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            #[cfg(any(target_arch = "wasm32", feature = "integration-tests"))]
            proxy,
            config,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            loaded_tx,
            loaded_rx,
            init_error: None,
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        })
    }
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
    #[allow(dead_code)]
    Exit,
}

impl<State: 'static + Default, Event: 'static + MaybeSend>
    ApplicationHandler<FlowEvent<State, Event>> for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Only the first resume builds the scene
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Beach");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {e}");
                self.init_error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        let config = self.config.clone();
        let init_future = async move {
            let app_state = AppState::new(window, &config).await?;

            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((app_state, flows)) => self.initialize(app_state, flows),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {e:#}");
                    self.init_error = Some(e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((app_state, flows)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized {
                                state: app_state,
                                flows,
                            })
                            .is_err()
                        {
                            log::error!("The event loop closed during initialization");
                        }
                    }
                    Err(e) => {
                        log::error!("App initialization failed. Cannot create the main context: {e:#}")
                    }
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // This is the message from our wasm `spawn_local`
                self.initialize(state, flows);
            }
            FlowEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        self.graphics_flows.iter_mut().for_each(|f| {
            let out = f.on_window_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut state.ctx,
                &self.loaded_tx,
                out,
            );
        });

        // general stuff
        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                // Results of background loads; a late one simply arrives on a later frame
                while let Ok(loaded) = self.loaded_rx.try_recv() {
                    let unconsumed = self
                        .graphics_flows
                        .iter_mut()
                        .fold(Some(loaded), |event, flow| {
                            flow.on_custom_events(&state.ctx, &mut state.state, event?)
                        });
                    if unconsumed.is_some() {
                        log::warn!("A loaded resource was not consumed by any flow");
                    }
                }

                self.graphics_flows.iter_mut().for_each(|f| {
                    let out = f.on_update(&state.ctx, &mut state.state, dt);
                    handle_flow_output(
                        #[cfg(not(target_arch = "wasm32"))]
                        &self.async_runtime,
                        &mut state.ctx,
                        &self.loaded_tx,
                        out,
                    );
                });

                // Update the camera
                let ctx = &mut state.ctx;
                ctx.camera
                    .controller
                    .update(&mut ctx.camera.camera, &ctx.projection);
                ctx.camera.write_to_buffer(&ctx.queue, &ctx.projection);
        ctx.mirror
            .update(&ctx.queue, &ctx.camera.camera, &ctx.projection);

                match state.render(
                    &mut self.graphics_flows,
                    #[cfg(feature = "integration-tests")]
                    &self.async_runtime,
                    #[cfg(feature = "integration-tests")]
                    &self.proxy,
                ) {
                    Ok(_) => {
                        if self.time_since_tick
                            >= Duration::from_millis(state.ctx.tick_duration_millis)
                        {
                            self.graphics_flows.iter_mut().for_each(|f| {
                                let out = f.on_tick(&state.ctx, &mut state.state);
                                handle_flow_output(
                                    #[cfg(not(target_arch = "wasm32"))]
                                    &self.async_runtime,
                                    &mut state.ctx,
                                    &self.loaded_tx,
                                    out,
                                );
                            });
                            self.time_since_tick = Duration::from_millis(0);
                        }
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

impl<State: 'static + Default, Event: 'static + MaybeSend> App<State, Event> {
    fn initialize(
        &mut self,
        mut app_state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    ) {
        self.graphics_flows = flows;
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        self.graphics_flows.iter_mut().for_each(|flow| {
            let out = flow.on_init(&mut app_state.ctx, &mut app_state.state);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut app_state.ctx,
                &self.loaded_tx,
                out,
            );
        });
        app_state.ctx.window.request_redraw();
        self.last_time = Instant::now();
        self.state = Some(app_state);
    }
}

fn handle_flow_output<Event: MaybeSend + 'static>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    ctx: &mut Context,
    loaded_tx: &mpsc::Sender<Event>,
    out: Out<Event>,
) {
    match out {
        // Fire and forget; the result is queued for the next frames
        Out::Spawn(loads) => {
            for load in loads {
                let loaded_tx = loaded_tx.clone();
                let task = async move {
                    let event = load.await;
                    if loaded_tx.send(event).is_err() {
                        log::warn!("A load finished after the event loop closed");
                    }
                };
                #[cfg(not(target_arch = "wasm32"))]
                async_runtime.spawn(task);
                #[cfg(target_arch = "wasm32")]
                wasm_bindgen_futures::spawn_local(task);
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

pub fn run<State: 'static + Default, Event: 'static + MaybeSend>(
    config: SceneConfig,
    constructors: Vec<FlowConstructor<State, Event>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;

    let mut app: App<State, Event> = App::new(&event_loop, config, constructors)?;

    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
