#![allow(dead_code)]

#[cfg(feature = "integration-tests")]
use beach_scene::flow::ImageTestResult;
use beach_scene::{
    context::Context,
    flow::{GraphicsFlow, Out},
    render::Render,
};

/// Counts how often each lifecycle hook ran.
#[derive(Debug, Default)]
pub(crate) struct State {
    frame_counter: u32,
    init_invocations: u32,
    update_invocations: u32,
    loaded_events: u32,
    pub configured: bool,
}

impl State {
    pub fn frame(&mut self) {
        self.frame_counter += 1;
    }

    pub fn init(&mut self) {
        self.init_invocations += 1;
    }

    pub fn update(&mut self) {
        self.update_invocations += 1;
    }

    pub fn loaded(&mut self) {
        self.loaded_events += 1;
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn init_invocations(&self) -> u32 {
        self.init_invocations
    }

    pub fn update_invocations(&self) -> u32 {
        self.update_invocations
    }

    pub fn loaded_events(&self) -> u32 {
        self.loaded_events
    }
}

#[derive(Default)]
pub(crate) struct FrameCounter(pub(crate) u32);

impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn progress(&mut self) {
        self.0 += 1;
    }
}

pub(crate) type Validate =
    dyn Fn(&Context, &mut FrameCounter, &mut image::RgbaImage) -> anyhow::Result<ValidateResult>;

/// Outcome of a single frame check, mirrored onto `ImageTestResult`.
pub(crate) enum ValidateResult {
    Passed,
    Waiting,
}

/// A flow that configures the context once and checks every rendered frame.
pub(crate) struct TestRender {
    pub(crate) setup: Box<dyn Fn(&mut Context)>,
    pub(crate) validate: Box<Validate>,
}

impl TestRender {
    pub(crate) fn new(
        setup: impl Fn(&mut Context) + 'static,
        validate: impl Fn(&Context, &mut FrameCounter, &mut image::RgbaImage) -> anyhow::Result<ValidateResult>
        + 'static,
    ) -> Self {
        Self {
            setup: Box::new(setup),
            validate: Box::new(validate),
        }
    }
}

impl GraphicsFlow<FrameCounter, ()> for TestRender {
    fn on_init(&mut self, ctx: &mut Context, _: &mut FrameCounter) -> Out<()> {
        (self.setup)(ctx);
        Out::Empty
    }

    fn on_update(&mut self, _: &Context, state: &mut FrameCounter, _: instant::Duration) -> Out<()> {
        state.progress();
        Out::Empty
    }

    fn on_tick(&mut self, _: &Context, _: &mut FrameCounter) -> Out<()> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &beach_scene::WindowEvent,
    ) -> Out<()> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut FrameCounter, event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::None
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut FrameCounter,
        texture: &mut image::RgbaImage,
    ) -> Result<ImageTestResult, anyhow::Error> {
        Ok(match (self.validate)(ctx, state, texture)? {
            ValidateResult::Passed => ImageTestResult::Passed,
            ValidateResult::Waiting => ImageTestResult::Waiting,
        })
    }
}

#[macro_export]
macro_rules! golden_image_test {
    ($graphics_elem:expr) => {{
        use beach_scene::config::SceneConfig;
        use beach_scene::flow::{FlowConstructor, GraphicsFlow};
        use $crate::common::test_utils::FrameCounter;
        let constructor: FlowConstructor<FrameCounter, ()> = Box::new(|_| {
            Box::pin(async move {
                let g_flow: Box<dyn GraphicsFlow<FrameCounter, ()>> = Box::new($graphics_elem);
                g_flow
            })
        });

        beach_scene::flow::run(SceneConfig::default(), vec![constructor])
            .expect("Failed to run flow for integration test.");
    }};
}
