#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod lifecycle {
    use beach_scene::{
        config::SceneConfig,
        context::Context,
        flow::{FlowConstructor, GraphicsFlow, ImageTestResult, Out},
        render::Render,
    };

    use crate::common::test_utils::State;

    pub(crate) enum Event {
        Loaded,
    }

    pub(crate) struct GraphicsElement;

    const MARKER: wgpu::Color = wgpu::Color {
        r: 0.25,
        g: 0.5,
        b: 0.75,
        a: 1.0,
    };

    impl GraphicsFlow<State, Event> for GraphicsElement {
        fn on_init(&mut self, _: &mut Context, state: &mut State) -> Out<Event> {
            assert_eq!(state.frame_counter(), 0);
            assert_eq!(state.init_invocations(), 0);
            assert_eq!(state.update_invocations(), 0);
            state.init();
            Out::Empty
        }

        fn on_update(
            &mut self,
            ctx: &Context,
            state: &mut State,
            _: instant::Duration,
        ) -> Out<Event> {
            assert_eq!(state.frame_counter(), state.update_invocations());
            assert_eq!(state.init_invocations(), 1);
            state.frame();
            state.update();

            match state.frame_counter() {
                3 => Out::Spawn(vec![Box::pin(async { Event::Loaded })]),
                4 => Out::Configure(Box::new(|ctx: &mut Context| ctx.clear_colour = MARKER)),
                x if x > 4 => {
                    assert_eq!(ctx.clear_colour, MARKER);
                    Out::Empty
                }
                _ => Out::Empty,
            }
        }

        fn on_tick(&mut self, _: &Context, _: &mut State) -> Out<Event> {
            Out::Empty
        }

        fn on_window_events(
            &mut self,
            _: &Context,
            _: &mut State,
            _: &beach_scene::WindowEvent,
        ) -> Out<Event> {
            Out::Empty
        }

        fn on_custom_events(&mut self, _: &Context, state: &mut State, event: Event) -> Option<Event> {
            match event {
                Event::Loaded => {
                    // spawned in frame 3, delivered no earlier than the next frame
                    assert!(state.update_invocations() >= 3);
                    state.loaded();
                    None
                }
            }
        }

        fn on_render<'pass>(&self) -> Render<'_, 'pass> {
            Render::None
        }

        fn render_to_texture(
            &self,
            _: &Context,
            state: &mut State,
            _: &mut image::RgbaImage,
        ) -> Result<ImageTestResult, anyhow::Error> {
            if state.frame_counter() > 5 && state.loaded_events() == 1 {
                Ok(ImageTestResult::Passed)
            } else {
                Ok(ImageTestResult::Waiting)
            }
        }
    }

    pub(crate) fn run() -> anyhow::Result<()> {
        let constructor: FlowConstructor<State, Event> = Box::new(|_| {
            Box::pin(async move { Box::new(GraphicsElement) as Box<dyn GraphicsFlow<_, _>> })
        });
        beach_scene::flow::run(SceneConfig::default(), vec![constructor])
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_deliver_loads_and_configure_the_context() {
    if let Err(e) = lifecycle::run() {
        panic!("{e:#}");
    }
}
