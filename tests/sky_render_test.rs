#[cfg(feature = "integration-tests")]
#[macro_use]
mod common;

// winit allows one event loop per process, so every render test lives in its own file.
#[test]
#[cfg(feature = "integration-tests")]
fn should_cover_the_frame_with_opaque_sky() {
    use beach_scene::context::Context;

    use crate::common::test_utils::{FrameCounter, TestRender, ValidateResult};

    golden_image_test!(TestRender::new(
        |ctx: &mut Context| {
            // Anything left at the clear colour would show up magenta
            ctx.clear_colour = wgpu::Color {
                r: 1.0,
                g: 0.0,
                b: 1.0,
                a: 0.0,
            };
        },
        |ctx: &Context, state: &mut FrameCounter, actual| {
            if state.frame() == 0 {
                return Ok(ValidateResult::Waiting);
            }
            assert_eq!(actual.dimensions(), (ctx.config.width, ctx.config.height));
            for (x, y, pixel) in actual.enumerate_pixels() {
                assert_eq!(pixel[3], 255, "transparent pixel at ({x}, {y})");
            }
            let top = actual.get_pixel(actual.width() / 2, 0);
            assert!(top[2] >= top[0], "zenith should be blue, got {top:?}");
            Ok(ValidateResult::Passed)
        },
    ));
}
