use beach_scene::{
    camera::{Camera, OrbitController, Projection},
    cgmath::{Deg, InnerSpace, Point3},
    config::{CameraConfig, OrbitConfig},
    context::apply_resize,
};
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
};

fn projection() -> Projection {
    Projection::from_config(800, 600, &CameraConfig::default())
}

fn polar_angle(camera: &Camera) -> f32 {
    let offset = camera.position - camera.target;
    (offset.y / offset.magnitude()).acos()
}

#[test]
fn should_clamp_the_distance_to_the_target() {
    let config = OrbitConfig::default();
    let mut controller = OrbitController::new(config.clone(), 600);

    let mut far = Camera::new([0.0, 10.0, 20000.0], config.target);
    controller.update(&mut far, &projection());
    assert!((far.distance() - config.max_distance).abs() < 1e-1);

    let mut near = Camera::new([0.0, 11.0, 0.5], config.target);
    controller.update(&mut near, &projection());
    assert!((near.distance() - config.min_distance).abs() < 1e-3);
}

#[test]
fn should_never_look_from_below_the_horizon() {
    let config = OrbitConfig::default();
    let mut controller = OrbitController::new(config.clone(), 600);
    let mut camera = Camera::new([0.0, -500.0, 100.0], config.target);
    controller.update(&mut camera, &projection());
    assert!(polar_angle(&camera) <= config.max_polar_angle + 1e-4);
    assert!(camera.position.y > camera.target.y);

    // dragging further down stays on the limit
    controller.rotate(0.0, -10000.0);
    controller.update(&mut camera, &projection());
    assert!(polar_angle(&camera) <= config.max_polar_angle + 1e-4);
}

#[test]
fn should_rotate_around_the_target_at_constant_distance() {
    let config = OrbitConfig::default();
    let mut controller = OrbitController::new(config.clone(), 600);
    let mut camera = Camera::new(CameraConfig::default().position, config.target);
    controller.update(&mut camera, &projection());
    let distance = camera.distance();
    let before = camera.position;

    controller.rotate(120.0, 0.0);
    controller.update(&mut camera, &projection());
    assert!((camera.distance() - distance).abs() < 1e-2);
    assert!((camera.position - before).magnitude() > 1.0);
}

#[test]
fn should_dolly_towards_the_target_when_zooming_in() {
    let config = OrbitConfig::default();
    let mut controller = OrbitController::new(config.clone(), 600);
    let mut camera = Camera::new(CameraConfig::default().position, config.target);
    controller.update(&mut camera, &projection());
    let distance = camera.distance();

    controller.zoom(3.0);
    controller.update(&mut camera, &projection());
    assert!(camera.distance() < distance);
}

#[test]
fn should_pan_target_and_camera_together() {
    let config = OrbitConfig::default();
    let mut controller = OrbitController::new(config.clone(), 600);
    let mut camera = Camera::new(CameraConfig::default().position, config.target);
    controller.update(&mut camera, &projection());
    let offset = camera.position - camera.target;

    controller.pan(50.0, 0.0);
    controller.update(&mut camera, &projection());
    assert_ne!(camera.target, Point3::new(0.0, 10.0, 0.0));
    assert!(((camera.position - camera.target) - offset).magnitude() < 1e-1);
}

fn press(button: MouseButton, state: ElementState) -> WindowEvent {
    WindowEvent::MouseInput {
        device_id: unsafe { DeviceId::dummy() },
        state,
        button,
    }
}

fn cursor(x: f64, y: f64) -> WindowEvent {
    WindowEvent::CursorMoved {
        device_id: unsafe { DeviceId::dummy() },
        position: PhysicalPosition::new(x, y),
    }
}

fn drag(controller: &mut OrbitController, from: (f64, f64), to: (f64, f64)) {
    controller.handle_window_events(&cursor(from.0, from.1));
    controller.handle_window_events(&press(MouseButton::Left, ElementState::Pressed));
    controller.handle_window_events(&cursor(to.0, to.1));
    controller.handle_window_events(&press(MouseButton::Left, ElementState::Released));
}

#[test]
fn should_ignore_pointer_drags_while_suspended() {
    let config = OrbitConfig::default();
    let mut controller = OrbitController::new(config.clone(), 600);
    let mut camera = Camera::new(CameraConfig::default().position, config.target);
    controller.update(&mut camera, &projection());
    let resting = camera.position;

    // a slider owns the drag
    controller.set_suspended(true);
    drag(&mut controller, (900.0, 40.0), (600.0, 300.0));
    controller.handle_window_events(&WindowEvent::MouseWheel {
        device_id: unsafe { DeviceId::dummy() },
        delta: MouseScrollDelta::LineDelta(0.0, 5.0),
        phase: TouchPhase::Moved,
    });
    controller.update(&mut camera, &projection());
    assert!((camera.position - resting).magnitude() < 1e-3);

    // once released the same drag orbits again
    controller.set_suspended(false);
    drag(&mut controller, (900.0, 40.0), (600.0, 300.0));
    controller.update(&mut camera, &projection());
    assert!((camera.position - resting).magnitude() > 1.0);
}

#[test]
fn should_end_a_drag_when_suspended_mid_way() {
    let config = OrbitConfig::default();
    let mut controller = OrbitController::new(config.clone(), 600);
    let mut camera = Camera::new(CameraConfig::default().position, config.target);
    controller.update(&mut camera, &projection());
    let resting = camera.position;

    controller.handle_window_events(&cursor(100.0, 100.0));
    controller.handle_window_events(&press(MouseButton::Left, ElementState::Pressed));
    controller.set_suspended(true);
    controller.set_suspended(false);
    controller.handle_window_events(&cursor(400.0, 100.0));
    controller.update(&mut camera, &projection());
    assert!((camera.position - resting).magnitude() < 1e-3);
}

fn surface_config() -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu::TextureFormat::Bgra8UnormSrgb,
        width: 800,
        height: 600,
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
    }
}

#[test]
fn should_apply_a_new_window_size() {
    let mut config = surface_config();
    let mut projection = Projection::new(800, 600, Deg(55.0), 1.0, 20000.0);
    assert!(apply_resize(&mut config, &mut projection, 1200, 400));
    assert_eq!((config.width, config.height), (1200, 400));
    assert_eq!(projection.aspect(), 3.0);
}

#[test]
fn should_ignore_a_minimised_window() {
    let mut config = surface_config();
    let mut projection = Projection::new(800, 600, Deg(55.0), 1.0, 20000.0);
    assert!(!apply_resize(&mut config, &mut projection, 0, 400));
    assert!(!apply_resize(&mut config, &mut projection, 1200, 0));
    assert_eq!((config.width, config.height), (800, 600));
    assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
}
