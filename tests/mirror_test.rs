use beach_scene::{
    camera::{Camera, Projection},
    cgmath::{Deg, Matrix4, Point3, Vector3, Vector4, perspective},
    pipelines::mirror::{mirror_camera, mirror_view_proj, oblique_near_plane},
};

fn projection() -> Projection {
    Projection::new(800, 600, Deg(55.0), 1.0, 20000.0)
}

fn camera() -> Camera {
    Camera::new((0.0, 50.0, 200.0), (0.0, 10.0, 0.0))
}

fn ndc(view_proj: Matrix4<f32>, p: Point3<f32>) -> Vector3<f32> {
    let clip = view_proj * Vector4::new(p.x, p.y, p.z, 1.0);
    clip.truncate() / clip.w
}

#[test]
fn should_reflect_the_camera_in_the_water_plane() {
    let mirrored = mirror_camera(&camera(), 0.0);
    assert_eq!(mirrored.position, Point3::new(0.0, -50.0, 200.0));
    assert_eq!(mirrored.target, Point3::new(0.0, -10.0, 0.0));
    assert_eq!(mirrored.up, Vector3::new(0.0, -1.0, 0.0));

    let back = mirror_camera(&mirrored, 0.0);
    assert_eq!(back.position, camera().position);
    assert_eq!(back.target, camera().target);
    assert_eq!(back.up, camera().up);
}

#[test]
fn should_reflect_about_a_raised_plane() {
    let mirrored = mirror_camera(&camera(), 5.0);
    assert_eq!(mirrored.position, Point3::new(0.0, -40.0, 200.0));
    assert_eq!(mirrored.target, Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn should_see_the_reflected_ray_where_it_leaves_the_water() {
    let (_, view_proj) = mirror_view_proj(&camera(), &projection(), 0.0);

    // The eye ray hits the water at the origin and bounces towards (0, 50, -200)
    let on_water = ndc(view_proj, Point3::new(0.0, 0.0, 0.0));
    let bounced = ndc(view_proj, Point3::new(0.0, 50.0, -200.0));

    assert!((on_water.x - bounced.x).abs() < 1e-4, "{on_water:?} {bounced:?}");
    assert!((on_water.y - bounced.y).abs() < 1e-4, "{on_water:?} {bounced:?}");
    assert!(on_water.z.abs() < 1e-3, "water plane lands on the near plane, got {}", on_water.z);
    assert!(bounced.z > 0.0 && bounced.z < 1.0, "depth {}", bounced.z);
}

#[test]
fn should_clip_everything_below_the_water() {
    let (_, view_proj) = mirror_view_proj(&camera(), &projection(), 0.0);
    let submerged = ndc(view_proj, Point3::new(0.0, -5.0, 100.0));
    assert!(submerged.z < 0.0, "depth {}", submerged.z);
}

#[test]
fn should_leave_the_projection_alone_for_a_degenerate_plane() {
    let lens = perspective(Deg(55.0), 4.0 / 3.0, 1.0, 20000.0);
    assert_eq!(oblique_near_plane(lens, Vector4::new(0.0, 0.0, 0.0, 0.0)), lens);
}
