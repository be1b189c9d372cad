use std::mem::size_of;

use beach_scene::{
    camera::CameraUniform,
    cgmath::{EuclideanSpace, InnerSpace, Vector3, Vector4},
    config::{SkyConfig, SunLightConfig},
    data_structures::{instance::InstanceRaw, model::MaterialUniform},
    pipelines::{
        environment::CUBE_FACES,
        panel::PanelVertex,
        shadow::{LightUniform, light_view_proj},
        sky::SkyUniform,
        water::WaterUniform,
    },
    sun::SunParameters,
};

#[test]
fn should_match_wgsl_uniform_layouts() {
    assert_eq!(size_of::<CameraUniform>(), 96);
    assert_eq!(size_of::<MaterialUniform>(), 48);
    assert_eq!(size_of::<LightUniform>(), 96);
    assert_eq!(size_of::<SkyUniform>(), 48);
    assert_eq!(size_of::<WaterUniform>(), 64);
    assert_eq!(size_of::<InstanceRaw>(), (16 + 9) * 4);
    assert_eq!(size_of::<PanelVertex>(), 6 * 4);
}

#[test]
fn should_span_the_cube_with_orthonormal_faces() {
    for face in CUBE_FACES.iter() {
        let forward = Vector3::from(face.forward);
        let right = Vector3::from(face.right);
        let up = Vector3::from(face.up);
        assert_eq!(forward.dot(right), 0.0);
        assert_eq!(forward.dot(up), 0.0);
        assert_eq!(right.dot(up), 0.0);
        assert!((face.direction(0.0, 0.0) - forward).magnitude() < 1e-6);
        assert!((face.direction(1.0, -1.0).magnitude() - 1.0).abs() < 1e-6);
    }
    let sum = CUBE_FACES
        .iter()
        .fold(Vector3::new(0.0, 0.0, 0.0), |sum, face| sum + Vector3::from(face.forward));
    assert_eq!(sum, Vector3::new(0.0, 0.0, 0.0));
}

fn to_ndc(point: Vector4<f32>) -> Vector3<f32> {
    point.truncate() / point.w
}

#[test]
fn should_center_the_shadow_map_on_the_beach() {
    let config = SunLightConfig::default();
    for sun in [
        SunParameters::default(),
        SunParameters {
            elevation: 90.0,
            azimuth: 0.0,
        },
        SunParameters {
            elevation: 35.0,
            azimuth: -120.0,
        },
    ] {
        let direction = sun.direction();
        let matrix = light_view_proj(&config, direction);
        let center = to_ndc(matrix * config.shadow_center.to_homogeneous());
        assert!(center.x.abs() < 1e-3 && center.y.abs() < 1e-3, "{center:?}");
        assert!((0.0..=1.0).contains(&center.z));

        // a point between the beach and the sun is closer to the light
        let towards_sun = config.shadow_center.to_vec() + direction * 100.0;
        let closer = to_ndc(matrix * towards_sun.extend(1.0));
        assert!(closer.z < center.z);
    }
}

#[test]
fn should_normalise_the_light_direction() {
    let light = LightUniform::new(&SunLightConfig::default(), Vector3::new(0.0, 5.0, 0.0));
    assert_eq!(light.direction, [0.0, 1.0, 0.0]);
    let fallback = LightUniform::new(&SunLightConfig::default(), Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(fallback.direction, [0.0, 1.0, 0.0]);
}

#[test]
fn should_store_the_sun_in_the_sky_uniform() {
    let sun = SunParameters::default().direction();
    let sky = SkyUniform::new(&SkyConfig::default(), sun);
    let expected: [f32; 3] = sun.into();
    assert_eq!(sky.sun_position, expected);
    assert_eq!(sky.up, [0.0, 1.0, 0.0]);
    assert_eq!(sky.turbidity, 10.0);
}
