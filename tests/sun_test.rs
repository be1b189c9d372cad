use beach_scene::{
    cgmath::{Deg, InnerSpace, Rad, Vector3},
    config::SceneConfig,
    pipelines::{sky::SkyUniform, water::WaterUniform},
    scene::{
        parameters::{Parameter, SceneParameters},
        sync_water,
    },
    sun::{SunParameters, from_spherical, to_spherical},
};

fn assert_close(actual: Vector3<f32>, expected: Vector3<f32>) {
    assert!(
        (actual - expected).magnitude() < 1e-5,
        "{actual:?} != {expected:?}"
    );
}

#[test]
fn should_point_straight_up_at_full_elevation() {
    let sun = SunParameters {
        elevation: 90.0,
        azimuth: 42.0,
    };
    assert_close(sun.direction(), Vector3::unit_y());
}

#[test]
fn should_measure_azimuth_from_z_towards_x() {
    let horizon = |azimuth| {
        SunParameters {
            elevation: 0.0,
            azimuth,
        }
        .direction()
    };
    assert_close(horizon(0.0), Vector3::unit_z());
    assert_close(horizon(90.0), Vector3::unit_x());
    assert_close(horizon(180.0), -Vector3::unit_z());
}

#[test]
fn should_sit_just_above_the_horizon_by_default() {
    let direction = SunParameters::default().direction();
    let elevation: Rad<f32> = Deg(2.0).into();
    assert!((direction.magnitude() - 1.0).abs() < 1e-5);
    assert!((direction.y - elevation.0.sin()).abs() < 1e-5);
    // azimuth 130° puts the sun towards +X and -Z
    assert!(direction.x > 0.0);
    assert!(direction.z < 0.0);
}

#[test]
fn should_invert_spherical_coordinates() {
    let v = Vector3::new(-3.0, 4.0, 12.0);
    let (radius, phi, theta) = to_spherical(v);
    assert!((radius - 13.0).abs() < 1e-4);
    assert_close(from_spherical(radius, phi, theta), v);
}

#[test]
fn should_map_the_zero_vector_to_zero() {
    let (radius, phi, theta) = to_spherical(Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(radius, 0.0);
    assert_eq!(phi, Rad(0.0));
    assert_eq!(theta, Rad(0.0));
}

#[test]
fn should_move_sky_and_water_together_when_the_sun_moves() {
    let config = SceneConfig::default();
    let mut parameters = SceneParameters::from_config(&config);
    let mut sky = SkyUniform::new(&config.sky, config.sun.direction());
    let mut water = WaterUniform::new(&config.water, config.sun.direction());
    let mut applied = None;
    assert!(sync_water(&mut water, &mut applied, &parameters).is_some());

    parameters.set(Parameter::Elevation, 30.0);
    parameters.set(Parameter::Azimuth, -60.0);
    let sun = sync_water(&mut water, &mut applied, &parameters).expect("the sun moved");
    sky.set_sun_position(sun);

    let phi: Rad<f32> = Deg(90.0 - 30.0).into();
    let theta: Rad<f32> = Deg(-60.0).into();
    let expected = Vector3::new(
        phi.0.sin() * theta.0.sin(),
        phi.0.cos(),
        phi.0.sin() * theta.0.cos(),
    );
    assert_close(Vector3::from(sky.sun_position), expected);
    assert_close(Vector3::from(water.sun_direction), expected.normalize());
}

#[test]
fn should_leave_the_sun_alone_when_only_the_waves_change() {
    let config = SceneConfig::default();
    let mut parameters = SceneParameters::from_config(&config);
    let mut water = WaterUniform::new(&config.water, config.sun.direction());
    let mut applied = None;
    sync_water(&mut water, &mut applied, &parameters);
    let sun_before = water.sun_direction;

    parameters.set(Parameter::DistortionScale, 3.5);
    parameters.set(Parameter::Size, 2.0);
    assert_eq!(sync_water(&mut water, &mut applied, &parameters), None);
    assert_eq!((water.distortion_scale, water.size), (3.5, 2.0));
    assert_eq!(water.sun_direction, sun_before);
    // nothing changed since the last sync
    assert_eq!(sync_water(&mut water, &mut applied, &parameters), None);
}
