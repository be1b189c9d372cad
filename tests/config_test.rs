use beach_scene::{
    cgmath::Vector3,
    config::{BeachConfig, PropKind, SceneConfig, srgb_hex},
    context::supported_sample_count,
    resources::texture::resolve_relative,
    scene::{
        dune_uv_repeat,
        parameters::{Changes, Parameter, SceneParameters},
    },
};

#[test]
fn should_linearise_srgb_hex_colours() {
    let close = |a: f32, b: f32| (a - b).abs() < 1e-5;
    assert!(srgb_hex(0xffffff).iter().all(|&c| close(c, 1.0)));
    assert_eq!(srgb_hex(0x000000), [0.0, 0.0, 0.0]);
    let [r, g, b] = srgb_hex(0x808080);
    assert!(close(r, 0.2158605));
    assert_eq!(r, g);
    assert_eq!(g, b);
    let [r, g, b] = srgb_hex(0xff0000);
    assert!(close(r, 1.0));
    assert_eq!((g, b), (0.0, 0.0));
}

#[test]
fn should_author_the_beach_scene() {
    let config = SceneConfig::default();
    assert_eq!(config.sun.elevation, 2.0);
    assert_eq!(config.sun.azimuth, 130.0);
    assert_eq!(config.water.distortion_scale, 8.0);
    assert_eq!(config.water.time_step, 1.0 / 60.0);
    assert_eq!(config.sky.scale, 10000.0);

    let kinds: Vec<_> = config.props.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![PropKind::Boat, PropKind::Container, PropKind::PalmTree]
    );
    let palms = &config.props[2];
    assert_eq!(palms.placements.len(), 3);
}

#[test]
fn should_resolve_paths_relative_to_the_referencing_file() {
    assert_eq!(
        resolve_relative("textures/boat/scene.gltf", "scene.bin").unwrap(),
        "textures/boat/scene.bin"
    );
    assert_eq!(
        resolve_relative("textures/boat/scene.gltf", "./textures/hull_baseColor.png").unwrap(),
        "textures/boat/textures/hull_baseColor.png"
    );
    assert_eq!(
        resolve_relative("textures/palm/scene.gltf", "../shared/bark%20diffuse.jpg").unwrap(),
        "textures/shared/bark diffuse.jpg"
    );
    assert!(resolve_relative("scene.gltf", "data:application/octet-stream;base64,AAAA").is_err());
}

#[test]
fn should_tile_dunes_like_the_slab() {
    let beach = BeachConfig::default();
    let repeat = dune_uv_repeat(&beach, Vector3::new(2600.0, 140.0, 500.0));
    // 250 repeats over 10000 units along x, 250 over 3000 along z
    assert!((repeat[0] - 130.0).abs() < 1e-3);
    assert!((repeat[1] - 250.0 / 3000.0 * 1000.0).abs() < 1e-3);
}

#[test]
fn should_read_and_write_every_parameter() {
    let mut parameters = SceneParameters::default();
    for (i, parameter) in [
        Parameter::Elevation,
        Parameter::Azimuth,
        Parameter::DistortionScale,
        Parameter::Size,
    ]
    .into_iter()
    .enumerate()
    {
        parameters.set(parameter, i as f32 + 0.5);
        assert_eq!(parameters.get(parameter), i as f32 + 0.5);
    }
}

#[test]
fn should_report_which_groups_changed() {
    let applied = SceneParameters::from_config(&SceneConfig::default());
    assert_eq!(
        applied.changes_since(None),
        Changes {
            sun: true,
            water: true
        }
    );
    assert_eq!(applied.changes_since(Some(&applied)), Changes::default());

    let mut moved = applied;
    moved.set(Parameter::Azimuth, -45.0);
    assert_eq!(
        moved.changes_since(Some(&applied)),
        Changes {
            sun: true,
            water: false
        }
    );

    let mut rougher = applied;
    rougher.set(Parameter::DistortionScale, 3.7);
    assert_eq!(
        rougher.changes_since(Some(&applied)),
        Changes {
            sun: false,
            water: true
        }
    );
}

#[test]
fn should_antialias_and_mirror_at_the_authored_quality() {
    let config = SceneConfig::default();
    assert!(config.antialias);
    assert_eq!(config.sample_count(), 4);
    assert_eq!(config.water.reflection_resolution, 512);

    let aliased = SceneConfig {
        antialias: false,
        ..SceneConfig::default()
    };
    assert_eq!(aliased.sample_count(), 1);
}

#[test]
fn should_fall_back_to_single_sampling_when_unsupported() {
    use wgpu::TextureFormatFeatureFlags as Flags;

    let x4 = Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_RESOLVE;
    assert_eq!(supported_sample_count(4, x4), 4);
    assert_eq!(supported_sample_count(4, Flags::empty()), 1);
    assert_eq!(supported_sample_count(4, Flags::MULTISAMPLE_X2), 1);
    assert_eq!(supported_sample_count(1, x4), 1);
}
