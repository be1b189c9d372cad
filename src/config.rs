//! Scene configuration.
//!
//! Every hand-authored number of the beach scene lives here: camera and
//! clipping planes, orbit limits, sky and water shader parameters, the prop
//! table and the panel ranges. [`SceneConfig::default`] reproduces the
//! authored scene; callers may tweak a copy before handing it to
//! [`crate::scene::BeachScene`].

use cgmath::{Deg, Point3, Vector3};

use crate::{
    data_structures::instance::Instance,
    sun::SunParameters,
};

/// Converts a packed `0xRRGGBB` sRGB colour into linear RGB.
pub fn srgb_hex(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub position: Point3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub exposure: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(-750.0, 200.0, 500.0),
            fovy: Deg(55.0),
            znear: 1.0,
            zfar: 20000.0,
            exposure: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrbitConfig {
    pub target: Point3<f32>,
    /// Largest angle from the up axis the camera may reach, in radians.
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            target: Point3::new(0.0, 10.0, 0.0),
            max_polar_angle: std::f32::consts::PI * 0.495,
            min_distance: 4.0,
            max_distance: 5000.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SkyConfig {
    pub scale: f32,
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Edge length in pixels of each face of the baked environment cube.
    pub environment_resolution: u32,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            scale: 10000.0,
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            environment_resolution: 64,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WaterConfig {
    pub extent: f32,
    pub normals: String,
    pub sun_color: [f32; 3],
    pub water_color: [f32; 3],
    pub distortion_scale: f32,
    pub size: f32,
    pub alpha: f32,
    /// Added to the water clock once per rendered frame.
    pub time_step: f64,
    /// Edge length in pixels of the square reflection target.
    pub reflection_resolution: u32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            extent: 10000.0,
            normals: "textures/waternormals.jpg".to_string(),
            sun_color: srgb_hex(0xffe87c),
            water_color: srgb_hex(0x001e0f),
            distortion_scale: 8.0,
            size: 1.0,
            alpha: 1.0,
            time_step: 1.0 / 60.0,
            reflection_resolution: 512,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SunLightConfig {
    pub color: [f32; 3],
    pub intensity: f32,
    pub shadow_map_size: u32,
    /// Centre of the region covered by the shadow map.
    pub shadow_center: Point3<f32>,
    /// Half width of the orthographic shadow frustum.
    pub shadow_extent: f32,
    pub shadow_distance: f32,
    pub shadow_bias: f32,
}

impl Default for SunLightConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 2.5,
            shadow_map_size: 2048,
            shadow_center: Point3::new(0.0, 0.0, 3200.0),
            shadow_extent: 3500.0,
            shadow_distance: 8000.0,
            shadow_bias: 0.0015,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BeachConfig {
    pub slab_size: Vector3<f32>,
    pub slab_position: Vector3<f32>,
    pub sand_texture: String,
    pub sand_normals: String,
    pub sand_repeat: [f32; 2],
    /// Each dune is a flattened sphere: (position, radii).
    pub dunes: Vec<(Vector3<f32>, Vector3<f32>)>,
    pub catcher_size: [f32; 2],
    pub catcher_position: Vector3<f32>,
    pub catcher_opacity: f32,
}

impl Default for BeachConfig {
    fn default() -> Self {
        Self {
            slab_size: Vector3::new(10000.0, 1.0, 3000.0),
            slab_position: Vector3::new(0.0, 0.0, 3500.0),
            sand_texture: "textures/sand/sandtexture3.jpg".to_string(),
            sand_normals: "textures/sand/sandnormals2.jpg".to_string(),
            sand_repeat: [250.0, 250.0],
            dunes: vec![
                (
                    Vector3::new(-2500.0, 0.0, 4500.0),
                    Vector3::new(2600.0, 140.0, 500.0),
                ),
                (
                    Vector3::new(1800.0, 0.0, 4650.0),
                    Vector3::new(3200.0, 220.0, 450.0),
                ),
                (
                    Vector3::new(0.0, 0.0, 4900.0),
                    Vector3::new(5000.0, 320.0, 400.0),
                ),
            ],
            catcher_size: [10000.0, 3000.0],
            catcher_position: Vector3::new(0.0, 1.5, 3500.0),
            catcher_opacity: 0.4,
        }
    }
}

/// Which external model a prop slot refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropKind {
    Boat,
    Container,
    PalmTree,
}

#[derive(Clone, Debug)]
pub struct PropConfig {
    pub kind: PropKind,
    pub path: String,
    /// One entry per placed copy of the model.
    pub placements: Vec<Instance>,
}

fn placed(position: [f32; 3], scale: [f32; 3]) -> Instance {
    Instance {
        position: position.into(),
        scale: scale.into(),
        ..Default::default()
    }
}

fn default_props() -> Vec<PropConfig> {
    vec![
        PropConfig {
            kind: PropKind::Boat,
            path: "textures/boat/scene.gltf".to_string(),
            placements: vec![placed([0.0, 0.0, 2000.0], [1.0; 3])],
        },
        PropConfig {
            kind: PropKind::Container,
            path: "textures/container/scene.gltf".to_string(),
            placements: vec![placed([0.0, 230.0, 3500.0], [400.0, 200.0, 200.0])],
        },
        PropConfig {
            kind: PropKind::PalmTree,
            path: "textures/palm/scene.gltf".to_string(),
            placements: vec![
                placed([-2600.0, 0.5, 3900.0], [120.0; 3]),
                placed([-1900.0, 0.5, 4200.0], [95.0; 3]),
                placed([2400.0, 0.5, 4000.0], [110.0; 3]),
            ],
        },
    ]
}

#[derive(Clone, Debug)]
pub struct PanelConfig {
    /// Width of the panel in physical pixels, anchored to the top right.
    pub width: f32,
    pub row_height: f32,
    pub margin: f32,
    /// Frame rate graph in the top left corner, in physical pixels.
    pub stats_size: [f32; 2],
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 260.0,
            row_height: 22.0,
            margin: 8.0,
            stats_size: [80.0, 48.0],
        }
    }
}

/// The complete set of authored values for the beach scene.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub sky: SkyConfig,
    pub sun: SunParameters,
    pub light: SunLightConfig,
    pub water: WaterConfig,
    pub beach: BeachConfig,
    pub props: Vec<PropConfig>,
    pub panel: PanelConfig,
    /// How often frame statistics are logged and graphed.
    pub stats_interval_millis: u64,
    /// Multisampled main pass, if the adapter supports it.
    pub antialias: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            sky: SkyConfig::default(),
            sun: SunParameters::default(),
            light: SunLightConfig::default(),
            water: WaterConfig::default(),
            beach: BeachConfig::default(),
            props: default_props(),
            panel: PanelConfig::default(),
            stats_interval_millis: 1000,
            antialias: true,
        }
    }
}

impl SceneConfig {
    /// Samples per pixel asked for the main pass.
    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }
}
