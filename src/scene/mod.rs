//! The beach scene: sand, dunes, water and the glTF props.
//!
//! [`BeachScene`] builds the static ground geometry while the flow is
//! constructed, starts the prop loads in `on_init` and from then on keeps
//! the water uniform and the sun in sync with [`SceneParameters`], which the
//! debug panel edits.

use cgmath::{Deg, Vector3};

use crate::{
    config::{BeachConfig, SceneConfig},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        model::{Material, MaterialUniform},
        scene_graph::{ModelNode, SceneNode},
        texture::Texture,
    },
    flow::{GraphicsFlow, Out},
    pipelines::water::{WaterSurface, WaterUniform},
    render::Render,
    resources::{
        mesh::{box_geometry, dome_geometry, plane_geometry, upload},
        texture::{load_texture_or, material_layout},
    },
};

pub mod panel;
pub mod parameters;
pub mod props;

use parameters::SceneParameters;
use props::{PropEvent, PropSlots, load_prop};

/// What the background loads of the scene resolve to.
pub type SceneEvent = PropEvent<Box<dyn SceneNode>>;

const SAND: [u8; 4] = [194, 178, 128, 255];
const FLAT_NORMAL: [u8; 4] = [127, 127, 255, 255];

/// Texture repeat for a dune so its sand tiles at the same world size as on the slab.
pub fn dune_uv_repeat(beach: &BeachConfig, radii: Vector3<f32>) -> [f32; 2] {
    let per_unit = |repeat: f32, extent: f32| {
        if extent > 0.0 {
            repeat / extent
        } else {
            repeat
        }
    };
    [
        per_unit(beach.sand_repeat[0], beach.slab_size.x) * 2.0 * radii.x,
        per_unit(beach.sand_repeat[1], beach.slab_size.z) * 2.0 * radii.z,
    ]
}

pub struct BeachScene {
    config: SceneConfig,
    ground: Vec<Box<dyn SceneNode>>,
    catcher: ModelNode,
    water: WaterSurface,
    props: PropSlots<Box<dyn SceneNode>>,
    applied: Option<SceneParameters>,
}

impl BeachScene {
    pub async fn new(ctx: InitContext, config: SceneConfig) -> Self {
        let InitContext { device, queue, .. } = &ctx;
        let beach = &config.beach;
        let layout = material_layout(device);

        let sand = load_texture_or(&beach.sand_texture, false, SAND, device, queue).await;
        let sand_normals =
            load_texture_or(&beach.sand_normals, true, FLAT_NORMAL, device, queue).await;
        let water_normals =
            load_texture_or(&config.water.normals, true, FLAT_NORMAL, device, queue).await;

        let sand_material = |name: &str, uv_repeat: [f32; 2]| {
            Material::new(
                device,
                name,
                sand.clone(),
                sand_normals.clone(),
                MaterialUniform {
                    uv_repeat,
                    roughness: 0.95,
                    ..Default::default()
                },
                &layout,
            )
        };

        let mut ground: Vec<Box<dyn SceneNode>> = Vec::new();
        let slab = upload(
            device,
            "Sand Slab",
            box_geometry(beach.slab_size),
            sand_material("Sand Slab", beach.sand_repeat),
        );
        ground.push(Box::new(ModelNode::placed(
            device,
            slab,
            Instance::from(beach.slab_position),
        )));
        for (position, radii) in beach.dunes.iter() {
            let dune = upload(
                device,
                "Dune",
                dome_geometry(*radii, 48, 12),
                sand_material("Dune", dune_uv_repeat(beach, *radii)),
            );
            ground.push(Box::new(ModelNode::placed(
                device,
                dune,
                Instance::from(*position),
            )));
        }
        ground
            .iter_mut()
            .for_each(|node| node.write_to_buffers(queue, device));

        let catcher_material = Material::new(
            device,
            "Shadow Catcher",
            Texture::create_solid(1, 1, [255, 255, 255, 255], false, device, queue),
            Texture::create_default_normal_map(1, 1, device, queue),
            MaterialUniform {
                base_color: [0.0, 0.0, 0.0, beach.catcher_opacity],
                ..Default::default()
            },
            &layout,
        );
        let [width, depth] = beach.catcher_size;
        let mut catcher = ModelNode::placed(
            device,
            upload(
                device,
                "Shadow Catcher",
                plane_geometry(width, depth),
                catcher_material,
            ),
            Instance {
                position: beach.catcher_position,
                ..Instance::rotated_x(Deg(-90.0))
            },
        );
        catcher.write_to_buffers(queue, device);

        let water = WaterSurface::new(device, &config.water, &water_normals, config.sun.direction());
        let props = PropSlots::new(config.props.iter().map(|prop| prop.kind));

        Self {
            config,
            ground,
            catcher,
            water,
            props,
            applied: None,
        }
    }

    fn sync(&mut self, parameters: &SceneParameters) -> Option<Vector3<f32>> {
        sync_water(&mut self.water.uniform, &mut self.applied, parameters)
    }
}

/// Copies the parameters changed since `applied` into the water uniform and
/// records them as applied. Returns the new sun direction if the sun moved;
/// the sky, the sun light and the environment take it from there.
pub fn sync_water(
    water: &mut WaterUniform,
    applied: &mut Option<SceneParameters>,
    parameters: &SceneParameters,
) -> Option<Vector3<f32>> {
    let changes = parameters.changes_since(applied.as_ref());
    *applied = Some(*parameters);
    if changes.water {
        water.set_waves(parameters.water.distortion_scale, parameters.water.size);
    }
    if changes.sun {
        let sun = parameters.sun.direction();
        water.set_sun_direction(sun);
        return Some(sun);
    }
    None
}

impl GraphicsFlow<SceneParameters, SceneEvent> for BeachScene {
    fn on_init(&mut self, ctx: &mut Context, state: &mut SceneParameters) -> Out<SceneEvent> {
        *state = SceneParameters::from_config(&self.config);

        if let Some(sun) = self.sync(state) {
            ctx.environment.set_sun(&ctx.device, &ctx.queue, sun);
        }
        self.water.write_to_buffer(&ctx.queue);

        let loads = self
            .config
            .props
            .iter()
            .map(|prop| load_prop(prop, &ctx.device, &ctx.queue))
            .collect();
        Out::Spawn(loads)
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut SceneParameters,
        _: instant::Duration,
    ) -> Out<SceneEvent> {
        self.water.advance_time();
        let sun = self.sync(state);
        self.water.write_to_buffer(&ctx.queue);

        match sun {
            Some(sun) => Out::Configure(Box::new(move |ctx: &mut Context| {
                ctx.environment.set_sun(&ctx.device, &ctx.queue, sun)
            })),
            None => Out::Empty,
        }
    }

    fn on_tick(&mut self, _: &Context, _: &mut SceneParameters) -> Out<SceneEvent> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut SceneParameters,
        _: &winit::event::WindowEvent,
    ) -> Out<SceneEvent> {
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        _: &Context,
        _: &mut SceneParameters,
        event: SceneEvent,
    ) -> Option<SceneEvent> {
        self.props.accept(event);
        if self.props.is_settled() {
            log::info!("All props settled");
        }
        None
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        let water = &self.water;
        Render::Composed(vec![
            Render::nodes(&self.ground),
            Render::Composed(
                self.props
                    .loaded()
                    .map(|node| Render::from(node.as_ref()))
                    .collect(),
            ),
            Render::Custom(Box::new(
                move |ctx: &Context, pass: &mut wgpu::RenderPass<'pass>| water.draw(ctx, pass),
            )),
            Render::Composed(
                self.catcher
                    .get_render()
                    .into_iter()
                    .map(Render::ShadowCatcher)
                    .collect(),
            ),
        ])
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut SceneParameters,
        _: &mut image::RgbaImage,
    ) -> Result<crate::flow::ImageTestResult, anyhow::Error> {
        Ok(crate::flow::ImageTestResult::Passed)
    }
}
