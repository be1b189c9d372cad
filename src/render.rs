//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum which flows return from
//! `on_render` to describe what they want drawn. The engine sorts the
//! returned values into batches per pipeline (opaque standard materials,
//! shadow catchers, panel geometry) and runs custom closures for effects
//! that bring their own pipeline, such as the water surface.
//!
//! # Key types
//!
//! - [`Render<'a, 'pass>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (model + instance buffer)
//! - [`Flat<'a>`] contains data for flat screen-space geometry (vertex + index buffers)

use crate::{
    context::Context,
    data_structures::{model::Model, scene_graph::SceneNode},
};

/// Data for instanced object rendering: a model and its instance buffer.
#[derive(Clone)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// Screen-space geometry with 16 bit indices, drawn by the panel pipeline.
#[derive(Clone)]
pub struct Flat<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub amount: usize,
}

pub type CustomRender<'a, 'pass> = Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'pass>)>;

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single opaque instanced object that casts shadows
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque instanced objects
/// - `ShadowCatcher(Instanced)` renders only the shadows received by the object
/// - `Panel(Flat)` renders screen-space panel geometry on top of everything
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
/// - `Custom(...)` invokes a closure inside the main pass for custom rendering
pub enum Render<'a, 'pass> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    ShadowCatcher(Instanced<'a>),
    Panel(Flat<'a>),
    Composed(Vec<Render<'a, 'pass>>),
    Custom(CustomRender<'a, 'pass>),
}

/// Renders sorted by the pipeline that draws them.
pub(crate) struct Batches<'a, 'pass> {
    pub(crate) basics: Vec<Instanced<'a>>,
    pub(crate) catchers: Vec<Instanced<'a>>,
    pub(crate) panels: Vec<Flat<'a>>,
    pub(crate) customs: Vec<CustomRender<'a, 'pass>>,
}

impl<'a, 'pass> Default for Batches<'a, 'pass> {
    fn default() -> Self {
        Self {
            basics: Vec::new(),
            catchers: Vec::new(),
            panels: Vec::new(),
            customs: Vec::new(),
        }
    }
}

impl<'a, 'pass> Render<'a, 'pass> {
    pub(crate) fn batch(self, batches: &mut Batches<'a, 'pass>) {
        match self {
            Render::Default(instanced) => batches.basics.push(instanced),
            Render::Defaults(mut vec) => batches.basics.append(&mut vec),
            Render::ShadowCatcher(instanced) => batches.catchers.push(instanced),
            Render::Panel(flat) => batches.panels.push(flat),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.batch(batches)),
            Render::Custom(f) => batches.customs.push(f),
            Render::None => (),
        }
    }

    /// Collects every instanced object of a set of scene graphs.
    pub fn nodes(nodes: &'a [Box<dyn SceneNode>]) -> Self {
        Render::Defaults(nodes.iter().flat_map(|node| node.get_render()).collect())
    }
}

impl<'a, 'pass> From<&'a dyn SceneNode> for Render<'a, 'pass> {
    fn from(sn: &'a dyn SceneNode) -> Self {
        Render::Defaults(sn.get_render())
    }
}
