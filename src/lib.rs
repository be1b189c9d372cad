//! beach-scene
//!
//! A decorative beach rendered with wgpu on native targets and in the
//! browser: an animated ocean under an atmospheric sky, a sand slab with
//! dunes, a few glTF props and a small panel to move the sun and tune the
//! waves.
//!
//! High-level modules
//! - `camera`: orbit camera, projection and the camera uniform
//! - `config`: every authored value of the scene
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, materials, instances, textures and the scene graph
//! - `flow`: the event loop and the flow abstraction scenes are written against
//! - `pipelines`: sky, environment, shadow, standard, mirror, water and panel pipelines
//! - `render`: render composition for efficient pipeline reuse
//! - `resources`: asset loading and generated geometry
//! - `scene`: the beach itself and its debug panel
//! - `stats`, `sun`: frame timing and the sun direction
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod stats;
pub mod sun;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    config::SceneConfig,
    flow::{FlowConstructor, GraphicsFlow},
    scene::{BeachScene, SceneEvent, panel::DebugPanel, parameters::SceneParameters},
};

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::event::WindowEvent;

/// The flows of the beach: the scene first, then the panel drawn over it.
pub fn beach_flows(config: &SceneConfig) -> Vec<FlowConstructor<SceneParameters, SceneEvent>> {
    let scene_config = config.clone();
    let panel_config = config.panel.clone();
    let scene: FlowConstructor<SceneParameters, SceneEvent> = Box::new(move |ctx| {
        Box::pin(async move {
            Box::new(BeachScene::new(ctx, scene_config).await) as Box<dyn GraphicsFlow<_, _>>
        })
    });
    let panel: FlowConstructor<SceneParameters, SceneEvent> = Box::new(move |ctx| {
        Box::pin(async move {
            Box::new(DebugPanel::new(ctx, &panel_config)) as Box<dyn GraphicsFlow<_, _>>
        })
    });
    vec![scene, panel]
}

/// Opens the window and runs the scene until it is closed.
pub fn launch(config: SceneConfig) -> anyhow::Result<()> {
    let flows = beach_flows(&config);
    flow::run(config, flows)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    launch(SceneConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
