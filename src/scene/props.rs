//! Background loading and placement of the glTF props.
//!
//! Each prop is loaded on its own; the outcome arrives as a [`PropEvent`]
//! and fills the matching slot of [`PropSlots`]. A failed load is logged
//! and leaves its slot empty while the others keep arriving.

use crate::{
    config::{PropConfig, PropKind},
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, SceneNode},
    },
    flow::Load,
    resources::load_model_gltf,
};

#[derive(Debug)]
pub enum PropEvent<N> {
    Loaded { kind: PropKind, node: N },
    Failed { kind: PropKind },
}

impl<N> PropEvent<N> {
    pub fn kind(&self) -> PropKind {
        match self {
            PropEvent::Loaded { kind, .. } | PropEvent::Failed { kind } => *kind,
        }
    }
}

/// Awaits `load` and turns its outcome into an event, logging failures.
pub async fn settle<N, F>(kind: PropKind, load: F) -> PropEvent<N>
where
    F: Future<Output = anyhow::Result<N>>,
{
    match load.await {
        Ok(node) => {
            log::info!("{kind:?} loaded");
            PropEvent::Loaded { kind, node }
        }
        Err(e) => {
            log::error!("Failed to load {kind:?}: {e:#}");
            PropEvent::Failed { kind }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug)]
enum Slot<N> {
    Pending,
    Loaded(N),
    Failed,
}

#[derive(Debug)]
pub struct PropSlots<N> {
    slots: Vec<(PropKind, Slot<N>)>,
}

impl<N> PropSlots<N> {
    pub fn new(kinds: impl IntoIterator<Item = PropKind>) -> Self {
        Self {
            slots: kinds.into_iter().map(|kind| (kind, Slot::Pending)).collect(),
        }
    }

    /// Fills the first pending slot of the event's kind. Returns `false` if
    /// there was none, in which case the event is dropped.
    pub fn accept(&mut self, event: PropEvent<N>) -> bool {
        let kind = event.kind();
        let Some((_, slot)) = self
            .slots
            .iter_mut()
            .find(|(k, slot)| *k == kind && matches!(slot, Slot::Pending))
        else {
            log::warn!("No pending slot for {kind:?}");
            return false;
        };
        *slot = match event {
            PropEvent::Loaded { node, .. } => Slot::Loaded(node),
            PropEvent::Failed { .. } => Slot::Failed,
        };
        true
    }

    pub fn state(&self, kind: PropKind) -> Option<SlotState> {
        self.slots
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, slot)| match slot {
                Slot::Pending => SlotState::Pending,
                Slot::Loaded(_) => SlotState::Loaded,
                Slot::Failed => SlotState::Failed,
            })
    }

    pub fn loaded(&self) -> impl Iterator<Item = &N> {
        self.slots.iter().filter_map(|(_, slot)| match slot {
            Slot::Loaded(node) => Some(node),
            _ => None,
        })
    }

    pub fn is_settled(&self) -> bool {
        !self
            .slots
            .iter()
            .any(|(_, slot)| matches!(slot, Slot::Pending))
    }
}

/// Wraps `root` in a node with one instance per placement. No placements
/// means a single copy at the origin.
pub fn place(root: Box<dyn SceneNode>, placements: &[Instance]) -> Box<dyn SceneNode> {
    let mut wrapper = ContainerNode::new(1);
    wrapper.add_child(root);
    for _ in 1..placements.len() {
        wrapper.clone_instance(0);
    }
    for (i, placement) in placements.iter().enumerate() {
        wrapper.set_local_transform(i, placement.clone());
    }
    wrapper.update_world_transform_all();
    Box::new(wrapper)
}

/// Loads and places one prop in the background.
pub fn load_prop(
    prop: &PropConfig,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Load<PropEvent<Box<dyn SceneNode>>> {
    let device = device.clone();
    let queue = queue.clone();
    let path = prop.path.clone();
    let placements = prop.placements.clone();
    Box::pin(settle(prop.kind, async move {
        let root = load_model_gltf(&path, &device, &queue).await?;
        let mut node = place(root, &placements);
        node.write_to_buffers(&queue, &device);
        Ok(node)
    }))
}
