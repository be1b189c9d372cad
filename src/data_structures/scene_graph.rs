//! Scene graph and hierarchical scene organization.
//!
//! Provides the [`SceneNode`] trait and its two implementations: a
//! [`ContainerNode`] that only carries transforms and a [`ModelNode`] that
//! owns GPU geometry and an instance buffer. Every node keeps one
//! `(local, world)` pair per instance: the local transform as an
//! [`Instance`] and the world transform as a matrix, the parent's world
//! matrix times the local one. World matrices may carry shear when a
//! non-uniformly scaled parent holds a rotated child.

use std::ops::Range;

use cgmath::{InnerSpace, Matrix4, SquareMatrix};
use log::warn;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        model::{self, ModelVertex},
    },
    flow::MaybeSend,
    render::Instanced,
    resources::mesh::compute_tangents,
};

/// Converts a glTF node (and its children) into scene nodes with one instance.
pub fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    device: &wgpu::Device,
    mats: &[model::Material],
) -> Box<dyn SceneNode> {
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mut meshes = Vec::new();
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

                let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
                    Some(positions) => positions
                        .map(|position| ModelVertex {
                            position,
                            ..Default::default()
                        })
                        .collect(),
                    None => {
                        warn!(
                            "Primitive {} of mesh {:?} has no positions and is skipped.",
                            primitive.index(),
                            mesh.name()
                        );
                        continue;
                    }
                };
                if let Some(normals) = reader.read_normals() {
                    vertices
                        .iter_mut()
                        .zip(normals)
                        .for_each(|(vertex, normal)| vertex.normal = normal);
                }
                if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    vertices
                        .iter_mut()
                        .zip(tex_coords)
                        .for_each(|(vertex, tex_coord)| vertex.tex_coords = tex_coord);
                }

                let indices: Vec<u32> = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..vertices.len() as u32).collect(),
                };

                match reader.read_tangents() {
                    Some(tangents) => {
                        vertices.iter_mut().zip(tangents).for_each(|(vertex, tangent)| {
                            // glTF stores the bitangent sign in the fourth component
                            let tangent: cgmath::Vector4<f32> = tangent.into();
                            let normal: cgmath::Vector3<f32> = vertex.normal.into();
                            vertex.tangent = tangent.truncate().into();
                            vertex.bitangent = (normal.cross(tangent.truncate()) * tangent.w).into();
                        });
                    }
                    None => compute_tangents(&mut vertices, &indices),
                }

                let name = mesh.name().unwrap_or("unknown_mesh");
                // Primitives without a material use the default one stored last
                let material = primitive
                    .material()
                    .index()
                    .unwrap_or(mats.len().saturating_sub(1));
                meshes.push(model::Mesh::new(device, name, &vertices, &indices, material));
            }
            let model = model::Model {
                meshes,
                materials: mats.to_vec(),
            };
            Box::new(ModelNode::from_model(1, device, model))
        }
        None => Box::new(ContainerNode::new(1)),
    };
    let (translation, rotation, scale) = node.transform().decomposed();
    let instance = Instance {
        position: translation.into(),
        rotation: cgmath::Quaternion::from(rotation).normalize(),
        scale: scale.into(),
    };
    scene_node.set_local_transform(0, instance);
    for child in node.children() {
        let child_node = to_scene_node(child, buf, device, mats);
        scene_node.add_child(child_node);
    }

    scene_node
}

pub trait SceneNode: MaybeSend {
    fn get_world_transforms(&self) -> Vec<Matrix4<f32>>;

    fn get_local_transform(&self, idx: usize) -> Option<Instance>;

    fn set_local_transform(&mut self, idx: usize, instance: Instance);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn instance_count(&self) -> usize;

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device);

    /**
     * Multiple instances of a parent can be passed down to multiple instances of multiple children.
     * The argument `parents_world_transform` with a matching `range` size provides control over which instances are transformed.
     */
    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Matrix4<f32>]);

    fn update_world_transform_all(&mut self) {
        let range = 0..self.instance_count();
        let identity = vec![Matrix4::identity(); range.len()];
        self.update_world_transforms(range, &identity);
    }

    /**
     * Inserts a new instance which is a clone of the instance with index `i`,
     * children included. Returns the new number of instances.
     */
    fn clone_instance(&mut self, i: usize) -> usize;

    fn get_render(&self) -> Vec<Instanced<'_>>;
}

/// Applies `parents` to the `(local, world)` pairs in `range` and returns
/// the resulting world transforms.
fn compose_world(
    instances: &mut [(Instance, Matrix4<f32>)],
    range: Range<usize>,
    parents: &[Matrix4<f32>],
) -> Option<Vec<Matrix4<f32>>> {
    if parents.len() > instances.len() {
        warn!(
            "You tried to transform with len {}, but there are only {} instances to transform.",
            parents.len(),
            instances.len()
        );
        return None;
    }
    let Some(selected) = instances.get_mut(range.clone()) else {
        warn!(
            "You tried to transform range {}..{}, which is out of bounds for parent len {}.",
            range.start,
            range.end,
            instances.len(),
        );
        return None;
    };
    Some(
        selected
            .iter_mut()
            .zip(parents)
            .map(|((local, world), parent)| {
                *world = parent * local.to_matrix();
                *world
            })
            .collect(),
    )
}

pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    pub instances: Vec<(Instance, Matrix4<f32>)>,
}

impl ContainerNode {
    pub fn new(amount: usize) -> Self {
        let instances = (0..amount)
            .map(|_| (Instance::default(), Matrix4::identity()))
            .collect();
        Self {
            instances,
            children: vec![],
        }
    }
}

impl SceneNode for ContainerNode {
    fn get_world_transforms(&self) -> Vec<Matrix4<f32>> {
        self.instances
            .iter()
            .map(|(_, world)| *world)
            .collect()
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local).cloned()
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Matrix4<f32>]) {
        if let Some(world_transforms) =
            compose_world(&mut self.instances, range.clone(), parents_world_transform)
        {
            for child in self.children.iter_mut() {
                child.update_world_transforms(range.clone(), &world_transforms);
            }
        }
    }

    fn clone_instance(&mut self, i: usize) -> usize {
        if let Some(pair) = self.instances.get(i).cloned() {
            self.instances.push(pair);
            for child in &mut self.children {
                child.clone_instance(i);
            }
        }
        self.instances.len()
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }
}

pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    instances: Vec<(Instance, Matrix4<f32>)>,
    buffer_size_needs_change: bool,
    model: model::Model,
}

impl ModelNode {
    pub fn from_model(amount: usize, device: &wgpu::Device, model: model::Model) -> Self {
        let instances = (0..amount)
            .map(|_| (Instance::default(), Matrix4::identity()))
            .collect::<Vec<_>>();

        let instance_data = instances
            .iter()
            .map(|(_, world)| InstanceRaw::from_matrix(*world))
            .collect::<Vec<_>>();

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            children: vec![],
            instance_buffer,
            instances,
            model,
            buffer_size_needs_change: false,
        }
    }

    /// A single placed copy of `model`, with world transforms already applied.
    pub fn placed(device: &wgpu::Device, model: model::Model, placement: Instance) -> Self {
        let mut node = Self::from_model(1, device, model);
        node.set_local_transform(0, placement);
        node.update_world_transform_all();
        node
    }

    pub fn model(&self) -> &model::Model {
        &self.model
    }
}

impl SceneNode for ModelNode {
    fn get_world_transforms(&self) -> Vec<Matrix4<f32>> {
        self.instances
            .iter()
            .map(|(_, world)| *world)
            .collect()
    }

    fn get_local_transform(&self, idx: usize) -> Option<Instance> {
        self.instances.get(idx).map(|(local, _)| local).cloned()
    }

    fn set_local_transform(&mut self, idx: usize, instance: Instance) {
        if let Some((local, _)) = self.instances.get_mut(idx) {
            *local = instance;
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) {
        let raw_instances: Vec<InstanceRaw> = self
            .instances
            .iter()
            .map(|(_, world)| InstanceRaw::from_matrix(*world))
            .collect();
        if self.buffer_size_needs_change {
            self.instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Instance Buffer"),
                contents: bytemuck::cast_slice(&raw_instances),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            self.buffer_size_needs_change = false;
        } else {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&raw_instances),
            );
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue, device));
    }

    fn update_world_transforms(&mut self, range: Range<usize>, parents_world_transform: &[Matrix4<f32>]) {
        if let Some(world_transforms) =
            compose_world(&mut self.instances, range.clone(), parents_world_transform)
        {
            for child in self.children.iter_mut() {
                child.update_world_transforms(range.clone(), &world_transforms);
            }
        }
    }

    fn clone_instance(&mut self, i: usize) -> usize {
        if let Some(pair) = self.instances.get(i).cloned() {
            self.instances.push(pair);
            self.buffer_size_needs_change = true;
            for child in &mut self.children {
                child.clone_instance(i);
            }
        }
        self.instances.len()
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .chain([Instanced {
                instance: &self.instance_buffer,
                model: &self.model,
                amount: self.instances.len(),
            }])
            .collect()
    }
}
