//! Loading of meshes, textures and models from external files.
//!
//! [`load_model_gltf`] turns a `.gltf`/`.glb` asset into a scene graph.
//! Buffers and images referenced by URI are resolved relative to the glTF
//! file. A texture that cannot be decoded is logged and replaced by a
//! neutral one, so only a missing or malformed glTF document fails the load.

use crate::{
    data_structures::{
        model::{self, MaterialUniform},
        scene_graph::{ContainerNode, SceneNode, to_scene_node},
        texture::Texture,
    },
    resources::texture::{load_binary, load_texture, material_layout, resolve_relative},
};

pub mod mesh;
pub mod texture;

const WHITE: [u8; 4] = [255, 255, 255, 255];

pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => anyhow::bail!("{file_name} references a binary chunk it does not have"),
            },
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&resolve_relative(file_name, uri)?).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load materials
    let layout = material_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture() {
            Some(info) => {
                load_image(
                    info.texture().source().source(),
                    file_name,
                    &buffer_data,
                    false,
                    device,
                    queue,
                )
                .await
            }
            None => Texture::create_solid(1, 1, WHITE, false, device, queue),
        };
        let (normal_texture, normal_scale) = match material.normal_texture() {
            Some(normal) => {
                let texture = load_image(
                    normal.texture().source().source(),
                    file_name,
                    &buffer_data,
                    true,
                    device,
                    queue,
                )
                .await;
                (texture, normal.scale())
            }
            None => (Texture::create_default_normal_map(1, 1, device, queue), 1.0),
        };
        let uniform = MaterialUniform {
            base_color: pbr.base_color_factor(),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            normal_scale,
            ..Default::default()
        };
        let name = format!(
            "{file_name}#{}",
            material.name().unwrap_or("unnamed_material")
        );
        materials.push(model::Material::new(
            device,
            &name,
            diffuse_texture,
            normal_texture,
            uniform,
            &layout,
        ));
    }
    // Used by primitives that reference no material
    materials.push(model::Material::new(
        device,
        &format!("{file_name}#default"),
        Texture::create_solid(1, 1, WHITE, false, device, queue),
        Texture::create_default_normal_map(1, 1, device, queue),
        MaterialUniform::default(),
        &layout,
    ));

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow::anyhow!("{file_name} contains no scene"))?;
    let mut models: Vec<Box<dyn SceneNode>> = scene
        .nodes()
        .map(|node| to_scene_node(node, &buffer_data, device, &materials))
        .collect();

    let root_node = match models.len() {
        0 => anyhow::bail!("The scene of {file_name} contains no nodes"),
        1 => models.remove(0),
        _ => {
            let mut root_node = ContainerNode::new(1);
            root_node.children = models;
            Box::new(root_node)
        }
    };

    Ok(root_node)
}

/// Decodes an image embedded in a buffer view or referenced by URI. Failures
/// are logged and yield a neutral 1×1 texture.
async fn load_image(
    source: gltf::image::Source<'_>,
    file_name: &str,
    buffer_data: &[Vec<u8>],
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    let loaded = match source {
        gltf::image::Source::View { view, mime_type } => {
            let start = view.offset();
            let end = start + view.length();
            match buffer_data
                .get(view.buffer().index())
                .and_then(|buffer| buffer.get(start..end))
            {
                Some(bytes) => Texture::from_bytes(
                    device,
                    queue,
                    bytes,
                    file_name,
                    mime_type.split('/').next_back(),
                    is_normal_map,
                ),
                None => Err(anyhow::anyhow!(
                    "Buffer view {} is out of bounds",
                    view.index()
                )),
            }
        }
        gltf::image::Source::Uri { uri, mime_type } => match resolve_relative(file_name, uri) {
            Ok(path) => {
                load_texture(
                    &path,
                    is_normal_map,
                    device,
                    queue,
                    mime_type.and_then(|mt| mt.split('/').next_back()),
                )
                .await
            }
            Err(e) => Err(e),
        },
    };
    loaded.unwrap_or_else(|e| {
        log::error!("Failed to load a texture of {file_name}: {e:#}");
        if is_normal_map {
            Texture::create_default_normal_map(1, 1, device, queue)
        } else {
            Texture::create_solid(1, 1, WHITE, false, device, queue)
        }
    })
}
