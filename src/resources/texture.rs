//! Asset I/O and texture loading.
//!
//! Natively assets are read from the directory named by the
//! `BEACH_SCENE_ASSETS` environment variable, or `./assets` when unset. On
//! the web they are fetched relative to `<origin>/assets`.

use anyhow::Context as _;

use crate::data_structures::texture;

/// Environment variable overriding the native asset root.
pub const ASSETS_ENV: &str = "BEACH_SCENE_ASSETS";

/// Bind group layout of [`crate::data_structures::model::Material`]:
/// colour map, normal map and the material uniform.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

#[cfg(not(target_arch = "wasm32"))]
pub fn asset_root() -> std::path::PathBuf {
    std::env::var_os(ASSETS_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::Path::new("./").join("assets"))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn asset_path(file_name: &str) -> std::path::PathBuf {
    asset_root().join(file_name)
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("No browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("Could not read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name)?)
}

/// Resolves `uri` found inside the asset `base_file` (e.g. a glTF buffer or
/// image) to an asset path. `.` and `..` segments are folded.
pub fn resolve_relative(base_file: &str, uri: &str) -> anyhow::Result<String> {
    if uri.starts_with("data:") {
        anyhow::bail!("Embedded data URIs are not supported ({base_file})");
    }
    let mut segments: Vec<&str> = base_file.split('/').collect();
    // Drop the file name of the base
    segments.pop();
    for segment in uri.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    Ok(segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
        .replace("%20", " "))
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = asset_path(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: Option<&str>,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name, format, is_normal_map)
}

/// Reads and decodes an image asset without touching the GPU.
pub async fn load_image(file_name: &str) -> anyhow::Result<image::DynamicImage> {
    let data = load_binary(file_name).await?;
    texture::decode_image(&data, file_name, None)
}

/// The loaded image, or a 1×1 image of `fallback` after logging the failure.
pub fn image_or(
    loaded: anyhow::Result<image::DynamicImage>,
    file_name: &str,
    fallback: [u8; 4],
) -> image::DynamicImage {
    loaded.unwrap_or_else(|e| {
        log::error!("Failed to load texture {file_name}: {e:#}");
        image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(1, 1, image::Rgba(fallback)))
    })
}

/// Like [`load_texture`], but a missing or broken file becomes a 1×1
/// texture of `fallback`.
pub async fn load_texture_or(
    file_name: &str,
    is_normal_map: bool,
    fallback: [u8; 4],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> texture::Texture {
    let img = image_or(load_image(file_name).await, file_name, fallback);
    texture::Texture::from_image(device, queue, &img, Some(file_name), is_normal_map)
}
