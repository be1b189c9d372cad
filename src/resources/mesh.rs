//! Vertex generation for the primitive meshes of the scene and tangent
//! computation for meshes that come without tangents.
//!
//! Every builder returns plain `(vertices, indices)` so the geometry can be
//! inspected without a GPU; [`upload`] turns it into a [`Model`].

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::data_structures::model::{self, Material, Model, ModelVertex};

/// Fills in `tangent` and `bitangent` of every vertex from the triangle
/// edges and texture coordinates, averaging over all triangles a vertex
/// belongs to. Triangles with degenerate texture coordinates are skipped.
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let (Some(v0), Some(v1), Some(v2)) = (vertices.get(i0), vertices.get(i1), vertices.get(i2))
        else {
            continue;
        };

        let pos0: Vector3<f32> = v0.position.into();
        let pos1: Vector3<f32> = v1.position.into();
        let pos2: Vector3<f32> = v2.position.into();

        let uv0: Vector2<f32> = v0.tex_coords.into();
        let uv1: Vector2<f32> = v1.tex_coords.into();
        let uv2: Vector2<f32> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solves
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // Flipped so right-handed normal maps work with wgpu texture coordinates
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            let v = &mut vertices[i];
            v.tangent = (tangent + Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + Vector3::from(v.bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (Vector3::from(v.tangent) * denom).into();
        v.bitangent = (Vector3::from(v.bitangent) * denom).into();
    }
}

/// Axis aligned box centred on the origin with its own texture space on
/// each of the six faces.
pub fn box_geometry(size: Vector3<f32>) -> (Vec<ModelVertex>, Vec<u32>) {
    let half = size / 2.0;
    // (normal, u axis, v axis); v points down the texture like image rows
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, -1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u_axis, v_axis) in faces {
        let normal = Vector3::from(normal);
        let u_axis = Vector3::from(u_axis);
        let v_axis = Vector3::from(v_axis);
        let base = vertices.len() as u32;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let corner = normal + u_axis * (2.0 * u - 1.0) + v_axis * (2.0 * v - 1.0);
            let position = Vector3::new(corner.x * half.x, corner.y * half.y, corner.z * half.z);
            vertices.push(ModelVertex {
                position: position.into(),
                tex_coords: [u, v],
                normal: normal.into(),
                tangent: u_axis.into(),
                bitangent: (-v_axis).into(),
            });
        }
        indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
    }
    (vertices, indices)
}

/// A single quad in the XY plane facing +Z, centred on the origin.
/// Rotate it by -90° about X to lay it flat with the normal pointing up.
pub fn plane_geometry(width: f32, height: f32) -> (Vec<ModelVertex>, Vec<u32>) {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let vertices = [
        ([-hw, hh], [0.0, 0.0]),
        ([hw, hh], [1.0, 0.0]),
        ([hw, -hh], [1.0, 1.0]),
        ([-hw, -hh], [0.0, 1.0]),
    ]
    .into_iter()
    .map(|([x, y], tex_coords)| ModelVertex {
        position: [x, y, 0.0],
        tex_coords,
        normal: [0.0, 0.0, 1.0],
        tangent: [1.0, 0.0, 0.0],
        bitangent: [0.0, 1.0, 0.0],
    })
    .collect();
    (vertices, vec![0, 3, 2, 0, 2, 1])
}

/// Upper half of an ellipsoid with the given radii, resting on y = 0.
///
/// Normals are those of the stretched surface, not of the unit sphere, so
/// flat dunes are lit as flat.
pub fn dome_geometry(
    radii: Vector3<f32>,
    width_segments: u32,
    height_segments: u32,
) -> (Vec<ModelVertex>, Vec<u32>) {
    let radii = Vector3::new(
        radii.x.max(f32::EPSILON),
        radii.y.max(f32::EPSILON),
        radii.z.max(f32::EPSILON),
    );
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(1);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let phi = v * std::f32::consts::FRAC_PI_2;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let theta = u * std::f32::consts::TAU;
            let unit = Vector3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());
            let position = Vector3::new(unit.x * radii.x, unit.y * radii.y, unit.z * radii.z);
            let normal = safe_normalize(
                Vector3::new(unit.x / radii.x, unit.y / radii.y, unit.z / radii.z),
                Vector3::unit_y(),
            );
            // Texture space is the ground plan, u along +X and v along +Z
            let tangent = safe_normalize(
                Vector3::unit_x() - normal * normal.x,
                Vector3::unit_x(),
            );
            let bitangent = normal.cross(tangent);
            vertices.push(ModelVertex {
                position: position.into(),
                tex_coords: [
                    position.x / (2.0 * radii.x) + 0.5,
                    position.z / (2.0 * radii.z) + 0.5,
                ],
                normal: normal.into(),
                tangent: tangent.into(),
                bitangent: bitangent.into(),
            });
        }
    }

    let row = width_segments + 1;
    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix;
            let b = (iy + 1) * row + ix;
            let c = (iy + 1) * row + ix + 1;
            let d = iy * row + ix + 1;
            // The apex row collapses to one point; skip its degenerate triangles
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            indices.extend_from_slice(&[b, c, d]);
        }
    }
    (vertices, indices)
}

fn safe_normalize(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > f32::EPSILON {
        v.normalize()
    } else {
        fallback
    }
}

/// Uploads generated geometry as a single mesh model using `material`.
pub fn upload(
    device: &wgpu::Device,
    name: &str,
    (vertices, indices): (Vec<ModelVertex>, Vec<u32>),
    material: Material,
) -> Model {
    let mesh = model::Mesh::new(device, name, &vertices, &indices, 0);
    Model {
        meshes: vec![mesh],
        materials: vec![material],
    }
}
