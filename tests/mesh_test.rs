use beach_scene::{
    cgmath::{InnerSpace, Vector3},
    data_structures::model::ModelVertex,
    resources::mesh::{box_geometry, compute_tangents, dome_geometry, plane_geometry},
};

fn assert_valid(vertices: &[ModelVertex], indices: &[u32]) {
    assert_eq!(indices.len() % 3, 0);
    assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    for v in vertices {
        let n = Vector3::from(v.normal);
        assert!((n.magnitude() - 1.0).abs() < 1e-4, "normal {n:?} is not unit length");
    }
}

/// Every triangle faces the same way as the normals of its corners.
fn assert_outward(vertices: &[ModelVertex], indices: &[u32]) {
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| &vertices[i as usize]);
        let face = (Vector3::from(b.position) - Vector3::from(a.position))
            .cross(Vector3::from(c.position) - Vector3::from(a.position));
        assert!(face.dot(Vector3::from(a.normal)) > 0.0, "{tri:?} winds inwards");
    }
}

#[test]
fn should_build_a_closed_box() {
    let size = Vector3::new(10000.0, 1.0, 3000.0);
    let (vertices, indices) = box_geometry(size);
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);
    assert_valid(&vertices, &indices);
    assert_outward(&vertices, &indices);
    for v in &vertices {
        assert_eq!(v.position[0].abs(), 5000.0);
        assert_eq!(v.position[1].abs(), 0.5);
        assert_eq!(v.position[2].abs(), 1500.0);
    }
}

#[test]
fn should_build_a_plane_facing_z() {
    let (vertices, indices) = plane_geometry(4.0, 2.0);
    assert_eq!(vertices.len(), 4);
    assert_valid(&vertices, &indices);
    assert_outward(&vertices, &indices);
    assert!(vertices.iter().all(|v| v.position[2] == 0.0));
}

#[test]
fn should_build_a_dome_resting_on_the_ground() {
    let radii = Vector3::new(2600.0, 140.0, 500.0);
    let (vertices, indices) = dome_geometry(radii, 48, 12);
    assert_eq!(vertices.len(), 49 * 13);
    assert_valid(&vertices, &indices);
    for v in &vertices {
        assert!(v.position[1] >= -1e-3);
        assert!(v.position[1] <= radii.y + 1e-3);
        assert!(v.normal[1] >= -1e-4, "dome normals never point down");
        assert!(v.tex_coords.iter().all(|t| (-1e-4..=1.0 + 1e-4).contains(t)));
    }
    let apex = vertices[0].position;
    assert!((apex[1] - radii.y).abs() < 1e-3);
}

#[test]
fn should_clamp_degenerate_dome_parameters() {
    let (vertices, indices) = dome_geometry(Vector3::new(0.0, 1.0, 1.0), 0, 0);
    assert_eq!(vertices.len(), 4 * 2);
    assert_valid(&vertices, &indices);
}

#[test]
fn should_derive_tangents_from_texture_coordinates() {
    let (mut vertices, indices) = plane_geometry(2.0, 2.0);
    vertices.iter_mut().for_each(|v| {
        v.tangent = [0.0; 3];
        v.bitangent = [0.0; 3];
    });
    compute_tangents(&mut vertices, &indices);
    for v in &vertices {
        let t = Vector3::from(v.tangent).normalize();
        assert!((t - Vector3::unit_x()).magnitude() < 1e-4, "{t:?}");
        assert!(Vector3::from(v.bitangent).dot(Vector3::from(v.normal)).abs() < 1e-4);
    }
}
