//! Coordinate-axes gizmo: a grey origin marker and red, green and blue
//! arrows along +X, +Y and +Z.

use glam::{Quat, Vec3};

use super::TriangleMesh;

const SEGMENTS: u32 = 16;

pub fn create_axes(length: f32) -> TriangleMesh {
    let origin_size = 0.005 * length;
    let shaft_radius = 0.0025 * length;
    let head_radius = 0.0075 * length;
    let shaft_length = 0.975 * length;
    let head_length = 0.025 * length;

    let mut mesh = origin_marker(origin_size, Vec3::splat(0.5));
    for (rotation, color) in [
        (Quat::from_rotation_y(std::f32::consts::FRAC_PI_2), Vec3::X),
        (Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2), Vec3::Y),
        (Quat::IDENTITY, Vec3::Z),
    ] {
        let mut arrow = arrow_along_z(shaft_radius, head_radius, shaft_length, head_length);
        for vertex in &mut arrow.vertices {
            *vertex = rotation * *vertex;
        }
        arrow.vertex_colors = vec![color; arrow.vertices.len()];
        mesh.append(&arrow);
    }
    mesh.compute_vertex_normals();
    mesh
}

fn origin_marker(half_size: f32, color: Vec3) -> TriangleMesh {
    // Octahedron
    let vertices = vec![
        Vec3::X * half_size,
        Vec3::NEG_X * half_size,
        Vec3::Y * half_size,
        Vec3::NEG_Y * half_size,
        Vec3::Z * half_size,
        Vec3::NEG_Z * half_size,
    ];
    let triangles = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    TriangleMesh {
        vertex_colors: vec![color; vertices.len()],
        vertices,
        triangles,
        vertex_normals: Vec::new(),
    }
}

/// Capped cylinder from z = 0 to `shaft_length`, topped by a cone.
fn arrow_along_z(
    shaft_radius: f32,
    head_radius: f32,
    shaft_length: f32,
    head_length: f32,
) -> TriangleMesh {
    let ring = |radius: f32, z: f32| {
        (0..SEGMENTS).map(move |i| {
            let angle = i as f32 / SEGMENTS as f32 * std::f32::consts::TAU;
            Vec3::new(radius * angle.cos(), radius * angle.sin(), z)
        })
    };

    let mut vertices: Vec<Vec3> = Vec::new();
    vertices.extend(ring(shaft_radius, 0.0));
    vertices.extend(ring(shaft_radius, shaft_length));
    vertices.extend(ring(head_radius, shaft_length));
    let base_center = vertices.len() as u32;
    vertices.push(Vec3::ZERO);
    let tip = vertices.len() as u32;
    vertices.push(Vec3::new(0.0, 0.0, shaft_length + head_length));
    let head_center = vertices.len() as u32;
    vertices.push(Vec3::new(0.0, 0.0, shaft_length));

    let mut triangles = Vec::new();
    for i in 0..SEGMENTS {
        let j = (i + 1) % SEGMENTS;
        let (bottom, top, head) = (0, SEGMENTS, 2 * SEGMENTS);
        triangles.push([bottom + i, bottom + j, top + j]);
        triangles.push([bottom + i, top + j, top + i]);
        triangles.push([base_center, bottom + j, bottom + i]);
        triangles.push([head + i, head + j, tip]);
        triangles.push([head_center, head + j, head + i]);
    }

    TriangleMesh {
        vertices,
        triangles,
        vertex_normals: Vec::new(),
        vertex_colors: Vec::new(),
    }
}
