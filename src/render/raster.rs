//! Flat drawing of scene geometry for the viewport and image export.
//! Points become squares and edges become one-pixel lines; there is no
//! depth test.

use std::collections::HashSet;

use glam::{Mat4, Vec2, Vec3};

use super::RgbaImage;
use crate::geometry::Geometry;

/// Longest edge, in pixels, that gets rasterized in full.
const MAX_SEGMENT_STEPS: f32 = 8192.0;

/// The parts of a geometry that get drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wireframe {
    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Per point; empty when the geometry has no colours.
    pub colors: Vec<Vec3>,
    pub edges: Vec<[u32; 2]>,
    /// Point clouds draw their points, line sets and meshes their edges.
    pub draw_points: bool,
}

impl Wireframe {
    pub fn from_geometry(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::PointCloud(cloud) => Self {
                points: cloud.points.clone(),
                normals: cloud.normals.clone(),
                colors: cloud.colors.clone(),
                edges: Vec::new(),
                draw_points: true,
            },
            Geometry::LineSet(lines) => {
                // Line set colours are per line.
                let mut colors = Vec::new();
                if !lines.colors.is_empty() && lines.colors.len() == lines.lines.len() {
                    colors = vec![Vec3::ONE; lines.points.len()];
                    for (line, color) in lines.lines.iter().zip(&lines.colors) {
                        for &index in line {
                            if let Some(slot) = colors.get_mut(index as usize) {
                                *slot = *color;
                            }
                        }
                    }
                }
                Self {
                    points: lines.points.clone(),
                    normals: Vec::new(),
                    colors,
                    edges: lines.lines.clone(),
                    draw_points: false,
                }
            }
            Geometry::TriangleMesh(mesh) => {
                let mut seen = HashSet::new();
                let mut edges = Vec::new();
                for &[a, b, c] in &mesh.triangles {
                    for (from, to) in [(a, b), (b, c), (c, a)] {
                        let edge = [from.min(to), from.max(to)];
                        if seen.insert(edge) {
                            edges.push(edge);
                        }
                    }
                }
                Self {
                    points: mesh.vertices.clone(),
                    normals: mesh.vertex_normals.clone(),
                    colors: mesh.vertex_colors.clone(),
                    edges,
                    draw_points: false,
                }
            }
            Geometry::Other { .. } => Self::default(),
        }
    }
}

/// A projected primitive. Positions are fractions of the viewport with the
/// origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenPrimitive {
    Point { at: Vec2, size: f32, color: Vec3 },
    Segment { from: Vec2, to: Vec2, color: Vec3 },
}

/// Where `point` lands in the viewport and its distance along the view
/// direction. `None` behind the camera.
pub fn project(view_proj: Mat4, point: Vec3) -> Option<(Vec2, f32)> {
    let clip = view_proj * point.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some((Vec2::new(0.5 * (ndc.x + 1.0), 0.5 * (1.0 - ndc.y)), clip.w))
}

pub fn to_rgba(color: Vec3) -> image::Rgba<u8> {
    let [r, g, b] = color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    image::Rgba([r, g, b, 255])
}

/// Draws `primitives` over `image` in order.
pub fn rasterize(image: &mut RgbaImage, primitives: &[ScreenPrimitive]) {
    let scale = Vec2::new(image.width() as f32, image.height() as f32);
    for primitive in primitives {
        match *primitive {
            ScreenPrimitive::Point { at, size, color } => {
                let center = at * scale;
                let half = (0.5 * size).max(0.5);
                let min = (center - half).max(Vec2::ZERO).floor();
                let max = (center + half).min(scale).ceil();
                let pixel = to_rgba(color);
                for y in min.y as u32..max.y as u32 {
                    for x in min.x as u32..max.x as u32 {
                        image.put_pixel(x, y, pixel);
                    }
                }
            }
            ScreenPrimitive::Segment { from, to, color } => {
                let (from, to) = (from * scale, to * scale);
                let steps = (to - from).abs().max_element().ceil().min(MAX_SEGMENT_STEPS).max(1.0);
                let pixel = to_rgba(color);
                for step in 0..=steps as u32 {
                    let at = from.lerp(to, step as f32 / steps);
                    if at.x >= 0.0 && at.y >= 0.0 && at.x < scale.x && at.y < scale.y {
                        image.put_pixel(at.x as u32, at.y as u32, pixel);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LineSet, TriangleMesh};

    #[test]
    fn mesh_edges_are_shared() {
        let mesh = Geometry::TriangleMesh(TriangleMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE],
            triangles: vec![[0, 1, 2], [2, 1, 3]],
            ..TriangleMesh::default()
        });
        let wireframe = Wireframe::from_geometry(&mesh);
        assert_eq!(wireframe.edges.len(), 5);
        assert!(!wireframe.draw_points);
    }

    #[test]
    fn line_colors_spread_to_endpoints() {
        let lines = Geometry::LineSet(LineSet {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            lines: vec![[0, 1]],
            colors: vec![Vec3::X],
        });
        let wireframe = Wireframe::from_geometry(&lines);
        assert_eq!(wireframe.colors, vec![Vec3::X, Vec3::X, Vec3::ONE]);
    }

    #[test]
    fn points_behind_the_camera_are_dropped() {
        let view_proj = Mat4::perspective_infinite_rh(1.0, 1.0, 0.01)
            * Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let (at, depth) = project(view_proj, Vec3::new(0.0, 0.0, -2.0)).unwrap();
        assert!((at - Vec2::splat(0.5)).length() < 1e-5);
        assert!((depth - 2.0).abs() < 1e-4);
        assert!(project(view_proj, Vec3::new(0.0, 0.0, 2.0)).is_none());
    }

    #[test]
    fn rasterize_clips_to_the_image() {
        let mut image = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
        rasterize(
            &mut image,
            &[
                ScreenPrimitive::Point {
                    at: Vec2::new(0.0, 0.0),
                    size: 3.0,
                    color: Vec3::X,
                },
                ScreenPrimitive::Segment {
                    from: Vec2::new(-1.0, 0.9),
                    to: Vec2::new(2.0, 0.9),
                    color: Vec3::Y,
                },
            ],
        );
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(3, 3).0, [0, 255, 0, 255]);
    }
}
