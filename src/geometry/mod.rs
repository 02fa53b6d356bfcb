//! In-memory geometry: point clouds, line sets and triangle meshes.

pub mod axes;
pub mod io;
mod normals;

use glam::Vec3;

/// Two colours count as the same when their squared RGB distance is within
/// one 8-bit quantization step on every channel.
pub const UNIFORM_COLOR_EPSILON_SQ: f32 = 3.0 * (1.0 / 255.0) * (1.0 / 255.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub const fn empty() -> Self {
        Self {
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
        }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::empty(), |bounds, &p| bounds.include(p))
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[must_use]
    pub fn include(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    #[must_use]
    pub fn union(self, other: Aabb) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn max_extent(&self) -> f32 {
        self.extent().max_element()
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

impl PointCloud {
    pub fn has_normals(&self) -> bool {
        !self.points.is_empty() && self.normals.len() == self.points.len()
    }

    pub fn has_colors(&self) -> bool {
        !self.points.is_empty() && self.colors.len() == self.points.len()
    }

    pub fn normalize_normals(&mut self) {
        for normal in &mut self.normals {
            *normal = normal.normalize_or_zero();
        }
    }

    /// Fits a plane to each point's neighbourhood and stores its normal,
    /// oriented towards +Z.
    pub fn estimate_normals(&mut self) {
        self.normals = normals::estimate(&self.points, normals::DEFAULT_NEIGHBOURS);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSet {
    pub points: Vec<Vec3>,
    pub lines: Vec<[u32; 2]>,
    pub colors: Vec<Vec3>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub vertex_normals: Vec<Vec3>,
    pub vertex_colors: Vec<Vec3>,
}

impl TriangleMesh {
    pub fn has_vertex_colors(&self) -> bool {
        !self.vertices.is_empty() && self.vertex_colors.len() == self.vertices.len()
    }

    /// Area-weighted average of the adjacent face normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];
        for triangle in &self.triangles {
            let [a, b, c] = triangle.map(|index| index as usize);
            let (Some(&pa), Some(&pb), Some(&pc)) =
                (self.vertices.get(a), self.vertices.get(b), self.vertices.get(c))
            else {
                continue;
            };
            let face = (pb - pa).cross(pc - pa);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }
        self.vertex_normals = accumulated
            .into_iter()
            .map(Vec3::normalize_or_zero)
            .collect();
    }

    /// Appends `other`, re-indexing its triangles.
    pub fn append(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.vertex_normals.extend_from_slice(&other.vertex_normals);
        self.vertex_colors.extend_from_slice(&other.vertex_colors);
        self.triangles
            .extend(other.triangles.iter().map(|t| t.map(|index| index + offset)));
    }
}

/// Every geometry the viewer can be handed. `Other` stands for types the
/// viewer recognizes by name but cannot display.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    PointCloud(PointCloud),
    LineSet(LineSet),
    TriangleMesh(TriangleMesh),
    Other { type_name: String },
}

impl Geometry {
    pub fn type_name(&self) -> &str {
        match self {
            Geometry::PointCloud(_) => "PointCloud",
            Geometry::LineSet(_) => "LineSet",
            Geometry::TriangleMesh(_) => "TriangleMesh",
            Geometry::Other { type_name } => type_name,
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self {
            Geometry::PointCloud(cloud) => Aabb::from_points(&cloud.points),
            Geometry::LineSet(lines) => Aabb::from_points(&lines.points),
            Geometry::TriangleMesh(mesh) => Aabb::from_points(&mesh.vertices),
            Geometry::Other { .. } => Aabb::empty(),
        }
    }

    pub fn is_point_cloud(&self) -> bool {
        matches!(self, Geometry::PointCloud(_))
    }
}

/// True when the cloud has no colours or every colour matches the first one.
pub fn point_cloud_has_uniform_color(cloud: &PointCloud) -> bool {
    let Some(first) = cloud.colors.first() else {
        return true;
    };
    cloud
        .colors
        .iter()
        .all(|color| color.distance_squared(*first) <= UNIFORM_COLOR_EPSILON_SQ)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_with_colors(colors: Vec<Vec3>) -> PointCloud {
        PointCloud {
            points: vec![Vec3::ZERO; colors.len()],
            normals: Vec::new(),
            colors,
        }
    }

    #[test]
    fn colorless_and_single_color_clouds_are_uniform() {
        assert!(point_cloud_has_uniform_color(&PointCloud::default()));
        assert!(point_cloud_has_uniform_color(&cloud_with_colors(vec![
            Vec3::new(0.2, 0.4, 0.6);
            10
        ])));
    }

    #[test]
    fn sub_step_noise_stays_uniform() {
        let base = Vec3::new(0.5, 0.5, 0.5);
        let jitter = Vec3::splat(0.5 / 255.0);
        let cloud = cloud_with_colors(vec![base, base + jitter, base - jitter]);
        assert!(point_cloud_has_uniform_color(&cloud));
    }

    #[test]
    fn one_differing_point_breaks_uniformity() {
        let base = Vec3::new(0.5, 0.5, 0.5);
        let mut colors = vec![base; 100];
        colors[73] = base + Vec3::new(2.0 / 255.0, 0.0, 0.0);
        assert!(!point_cloud_has_uniform_color(&cloud_with_colors(colors)));
    }

    #[test]
    fn empty_bounds_have_zero_extent_and_centre() {
        let bounds = Aabb::empty();
        assert!(bounds.is_empty());
        assert_eq!(bounds.max_extent(), 0.0);
        assert_eq!(bounds.center(), Vec3::ZERO);

        let single = Aabb::from_points(&[Vec3::new(1.0, 2.0, 3.0)]);
        assert!(!single.is_empty());
        assert_eq!(single.max_extent(), 0.0);
        assert_eq!(single.center(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn union_ignores_empty_side() {
        let a = Aabb::from_points(&[Vec3::ZERO, Vec3::ONE]);
        assert_eq!(a.union(Aabb::empty()), a);
        assert_eq!(Aabb::empty().union(a), a);
        let b = Aabb::from_points(&[Vec3::splat(-2.0)]);
        assert_eq!(a.union(b).max_extent(), 3.0);
    }

    #[test]
    fn vertex_normals_of_flat_square_point_up() {
        let mut mesh = TriangleMesh {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            ..TriangleMesh::default()
        };
        mesh.compute_vertex_normals();
        assert_eq!(mesh.vertex_normals.len(), 4);
        for normal in &mesh.vertex_normals {
            assert!((*normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn normalize_normals_yields_unit_vectors() {
        let mut cloud = PointCloud {
            points: vec![Vec3::ZERO, Vec3::ONE],
            normals: vec![Vec3::new(0.0, 3.0, 0.0), Vec3::new(2.0, 2.0, 0.0)],
            colors: Vec::new(),
        };
        cloud.normalize_normals();
        for normal in &cloud.normals {
            assert!((normal.length() - 1.0).abs() < 1e-6);
        }
    }
}
