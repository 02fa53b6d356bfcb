use std::collections::HashMap;

use glam::{IVec3, Mat3, Vec3};

pub(super) const DEFAULT_NEIGHBOURS: usize = 16;

// Neighbourhoods smaller than this cannot span a plane.
const MIN_NEIGHBOURS: usize = 3;
const POWER_ITERATIONS: usize = 48;

/// Uniform grid over the cloud so that neighbour queries only visit nearby
/// cells.
struct VoxelGrid {
    cell_size: f32,
    origin: Vec3,
    cells: HashMap<IVec3, Vec<usize>>,
}

impl VoxelGrid {
    fn build(points: &[Vec3], neighbours: usize) -> Self {
        let bounds = super::Aabb::from_points(points);
        let extent = bounds.max_extent();
        // Aim for roughly `neighbours` points per cell on a surface.
        let cells_per_axis = ((points.len() / neighbours.max(1)).max(1) as f32).sqrt().max(1.0);
        let cell_size = if extent > 0.0 {
            extent / cells_per_axis
        } else {
            1.0
        };

        let mut grid = Self {
            cell_size,
            origin: bounds.min,
            cells: HashMap::new(),
        };
        for (index, &point) in points.iter().enumerate() {
            let key = grid.cell_of(point);
            grid.cells.entry(key).or_default().push(index);
        }
        grid
    }

    fn cell_of(&self, point: Vec3) -> IVec3 {
        ((point - self.origin) / self.cell_size).floor().as_ivec3()
    }

    /// Up to `k` nearest points to `points[query]`, the query included.
    fn nearest(&self, points: &[Vec3], query: usize, k: usize) -> Vec<usize> {
        let center = points[query];
        let home = self.cell_of(center);
        let mut candidates: Vec<(f32, usize)> = Vec::new();
        let mut ring = 1;
        loop {
            candidates.clear();
            for dz in -ring..=ring {
                for dy in -ring..=ring {
                    for dx in -ring..=ring {
                        let Some(bucket) = self.cells.get(&(home + IVec3::new(dx, dy, dz))) else {
                            continue;
                        };
                        candidates.extend(
                            bucket
                                .iter()
                                .map(|&index| (points[index].distance_squared(center), index)),
                        );
                    }
                }
            }
            // Widen until enough candidates are found or the grid is covered.
            if candidates.len() >= k || ring as usize > self.cells.len() || ring >= 8 {
                break;
            }
            ring += 1;
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.truncate(k);
        candidates.into_iter().map(|(_, index)| index).collect()
    }
}

pub(super) fn estimate(points: &[Vec3], neighbours: usize) -> Vec<Vec3> {
    if points.is_empty() {
        return Vec::new();
    }
    let grid = VoxelGrid::build(points, neighbours);
    (0..points.len())
        .map(|index| {
            let neighbourhood = grid.nearest(points, index, neighbours);
            let normal = plane_normal(points, &neighbourhood);
            if normal.z < 0.0 {
                -normal
            } else {
                normal
            }
        })
        .collect()
}

fn plane_normal(points: &[Vec3], neighbourhood: &[usize]) -> Vec3 {
    if neighbourhood.len() < MIN_NEIGHBOURS {
        return Vec3::Z;
    }
    let count = neighbourhood.len() as f32;
    let mean = neighbourhood.iter().map(|&i| points[i]).sum::<Vec3>() / count;

    let mut covariance = Mat3::ZERO;
    for &i in neighbourhood {
        let d = points[i] - mean;
        covariance += Mat3::from_cols(d * d.x, d * d.y, d * d.z);
    }
    covariance = covariance * (1.0 / count);

    smallest_eigenvector(covariance).unwrap_or(Vec3::Z)
}

/// Eigenvector of the smallest eigenvalue of a symmetric positive
/// semi-definite matrix, by power iteration on `trace * I - m`.
fn smallest_eigenvector(m: Mat3) -> Option<Vec3> {
    let trace = m.x_axis.x + m.y_axis.y + m.z_axis.z;
    if trace <= f32::EPSILON {
        return None;
    }
    let shifted = Mat3::from_diagonal(Vec3::splat(trace)) - m;

    let mut v = [shifted.x_axis, shifted.y_axis, shifted.z_axis]
        .into_iter()
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))?
        .try_normalize()?;
    for _ in 0..POWER_ITERATIONS {
        v = (shifted * v).try_normalize()?;
    }
    Some(v)
}
