//! Geometry file readers and the mesh-then-point-cloud load sequence.

use std::path::{Path, PathBuf};

use glam::Vec3;

use super::{Geometry, PointCloud, TriangleMesh};

#[derive(Debug, thiserror::Error)]
pub enum GeometryIoError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: unsupported format for {kind}")]
    UnsupportedFormat { path: PathBuf, kind: &'static str },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{path}: no points")]
    Empty { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, GeometryIoError>;

pub trait GeometryReader {
    fn read_triangle_mesh(&self, path: &Path) -> Result<TriangleMesh>;
    fn read_point_cloud(&self, path: &Path) -> Result<PointCloud>;
}

/// Reads the given file as a triangle mesh, falling back to a point cloud.
///
/// A mesh without triangles is discarded in favour of the point-cloud
/// reading. Returns `None` only when neither reading succeeds.
pub fn load_geometry<R: GeometryReader + ?Sized>(reader: &R, path: &Path) -> Option<Geometry> {
    match reader.read_triangle_mesh(path) {
        Ok(mut mesh) if !mesh.triangles.is_empty() => {
            mesh.compute_vertex_normals();
            return Some(Geometry::TriangleMesh(mesh));
        }
        Ok(_) => log::warn!(
            "{} contains 0 triangles, will read as point cloud",
            path.display()
        ),
        Err(err) => log::warn!("Failed to read mesh: {}", err),
    }

    match reader.read_point_cloud(path) {
        Ok(mut cloud) => {
            log::info!("Successfully read {}", path.display());
            if !cloud.has_normals() {
                cloud.estimate_normals();
            }
            cloud.normalize_normals();
            Some(Geometry::PointCloud(cloud))
        }
        Err(err) => {
            log::warn!("Failed to read points: {}", err);
            None
        }
    }
}

/// Plain-text formats: `.xyz`, `.xyzn`, `.xyzrgb` point clouds and `.off`
/// meshes (`COFF` vertex colours included).
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiGeometryReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Xyz,
    Xyzn,
    Xyzrgb,
    Off,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xyz" => Some(Self::Xyz),
            "xyzn" => Some(Self::Xyzn),
            "xyzrgb" => Some(Self::Xyzrgb),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

impl GeometryReader for AsciiGeometryReader {
    fn read_triangle_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        match Format::of(path) {
            Some(Format::Off) => parse_off(path, &read_text(path)?),
            _ => Err(GeometryIoError::UnsupportedFormat {
                path: path.to_path_buf(),
                kind: "triangle mesh",
            }),
        }
    }

    fn read_point_cloud(&self, path: &Path) -> Result<PointCloud> {
        let cloud = match Format::of(path) {
            Some(Format::Off) => {
                let mesh = parse_off(path, &read_text(path)?)?;
                PointCloud {
                    points: mesh.vertices,
                    normals: Vec::new(),
                    colors: mesh.vertex_colors,
                }
            }
            Some(format) => parse_xyz(path, &read_text(path)?, format)?,
            None => {
                return Err(GeometryIoError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    kind: "point cloud",
                })
            }
        };
        if cloud.points.is_empty() {
            return Err(GeometryIoError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(cloud)
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| GeometryIoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Non-empty, non-comment lines with their 1-based line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn parse_numbers<T: std::str::FromStr>(
    path: &Path,
    line_no: usize,
    line: &str,
) -> Result<Vec<T>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<T>().map_err(|_| GeometryIoError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("invalid number '{token}'"),
            })
        })
        .collect()
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> GeometryIoError {
    GeometryIoError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn parse_xyz(path: &Path, text: &str, format: Format) -> Result<PointCloud> {
    let columns = if format == Format::Xyz { 3 } else { 6 };

    let mut cloud = PointCloud::default();
    for (line_no, line) in content_lines(text) {
        let values: Vec<f32> = parse_numbers(path, line_no, line)?;
        if values.len() < columns {
            return Err(parse_error(
                path,
                line_no,
                format!("expected {columns} values, found {}", values.len()),
            ));
        }
        cloud.points.push(Vec3::new(values[0], values[1], values[2]));
        match format {
            Format::Xyzn => cloud.normals.push(Vec3::new(values[3], values[4], values[5])),
            Format::Xyzrgb => cloud.colors.push(Vec3::new(values[3], values[4], values[5])),
            Format::Xyz | Format::Off => {}
        }
    }
    Ok(cloud)
}

fn parse_off(path: &Path, text: &str) -> Result<TriangleMesh> {
    let mut lines = content_lines(text);

    let (mut line_no, mut line) = lines
        .next()
        .ok_or_else(|| parse_error(path, 1, "empty OFF file"))?;
    let mut has_colors = false;
    if let Some(rest) = line.strip_suffix("OFF") {
        has_colors = rest == "C";
        if !rest.is_empty() && !has_colors {
            return Err(parse_error(path, line_no, format!("unsupported header '{line}'")));
        }
        (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(path, line_no, "missing element counts"))?;
    }

    let counts: Vec<usize> = parse_numbers(path, line_no, line)?;
    let [vertex_count, face_count, ..] = counts[..] else {
        return Err(parse_error(path, line_no, "expected vertex and face counts"));
    };

    let mut mesh = TriangleMesh::default();
    for _ in 0..vertex_count {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(path, line_no, "missing vertex"))?;
        let values: Vec<f32> = parse_numbers(path, line_no, line)?;
        if values.len() < 3 || (has_colors && values.len() < 6) {
            return Err(parse_error(path, line_no, "truncated vertex"));
        }
        mesh.vertices.push(Vec3::new(values[0], values[1], values[2]));
        if has_colors {
            mesh.vertex_colors
                .push(Vec3::new(values[3], values[4], values[5]) / 255.0);
        }
    }

    for _ in 0..face_count {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(path, line_no, "missing face"))?;
        let values: Vec<u32> = parse_numbers(path, line_no, line)?;
        let Some((&arity, indices)) = values.split_first() else {
            return Err(parse_error(path, line_no, "empty face"));
        };
        let arity = arity as usize;
        if arity < 3 || indices.len() < arity {
            return Err(parse_error(path, line_no, "malformed face"));
        }
        let indices = &indices[..arity];
        if indices.iter().any(|&index| index as usize >= vertex_count) {
            return Err(parse_error(path, line_no, "face index out of range"));
        }
        // Fan triangulation
        for k in 1..arity - 1 {
            mesh.triangles.push([indices[0], indices[k], indices[k + 1]]);
        }
    }

    Ok(mesh)
}
