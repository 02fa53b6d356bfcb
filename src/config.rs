//! Viewer configuration file and command-line arguments.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub resource_dir: PathBuf,
    pub window_width: f32,
    pub window_height: f32,
    pub title: String,
    /// Lighting profile applied at startup, by name.
    pub lighting_profile: Option<String>,
    pub show_axes: bool,
    pub show_skybox: bool,
    pub background_color: [f32; 3],
    pub point_size: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("resources"),
            window_width: 1024.0,
            window_height: 768.0,
            title: "geoviz".to_string(),
            lighting_profile: None,
            show_axes: false,
            show_skybox: false,
            background_color: [1.0, 1.0, 1.0],
            point_size: 3.0,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Makes a relative resource directory absolute: the working directory
    /// wins when it has the directory, then the crate manifest directory.
    pub fn resolve_resource_dir(&mut self) {
        if self.resource_dir.is_absolute() {
            return;
        }
        let candidates = [
            std::env::current_dir().ok(),
            Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
        ];
        for base in candidates.into_iter().flatten() {
            let dir = base.join(&self.resource_dir);
            if dir.is_dir() {
                self.resource_dir = dir;
                return;
            }
        }
        log::warn!(
            "Resource directory {} not found",
            self.resource_dir.display()
        );
    }
}

/// Command line: `geoviz [--config FILE] [--resources DIR] [GEOMETRY]`.
#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(name = "geoviz", version)]
#[command(about = "Viewer for point clouds, line sets and triangle meshes")]
pub struct Args {
    /// Viewer configuration file (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Directory holding environment maps and materials
    #[arg(long, value_name = "DIR")]
    pub resources: Option<PathBuf>,
    /// Geometry file to open at startup
    #[arg(value_name = "GEOMETRY")]
    pub geometry: Option<PathBuf>,
}

impl Args {
    /// Reads the requested config file (defaults without one) and applies
    /// the command-line overrides.
    pub fn into_config(self) -> Result<(ViewerConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(resources) = self.resources {
            config.resource_dir = resources;
        }
        config.resolve_resource_dir();
        Ok((config, self.geometry))
    }
}
