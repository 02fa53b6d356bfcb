use std::path::PathBuf;

use glam::{Vec2, Vec3};

use super::settings::MouseMode;
use crate::material::MaterialType;
use crate::render::CameraMovement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    FileOpen,
    FileExportRgb,
    FileClose,
    SettingsLightAndMaterials,
    HelpKeys,
    HelpAbout,
    HelpContact,
}

/// Everything the UI can ask the viewer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Menu(MenuItem),
    /// Opened from the file dialog or dropped on the window.
    OpenGeometry(PathBuf),
    ExportImage {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    SetMouseMode(MouseMode),
    SetShowSkybox(bool),
    SetBackgroundColor([f32; 3]),
    SetShowAxes(bool),

    /// Selector index; one past the last preset is Custom.
    SelectProfile(usize),
    SetAdvancedOpen(bool),
    SetIblEnabled(bool),
    SetSunEnabled(bool),
    SelectEnvironmentMap(String),
    LoadEnvironmentMap(PathBuf),
    RequestSkyboxFile,
    LoadSkybox(PathBuf),
    SetIblIntensity(f32),
    SetSunIntensity(f32),
    SetSunDirection(Vec3),
    SetSunColor(Vec3),

    SetMaterialType(MaterialType),
    SelectPrefab(String),
    SetPointSize(f32),

    /// Left drag in the 3D view, in points. `zoom` comes from the wheel.
    ViewportDrag { delta: Vec2, zoom: f32 },
    Tick { movement: CameraMovement, dt: f32 },
    CloseDialog,
}

/// File dialogs the host opens on the viewer's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRequest {
    OpenGeometry,
    ExportImage,
    EnvironmentMap,
    Skybox,
}

impl FileRequest {
    pub fn title(self) -> &'static str {
        match self {
            Self::OpenGeometry => "Open Geometry",
            Self::ExportImage => "Save File",
            Self::EnvironmentMap => "Open HDR Map",
            Self::Skybox => "Open skybox",
        }
    }

    pub fn is_save(self) -> bool {
        self == Self::ExportImage
    }

    pub fn filters(self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Self::OpenGeometry => &[
                ("Geometry files (.off, .xyz, .xyzn, .xyzrgb)", &["off", "xyz", "xyzn", "xyzrgb"]),
                ("Object file format (.off)", &["off"]),
                ("ASCII point cloud files (.xyz)", &["xyz"]),
                ("ASCII point cloud with normals (.xyzn)", &["xyzn"]),
                ("ASCII point cloud files with colors (.xyzrgb)", &["xyzrgb"]),
            ],
            Self::ExportImage => &[("PNG images (.png)", &["png"])],
            Self::EnvironmentMap | Self::Skybox => &[("Khronos Texture (.ktx)", &["ktx"])],
        }
    }

    /// Wraps the chosen path in the command that consumes it.
    pub fn into_command(self, path: PathBuf, viewport: (u32, u32)) -> Command {
        match self {
            Self::OpenGeometry => Command::OpenGeometry(path),
            Self::ExportImage => Command::ExportImage {
                path,
                width: viewport.0,
                height: viewport.1,
            },
            Self::EnvironmentMap => Command::LoadEnvironmentMap(path),
            Self::Skybox => Command::LoadSkybox(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    None,
    PickFile(FileRequest),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    About,
    Contact,
    Message { title: String, body: String },
}

impl Dialog {
    pub fn message(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Message {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::About => "About",
            Self::Contact => "Contact Us",
            Self::Message { title, .. } => title,
        }
    }
}
