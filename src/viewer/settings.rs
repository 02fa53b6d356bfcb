use glam::{Quat, Vec3};

use crate::lighting::{self, LightingProfile, ProfileSelection};
use crate::material::{MaterialType, DEFAULT_MATERIAL_NAME};
use crate::render::ViewControls;

pub const IBL_INTENSITY_RANGE: std::ops::RangeInclusive<f32> = 0.0..=150_000.0;
pub const SUN_INTENSITY_RANGE: std::ops::RangeInclusive<f32> = 0.0..=500_000.0;
pub const POINT_SIZE_RANGE: std::ops::RangeInclusive<f32> = 1.0..=10.0;

/// What a left drag in the 3D view does. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    Arcball,
    Fly,
    Model,
    Sun,
    Environment,
}

impl MouseMode {
    pub const ALL: [MouseMode; 5] = [
        Self::Arcball,
        Self::Fly,
        Self::Model,
        Self::Sun,
        Self::Environment,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Arcball => "Arcball",
            Self::Fly => "Fly",
            Self::Model => "Model",
            Self::Sun => "Sun",
            Self::Environment => "Environment",
        }
    }

    pub fn view_controls(self) -> ViewControls {
        match self {
            Self::Arcball => ViewControls::RotateCamera,
            Self::Fly => ViewControls::Fly,
            Self::Model => ViewControls::RotateModel,
            Self::Sun => ViewControls::RotateSun,
            Self::Environment => ViewControls::RotateIbl,
        }
    }

    /// Only fly mode consumes per-frame tick events.
    pub fn wants_tick_events(self) -> bool {
        self == Self::Fly
    }
}

/// Widget values of the settings panel. The viewer keeps these in step with
/// the renderer on every change; the UI only reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsPanel {
    pub visible: bool,
    pub help_visible: bool,

    pub mouse_mode: MouseMode,
    pub show_skybox: bool,
    pub background_color: [f32; 3],
    pub show_axes: bool,

    pub profile: ProfileSelection,
    pub advanced_open: bool,
    pub ibl_enabled: bool,
    pub sun_enabled: bool,
    pub environment_maps: Vec<String>,
    pub environment_map: String,
    pub ibl_intensity: f32,
    pub ibl_rotation: Quat,
    pub sun_intensity: f32,
    pub sun_dir: Vec3,
    pub sun_color: Vec3,

    pub material_type: MaterialType,
    pub prefab: String,
    pub prefab_enabled: bool,
    pub point_size: f32,
    pub point_size_enabled: bool,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        let profile = lighting::default_profile();
        Self {
            visible: true,
            help_visible: false,
            mouse_mode: MouseMode::Arcball,
            show_skybox: false,
            background_color: [1.0, 1.0, 1.0],
            show_axes: false,
            profile: ProfileSelection::Named(0),
            advanced_open: false,
            ibl_enabled: profile.ibl_enabled,
            sun_enabled: profile.sun_enabled,
            environment_maps: Vec::new(),
            environment_map: lighting::DEFAULT_IBL.to_string(),
            ibl_intensity: profile.ibl_intensity,
            ibl_rotation: profile.ibl_rotation,
            sun_intensity: profile.sun_intensity,
            sun_dir: profile.sun_dir,
            sun_color: profile.sun_color,
            material_type: MaterialType::Lit,
            prefab: DEFAULT_MATERIAL_NAME.to_string(),
            prefab_enabled: true,
            point_size: 3.0,
            point_size_enabled: false,
        }
    }
}

impl SettingsPanel {
    pub fn set_custom_profile(&mut self) {
        self.profile = ProfileSelection::Custom;
    }

    /// Mirrors a profile's lighting values into the widgets.
    pub fn show_profile(&mut self, profile: &LightingProfile) {
        self.ibl_enabled = profile.ibl_enabled;
        self.show_skybox = false;
        self.sun_enabled = profile.sun_enabled;
        self.environment_map = lighting::DEFAULT_IBL.to_string();
        self.ibl_intensity = profile.ibl_intensity;
        self.ibl_rotation = profile.ibl_rotation;
        self.sun_intensity = profile.sun_intensity;
        self.sun_dir = profile.sun_dir;
        self.sun_color = profile.sun_color;
    }

    /// Selects the material-type entry, updating what depends on it.
    pub fn set_material_selected(&mut self, material_type: MaterialType) {
        self.material_type = material_type;
        self.prefab_enabled = material_type == MaterialType::Lit;
    }

    /// Background colour is only editable while the skybox is hidden.
    pub fn background_editable(&self) -> bool {
        !self.show_skybox
    }
}
