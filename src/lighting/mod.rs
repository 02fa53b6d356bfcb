//! Named lighting presets for the viewer.

pub mod environment;

use glam::{Quat, Vec3};

/// Name of the environment map that is preselected at startup.
pub const DEFAULT_IBL: &str = "default";

/// Preset forced when every loaded geometry is a point cloud.
pub const POINT_CLOUD_PROFILE_NAME: &str = "Cloudy day (no direct sun)";

pub const CUSTOM_PROFILE_NAME: &str = "Custom";

const SUN_AT_POS_Y: Vec3 = Vec3::new(0.577, -0.577, -0.577);
const SUN_AT_NEG_Y: Vec3 = Vec3::new(0.577, 0.577, 0.577);
const SUN_AT_POS_Z: Vec3 = Vec3::new(0.577, 0.577, -0.577);

// Half turn about +X.
const FLIP_Y: Quat = Quat::from_xyzw(1.0, 0.0, 0.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingProfile {
    pub name: &'static str,
    pub ibl_intensity: f32,
    pub sun_intensity: f32,
    pub sun_dir: Vec3,
    pub sun_color: Vec3,
    pub ibl_rotation: Quat,
    pub ibl_enabled: bool,
    pub use_default_ibl: bool,
    pub sun_enabled: bool,
}

impl LightingProfile {
    const fn day(name: &'static str, ibl_intensity: f32, sun_dir: Vec3, ibl_rotation: Quat) -> Self {
        Self {
            name,
            ibl_intensity,
            sun_intensity: 100_000.0,
            sun_dir,
            sun_color: Vec3::ONE,
            ibl_rotation,
            ibl_enabled: true,
            use_default_ibl: false,
            sun_enabled: true,
        }
    }
}

pub static LIGHTING_PROFILES: [LightingProfile; 7] = [
    LightingProfile::day(
        "Bright day with sun at +Y [default]",
        100_000.0,
        SUN_AT_POS_Y,
        Quat::IDENTITY,
    ),
    LightingProfile::day("Bright day with sun at -Y", 100_000.0, SUN_AT_NEG_Y, FLIP_Y),
    LightingProfile::day(
        "Bright day with sun at +Z",
        100_000.0,
        SUN_AT_POS_Z,
        Quat::IDENTITY,
    ),
    LightingProfile::day(
        "Less bright day with sun at +Y",
        75_000.0,
        SUN_AT_POS_Y,
        Quat::IDENTITY,
    ),
    LightingProfile::day("Less bright day with sun at -Y", 75_000.0, SUN_AT_NEG_Y, FLIP_Y),
    LightingProfile::day(
        "Less bright day with sun at +Z",
        75_000.0,
        SUN_AT_POS_Z,
        Quat::IDENTITY,
    ),
    LightingProfile {
        name: POINT_CLOUD_PROFILE_NAME,
        ibl_intensity: 60_000.0,
        sun_intensity: 100_000.0,
        sun_dir: SUN_AT_POS_Y,
        sun_color: Vec3::ONE,
        ibl_rotation: Quat::IDENTITY,
        ibl_enabled: true,
        use_default_ibl: true,
        sun_enabled: false,
    },
];

pub fn default_profile() -> &'static LightingProfile {
    &LIGHTING_PROFILES[0]
}

pub fn find_profile(name: &str) -> Option<(usize, &'static LightingProfile)> {
    LIGHTING_PROFILES
        .iter()
        .enumerate()
        .find(|(_, profile)| profile.name == name)
}

/// Which entry the lighting-profile selector shows.
///
/// `Custom` is entered by any individual lighting edit and left only by
/// applying a named profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSelection {
    Named(usize),
    Custom,
}

impl ProfileSelection {
    /// Selector index; Custom sits one past the last preset.
    pub fn ui_index(self) -> usize {
        match self {
            Self::Named(index) => index,
            Self::Custom => LIGHTING_PROFILES.len(),
        }
    }

    pub fn from_ui_index(index: usize) -> Option<Self> {
        if index < LIGHTING_PROFILES.len() {
            Some(Self::Named(index))
        } else if index == LIGHTING_PROFILES.len() {
            Some(Self::Custom)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Named(index) => LIGHTING_PROFILES
                .get(index)
                .map(|profile| profile.name)
                .unwrap_or(CUSTOM_PROFILE_NAME),
            Self::Custom => CUSTOM_PROFILE_NAME,
        }
    }
}
