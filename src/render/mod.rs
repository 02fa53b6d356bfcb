mod camera;
pub mod handle;
pub(crate) mod headless;
pub mod raster;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::{Quat, Vec3};

use crate::geometry::{Aabb, Geometry};

pub use camera::{CameraController, CameraMovement};
pub use handle::{Arena, Handle};
pub use headless::HeadlessBackend;
pub use raster::{ScreenPrimitive, Wireframe};

/// RGBA8 frame returned by [`RenderBackend::render_to_image`].
pub type RgbaImage = image::RgbaImage;

pub type ImageCallback = Box<dyn FnOnce(RgbaImage)>;

/// Compiled material program loaded from a `.filamat` file.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub source: PathBuf,
}

/// Parameter block bound to one material program.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInstance {
    pub material: MaterialHandle,
    pub floats: HashMap<String, f32>,
    pub float3s: HashMap<String, Vec3>,
}

/// Image-based light. Intensity resets to the renderer default on load.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectLight {
    pub source: PathBuf,
    pub intensity: f32,
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skybox {
    pub source: PathBuf,
}

/// A geometry placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGeometry {
    pub type_name: String,
    pub bounds: Aabb,
    pub material: Option<MaterialInstanceHandle>,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub enabled: bool,
    pub wireframe: Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDescription {
    pub intensity: f32,
    pub direction: Vec3,
    pub color: Vec3,
    pub cast_shadows: bool,
}

impl Default for LightDescription {
    fn default() -> Self {
        Self {
            intensity: 100_000.0,
            direction: Vec3::new(0.577, -0.577, -0.577),
            color: Vec3::ONE,
            cast_shadows: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub description: LightDescription,
    pub enabled: bool,
}

pub type MaterialHandle = Handle<Material>;
pub type MaterialInstanceHandle = Handle<MaterialInstance>;
pub type IndirectLightHandle = Handle<IndirectLight>;
pub type SkyboxHandle = Handle<Skybox>;
pub type GeometryHandle = Handle<SceneGeometry>;
pub type LightHandle = Handle<DirectionalLight>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Color,
    Normals,
    Depth,
}

/// What a drag in the 3D view manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewControls {
    #[default]
    RotateCamera,
    Fly,
    RotateModel,
    RotateSun,
    RotateIbl,
}

/// The renderer and its single scene and view, as seen by the viewer.
///
/// Loading calls return `None` when the asset cannot be read. Calls with a
/// handle that no longer resolves are ignored.
pub trait RenderBackend {
    fn add_material(&mut self, path: &Path) -> Option<MaterialHandle>;
    fn add_material_instance(&mut self, material: MaterialHandle) -> Option<MaterialInstanceHandle>;
    fn set_material_float(&mut self, instance: MaterialInstanceHandle, name: &str, value: f32);
    fn set_material_float3(&mut self, instance: MaterialInstanceHandle, name: &str, value: Vec3);
    fn remove_material_instance(&mut self, instance: MaterialInstanceHandle);
    fn add_indirect_light(&mut self, path: &Path) -> Option<IndirectLightHandle>;
    fn add_skybox(&mut self, path: &Path) -> Option<SkyboxHandle>;
    /// Also detaches the light from the scene if it is the active one.
    fn remove_indirect_light(&mut self, light: IndirectLightHandle);
    fn remove_skybox(&mut self, skybox: SkyboxHandle);

    /// Projects every enabled geometry through the current camera.
    fn draw_list(&self, aspect: f32) -> Vec<ScreenPrimitive>;
    /// Renders the current view off-screen. `on_done` may run before this
    /// returns or later.
    fn render_to_image(&mut self, width: u32, height: u32, on_done: ImageCallback);

    fn add_geometry(
        &mut self,
        geometry: &Geometry,
        material: Option<MaterialInstanceHandle>,
    ) -> Option<GeometryHandle>;
    fn remove_geometry(&mut self, geometry: GeometryHandle);
    fn geometry_bounds(&self, geometry: GeometryHandle) -> Aabb;
    fn assign_material(&mut self, geometry: GeometryHandle, material: MaterialInstanceHandle);
    fn set_geometry_shadows(&mut self, geometry: GeometryHandle, cast: bool, receive: bool);
    fn set_geometry_enabled(&mut self, geometry: GeometryHandle, enabled: bool);

    fn add_directional_light(&mut self, description: LightDescription) -> LightHandle;
    fn set_light_enabled(&mut self, light: LightHandle, enabled: bool);
    fn set_light_intensity(&mut self, light: LightHandle, intensity: f32);
    fn set_light_direction(&mut self, light: LightHandle, direction: Vec3);
    fn set_light_color(&mut self, light: LightHandle, color: Vec3);

    fn set_indirect_light(&mut self, light: Option<IndirectLightHandle>);
    fn indirect_light_intensity(&self) -> f32;
    fn set_indirect_light_intensity(&mut self, intensity: f32);
    fn set_indirect_light_rotation(&mut self, rotation: Quat);
    fn set_skybox(&mut self, skybox: Option<SkyboxHandle>);

    fn view_mode(&self) -> ViewMode;
    fn set_view_mode(&mut self, mode: ViewMode);
    fn set_background_color(&mut self, color: [f32; 4]);
    /// Point size of the renderer's own depth and normals materials.
    fn set_builtin_point_size(&mut self, size: f32);
    fn set_view_controls(&mut self, controls: ViewControls);

    fn setup_camera(&mut self, vertical_fov_deg: f32, bounds: &Aabb, center: Vec3);
    fn orbit_camera(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32);
    /// Turns the camera in place, then moves it along its view direction.
    fn nudge_camera(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32);
    fn fly_camera(&mut self, movement: &CameraMovement, frame_dt: f32) -> bool;
    fn camera(&self) -> &CameraController;
}
