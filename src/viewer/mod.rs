//! Binds the settings panel to the renderer: lighting profiles, environment
//! maps, per-geometry materials and the window-level menu actions.

pub mod command;
mod export;
pub mod settings;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Quat;

use crate::config::ViewerConfig;
use crate::geometry::axes::create_axes;
use crate::geometry::io::{load_geometry, GeometryReader};
use crate::geometry::{point_cloud_has_uniform_color, Aabb, Geometry};
use crate::lighting::environment::{self, CUSTOM_ENVIRONMENT_ENTRY};
use crate::lighting::{self, LightingProfile, ProfileSelection, LIGHTING_PROFILES};
use crate::material::{prefab_materials, MaterialType, Materials};
use crate::render::{
    CameraMovement, GeometryHandle, IndirectLightHandle, LightDescription, LightHandle, MaterialHandle,
    RenderBackend, ScreenPrimitive, SkyboxHandle, ViewMode,
};

pub use command::{Command, CommandOutcome, Dialog, FileRequest, MenuItem};
pub use export::{write_image, ExportError};
pub use settings::{MouseMode, SettingsPanel};

const CAMERA_FOV_DEG: f32 = 60.0;
const MIN_AXIS_LENGTH: f32 = 0.001;
/// Radians per point of mouse drag.
const DRAG_SENSITIVITY: f32 = 0.01;

pub struct Visualizer<B: RenderBackend> {
    backend: B,
    reader: Box<dyn GeometryReader>,
    resource_dir: PathBuf,
    app_name: String,
    title: String,
    settings: SettingsPanel,
    dialog: Option<Dialog>,
    notices: Rc<RefCell<Vec<Dialog>>>,

    sun: LightHandle,
    ibl: Option<IndirectLightHandle>,
    sky: Option<SkyboxHandle>,
    lit_material: Option<MaterialHandle>,
    unlit_material: Option<MaterialHandle>,

    axes: Option<GeometryHandle>,
    geometries: Vec<GeometryHandle>,
    materials: HashMap<GeometryHandle, Materials>,
}

impl<B: RenderBackend> Visualizer<B> {
    /// Sets up the sun, the default environment and the shading programs
    /// from the resource directory, then shows an empty scene.
    pub fn new(mut backend: B, reader: Box<dyn GeometryReader>, config: &ViewerConfig) -> Self {
        let resource_dir = config.resource_dir.clone();
        let profile = lighting::default_profile();

        let sun = backend.add_directional_light(LightDescription {
            intensity: profile.sun_intensity,
            direction: profile.sun_dir,
            color: profile.sun_color,
            cast_shadows: true,
        });

        let ibl_path = environment::default_ibl_path(&resource_dir);
        let ibl = backend.add_indirect_light(&ibl_path);
        if ibl.is_none() {
            log::warn!("Could not load default environment {}", ibl_path.display());
        }
        backend.set_indirect_light(ibl);
        backend.set_indirect_light_intensity(profile.ibl_intensity);
        backend.set_indirect_light_rotation(profile.ibl_rotation);

        let sky_path = environment::skybox_path_for(&ibl_path).unwrap_or(ibl_path);
        let sky = backend.add_skybox(&sky_path);
        if sky.is_none() {
            log::warn!("Could not load default skybox {}", sky_path.display());
        }
        backend.set_skybox(if config.show_skybox { sky } else { None });

        let lit_material = load_material(&mut backend, &resource_dir, "defaultLit.filamat");
        let unlit_material = load_material(&mut backend, &resource_dir, "defaultUnlit.filamat");

        let [r, g, b] = config.background_color;
        backend.set_background_color([r, g, b, 1.0]);
        backend.set_builtin_point_size(config.point_size);

        let settings = SettingsPanel {
            show_skybox: config.show_skybox,
            background_color: config.background_color,
            show_axes: config.show_axes,
            point_size: config.point_size,
            environment_maps: environment::environment_choices(&resource_dir),
            ..SettingsPanel::default()
        };

        let mut viewer = Self {
            backend,
            reader,
            resource_dir,
            app_name: config.title.clone(),
            title: config.title.clone(),
            settings,
            dialog: None,
            notices: Rc::new(RefCell::new(Vec::new())),
            sun,
            ibl,
            sky,
            lit_material,
            unlit_material,
            axes: None,
            geometries: Vec::new(),
            materials: HashMap::new(),
        };
        viewer.set_geometry(&[]);
        if let Some(name) = &config.lighting_profile {
            viewer.select_profile_by_name(name);
        }
        viewer
    }

    pub fn settings(&self) -> &SettingsPanel {
        &self.settings
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn geometry_handles(&self) -> &[GeometryHandle] {
        &self.geometries
    }

    /// The scene as seen by a `width` x `height` pixel viewport.
    pub fn draw_list(&self, (width, height): (u32, u32)) -> Vec<ScreenPrimitive> {
        self.backend
            .draw_list(width.max(1) as f32 / height.max(1) as f32)
    }

    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        self.poll_notices();
        log::debug!("Command {:?}", command);

        match command {
            Command::Menu(item) => return self.on_menu_item(item),
            Command::OpenGeometry(path) => self.open_geometry(&path),
            Command::ExportImage {
                path,
                width,
                height,
            } => self.export_current_image(width, height, path),

            Command::SetMouseMode(mode) => {
                self.settings.mouse_mode = mode;
                self.backend.set_view_controls(mode.view_controls());
            }
            Command::SetShowSkybox(show) => {
                self.settings.show_skybox = show;
                self.backend.set_skybox(if show { self.sky } else { None });
            }
            Command::SetBackgroundColor(color) => {
                self.settings.background_color = color;
                let [r, g, b] = color;
                self.backend.set_background_color([r, g, b, 1.0]);
            }
            Command::SetShowAxes(show) => {
                self.settings.show_axes = show;
                if let Some(axes) = self.axes {
                    self.backend.set_geometry_enabled(axes, show);
                }
            }

            Command::SelectProfile(index) => match ProfileSelection::from_ui_index(index) {
                Some(ProfileSelection::Named(index)) => self.apply_profile(&LIGHTING_PROFILES[index]),
                Some(ProfileSelection::Custom) => self.settings.advanced_open = true,
                None => log::warn!("No lighting profile at index {}", index),
            },
            Command::SetAdvancedOpen(open) => self.settings.advanced_open = open,
            Command::SetIblEnabled(enabled) => {
                self.settings.set_custom_profile();
                self.settings.ibl_enabled = enabled;
                if enabled {
                    self.backend.set_indirect_light(self.ibl);
                    self.backend
                        .set_indirect_light_intensity(self.settings.ibl_intensity);
                    self.backend
                        .set_indirect_light_rotation(self.settings.ibl_rotation);
                } else {
                    self.backend.set_indirect_light(None);
                }
            }
            Command::SetSunEnabled(enabled) => {
                self.settings.set_custom_profile();
                self.settings.sun_enabled = enabled;
                self.backend.set_light_enabled(self.sun, enabled);
            }
            Command::SelectEnvironmentMap(name) => {
                let path = environment::ibl_path(&self.resource_dir, &name);
                if self.set_ibl(Some(&path)) {
                    self.settings.environment_map = name;
                } else {
                    return CommandOutcome::PickFile(FileRequest::EnvironmentMap);
                }
            }
            Command::LoadEnvironmentMap(path) => {
                if self.set_ibl(Some(&path)) {
                    self.settings.environment_map = CUSTOM_ENVIRONMENT_ENTRY.to_string();
                }
                self.settings.set_custom_profile();
            }
            Command::RequestSkyboxFile => return CommandOutcome::PickFile(FileRequest::Skybox),
            Command::LoadSkybox(path) => self.load_skybox(&path),
            Command::SetIblIntensity(intensity) => {
                self.settings.ibl_intensity = intensity;
                self.backend.set_indirect_light_intensity(intensity);
                self.settings.set_custom_profile();
            }
            Command::SetSunIntensity(intensity) => {
                self.settings.sun_intensity = intensity;
                self.backend.set_light_intensity(self.sun, intensity);
                self.settings.set_custom_profile();
            }
            Command::SetSunDirection(direction) => {
                self.settings.sun_dir = direction;
                self.backend
                    .set_light_direction(self.sun, direction.normalize_or_zero());
                self.settings.set_custom_profile();
            }
            Command::SetSunColor(color) => {
                self.settings.set_custom_profile();
                self.settings.sun_color = color;
                self.backend.set_light_color(self.sun, color);
            }

            Command::SetMaterialType(material_type) => self.set_material_type(material_type),
            Command::SelectPrefab(name) => self.select_prefab(&name),
            Command::SetPointSize(size) => self.set_point_size(size),

            Command::ViewportDrag { delta, zoom } => self.on_drag(delta.x, delta.y, zoom),
            Command::Tick { movement, dt } => self.tick(&movement, dt),
            Command::CloseDialog => self.dialog = None,
        }
        CommandOutcome::None
    }

    /// Moves finished asynchronous results (export errors) into the dialog
    /// slot.
    pub fn poll_notices(&mut self) {
        let pending: Vec<Dialog> = self.notices.borrow_mut().drain(..).collect();
        for notice in pending {
            self.show_message_box(notice);
        }
    }

    fn show_message_box(&mut self, dialog: Dialog) {
        if let Dialog::Message { title, body } = &dialog {
            log::warn!("{}: {}", title, body);
        }
        self.dialog = Some(dialog);
    }

    fn on_menu_item(&mut self, item: MenuItem) -> CommandOutcome {
        match item {
            MenuItem::FileOpen => return CommandOutcome::PickFile(FileRequest::OpenGeometry),
            MenuItem::FileExportRgb => return CommandOutcome::PickFile(FileRequest::ExportImage),
            MenuItem::FileClose => return CommandOutcome::Close,
            MenuItem::SettingsLightAndMaterials => {
                self.settings.visible = !self.settings.visible;
            }
            MenuItem::HelpKeys => {
                self.settings.help_visible = !self.settings.help_visible;
            }
            MenuItem::HelpAbout => self.dialog = Some(Dialog::About),
            MenuItem::HelpContact => self.dialog = Some(Dialog::Contact),
        }
        CommandOutcome::None
    }

    fn open_geometry(&mut self, path: &Path) {
        self.title = format!("{} - {}", self.app_name, path.display());
        if !self.load_geometry(path) {
            self.show_message_box(Dialog::message(
                "Error loading geometry",
                format!("Error reading geometry file '{}'", path.display()),
            ));
        }
    }

    /// Applies every lighting value of `profile` to the scene, mirrors them
    /// into the panel and selects the profile.
    pub fn apply_profile(&mut self, profile: &LightingProfile) {
        if profile.use_default_ibl {
            self.set_ibl(None);
        }
        self.backend
            .set_indirect_light(if profile.ibl_enabled { self.ibl } else { None });
        self.backend.set_indirect_light_intensity(profile.ibl_intensity);
        self.backend.set_indirect_light_rotation(profile.ibl_rotation);
        self.backend.set_skybox(None);
        self.backend.set_light_enabled(self.sun, profile.sun_enabled);
        self.backend.set_light_intensity(self.sun, profile.sun_intensity);
        self.backend.set_light_direction(self.sun, profile.sun_dir);
        self.backend.set_light_color(self.sun, profile.sun_color);

        self.settings.show_profile(profile);
        self.settings.profile = match lighting::find_profile(profile.name) {
            Some((index, _)) => ProfileSelection::Named(index),
            None => ProfileSelection::Custom,
        };
    }

    /// Returns false when no profile has that name; nothing changes then.
    pub fn select_profile_by_name(&mut self, name: &str) -> bool {
        match lighting::find_profile(name) {
            Some((_, profile)) => {
                self.apply_profile(profile);
                true
            }
            None => {
                log::warn!("Could not find lighting profile '{}'", name);
                false
            }
        }
    }

    /// Replaces the environment light with the map at `path`, or the default
    /// map when `path` is `None`. Keeps the panel's intensity and rotation,
    /// and leaves the scene unlit while the HDR checkbox is off.
    ///
    /// For `<name>_ibl.ktx` files the matching `<name>_skybox.ktx` becomes the
    /// skybox, falling back to the light file itself.
    pub fn set_ibl(&mut self, path: Option<&Path>) -> bool {
        let ibl_path = match path {
            Some(path) => path.to_path_buf(),
            None => environment::default_ibl_path(&self.resource_dir),
        };
        let Some(new_ibl) = self.backend.add_indirect_light(&ibl_path) else {
            log::warn!("Could not load environment map {}", ibl_path.display());
            return false;
        };

        let previous = self.ibl.replace(new_ibl);
        if self.settings.ibl_enabled {
            self.backend.set_indirect_light(Some(new_ibl));
        }
        self.backend
            .set_indirect_light_intensity(self.settings.ibl_intensity);
        self.backend
            .set_indirect_light_rotation(self.settings.ibl_rotation);
        if let Some(previous) = previous {
            self.backend.remove_indirect_light(previous);
        }

        if let Some(skybox_path) = environment::skybox_path_for(&ibl_path) {
            let sky = self.backend.add_skybox(&skybox_path).or_else(|| {
                log::debug!(
                    "No skybox at {}, using {}",
                    skybox_path.display(),
                    ibl_path.display()
                );
                self.backend.add_skybox(&ibl_path)
            });
            if sky.is_none() {
                log::warn!("Could not load a skybox for {}", ibl_path.display());
            }
            self.replace_skybox(sky);
        }
        true
    }

    /// Swaps in `sky`, showing it if the skybox is visible, and frees the
    /// skybox it replaces.
    fn replace_skybox(&mut self, sky: Option<SkyboxHandle>) {
        let previous = std::mem::replace(&mut self.sky, sky);
        if self.settings.show_skybox {
            self.backend.set_skybox(self.sky);
        }
        if let Some(previous) = previous.filter(|&previous| Some(previous) != sky) {
            self.backend.remove_skybox(previous);
        }
    }

    fn load_skybox(&mut self, path: &Path) {
        let Some(sky) = self.backend.add_skybox(path) else {
            log::warn!("Could not load skybox {}", path.display());
            return;
        };
        self.settings.show_skybox = true;
        self.settings.set_custom_profile();
        self.replace_skybox(Some(sky));
    }

    /// Replaces everything on screen with `geometries`, choosing lit or unlit
    /// shading for each, then rebuilds the axes and frames the camera.
    pub fn set_geometry(&mut self, geometries: &[Geometry]) {
        if let Some(axes) = self.axes.take() {
            self.backend.remove_geometry(axes);
        }
        for handle in self.geometries.drain(..) {
            self.backend.remove_geometry(handle);
        }
        self.release_materials();

        let mut bounds = Aabb::empty();
        let point_clouds = geometries.iter().filter(|g| g.is_point_cloud()).count();
        for geometry in geometries {
            let mut materials = self.new_materials();

            let shading = match geometry {
                Geometry::PointCloud(cloud) => {
                    if cloud.has_colors() && !point_cloud_has_uniform_color(cloud) {
                        MaterialType::Unlit
                    } else {
                        MaterialType::Lit
                    }
                }
                Geometry::LineSet(_) => MaterialType::Unlit,
                Geometry::TriangleMesh(mesh) if mesh.has_vertex_colors() => MaterialType::Unlit,
                Geometry::TriangleMesh(_) => MaterialType::Lit,
                Geometry::Other { type_name } => {
                    log::warn!("Geometry type {} not supported!", type_name);
                    materials.release(&mut self.backend);
                    continue;
                }
            };

            let Some(handle) = self
                .backend
                .add_geometry(geometry, materials.instance_for(shading))
            else {
                log::warn!("Renderer rejected {} geometry", geometry.type_name());
                materials.release(&mut self.backend);
                continue;
            };
            bounds = bounds.union(self.backend.geometry_bounds(handle));
            self.geometries.push(handle);
            self.materials.insert(handle, materials);

            let selected = match self.backend.view_mode() {
                ViewMode::Normals => MaterialType::NormalMap,
                ViewMode::Depth => MaterialType::Depth,
                ViewMode::Color => shading,
            };
            self.settings.set_material_selected(selected);
        }

        if !geometries.is_empty() && point_clouds == geometries.len() {
            self.select_profile_by_name(lighting::POINT_CLOUD_PROFILE_NAME);
        }
        self.settings.point_size_enabled = point_clouds > 0;

        let mut axis_length = bounds.max_extent();
        if axis_length < MIN_AXIS_LENGTH {
            axis_length = 1.0;
        }
        let axes = Geometry::TriangleMesh(create_axes(axis_length));
        self.axes = self.backend.add_geometry(&axes, None);
        if let Some(axes) = self.axes {
            self.backend.set_geometry_shadows(axes, false, false);
            self.backend.set_geometry_enabled(axes, self.settings.show_axes);
        }

        self.backend
            .setup_camera(CAMERA_FOV_DEG, &bounds, bounds.center());
    }

    /// Reads `path` as a mesh, or as a point cloud when that fails, and shows
    /// the result.
    pub fn load_geometry(&mut self, path: &Path) -> bool {
        match load_geometry(self.reader.as_ref(), path) {
            Some(geometry) => {
                self.set_geometry(std::slice::from_ref(&geometry));
                true
            }
            None => false,
        }
    }

    /// Renders the view at the given size and writes it to `path` once the
    /// frame is ready. A failed write is reported as a message box.
    pub fn export_current_image(&mut self, width: u32, height: u32, path: PathBuf) {
        let notices = Rc::clone(&self.notices);
        self.backend.render_to_image(
            width.max(1),
            height.max(1),
            Box::new(move |image| match write_image(&path, &image) {
                Ok(()) => log::info!("Exported {}", path.display()),
                Err(err) => {
                    log::warn!("{}", err);
                    notices.borrow_mut().push(Dialog::message(
                        "Error",
                        format!("Could not write image to {}.", path.display()),
                    ));
                }
            }),
        );
        self.poll_notices();
    }

    fn new_materials(&mut self) -> Materials {
        let mut materials = Materials::default();
        materials.lit.point_size = self.settings.point_size;
        materials.unlit.point_size = self.settings.point_size;
        materials.lit.handle = self
            .lit_material
            .and_then(|material| self.backend.add_material_instance(material));
        materials.unlit.handle = self
            .unlit_material
            .and_then(|material| self.backend.add_material_instance(material));
        materials.lit.upload(&mut self.backend);
        materials.unlit.upload(&mut self.backend);
        materials
    }

    fn release_materials(&mut self) {
        for (_, mut materials) in self.materials.drain() {
            materials.release(&mut self.backend);
        }
    }

    fn set_material_type(&mut self, material_type: MaterialType) {
        self.settings.set_material_selected(material_type);
        match material_type {
            MaterialType::Lit | MaterialType::Unlit => {
                self.backend.set_view_mode(ViewMode::Color);
                for handle in &self.geometries {
                    let instance = self
                        .materials
                        .get(handle)
                        .and_then(|materials| materials.instance_for(material_type));
                    if let Some(instance) = instance {
                        self.backend.assign_material(*handle, instance);
                    }
                }
            }
            MaterialType::NormalMap => self.backend.set_view_mode(ViewMode::Normals),
            MaterialType::Depth => self.backend.set_view_mode(ViewMode::Depth),
        }
    }

    fn select_prefab(&mut self, name: &str) {
        let Some(prefab) = prefab_materials().get(name) else {
            log::debug!("Unknown material prefab '{}'", name);
            return;
        };
        self.settings.prefab = name.to_string();
        let point_size = self.settings.point_size;
        for handle in &self.geometries {
            let Some(materials) = self.materials.get_mut(handle) else {
                continue;
            };
            materials.lit.take_prefab(prefab);
            materials.lit.point_size = point_size;
            materials.lit.upload(&mut self.backend);
            if let Some(instance) = materials.lit.handle {
                self.backend.assign_material(*handle, instance);
            }
        }
    }

    fn set_point_size(&mut self, size: f32) {
        self.settings.point_size = size;
        for materials in self.materials.values_mut() {
            materials.set_point_size(&mut self.backend, size);
        }
        self.backend.set_builtin_point_size(size);
    }

    fn on_drag(&mut self, dx: f32, dy: f32, zoom: f32) {
        let yaw = -dx * DRAG_SENSITIVITY;
        let pitch = -dy * DRAG_SENSITIVITY;
        match self.settings.mouse_mode {
            MouseMode::Arcball | MouseMode::Model => self.backend.orbit_camera(yaw, pitch, zoom),
            MouseMode::Fly => self.backend.nudge_camera(-yaw, pitch, zoom),
            MouseMode::Sun => {
                let (_, right, _) = self.backend.camera().basis();
                let rotation = Quat::from_rotation_y(yaw) * Quat::from_axis_angle(right, pitch);
                let direction = rotation * self.settings.sun_dir;
                self.settings.sun_dir = direction;
                self.backend
                    .set_light_direction(self.sun, direction.normalize_or_zero());
                self.settings.set_custom_profile();
            }
            MouseMode::Environment => {
                let rotation = Quat::from_rotation_y(yaw) * self.settings.ibl_rotation;
                self.settings.ibl_rotation = rotation;
                self.backend.set_indirect_light_rotation(rotation);
                self.settings.set_custom_profile();
            }
        }
    }

    fn tick(&mut self, movement: &CameraMovement, dt: f32) {
        if self.settings.mouse_mode.wants_tick_events() && movement.any() {
            self.backend.fly_camera(movement, dt);
        }
    }
}

#[cfg(test)]
impl<B: RenderBackend> Visualizer<B> {
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn materials_for(&self, geometry: GeometryHandle) -> Option<&Materials> {
        self.materials.get(&geometry)
    }

    pub fn axes_handle(&self) -> Option<GeometryHandle> {
        self.axes
    }
}

impl<B: RenderBackend> Drop for Visualizer<B> {
    fn drop(&mut self) {
        self.release_materials();
    }
}

fn load_material<B: RenderBackend>(
    backend: &mut B,
    resource_dir: &Path,
    file_name: &str,
) -> Option<MaterialHandle> {
    let path = resource_dir.join(file_name);
    let material = backend.add_material(&path);
    if material.is_none() {
        log::warn!("Could not load material {}", path.display());
    }
    material
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::io::AsciiGeometryReader;
    use crate::geometry::{LineSet, PointCloud, TriangleMesh};
    use crate::lighting::POINT_CLOUD_PROFILE_NAME;
    use crate::render::headless::tests::write_ktx;
    use crate::render::HeadlessBackend;
    use glam::{Vec2, Vec3};
    use tempfile::TempDir;

    fn resources() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_ktx(dir.path(), "default_ibl.ktx");
        write_ktx(dir.path(), "default_skybox.ktx");
        write_ktx(dir.path(), "park_ibl.ktx");
        write_ktx(dir.path(), "park_skybox.ktx");
        std::fs::write(dir.path().join("defaultLit.filamat"), b"lit").unwrap();
        std::fs::write(dir.path().join("defaultUnlit.filamat"), b"unlit").unwrap();
        dir
    }

    fn viewer(dir: &TempDir) -> Visualizer<HeadlessBackend> {
        let config = ViewerConfig {
            resource_dir: dir.path().to_path_buf(),
            ..ViewerConfig::default()
        };
        Visualizer::new(HeadlessBackend::new(), Box::new(AsciiGeometryReader), &config)
    }

    fn cloud(points: usize) -> Geometry {
        Geometry::PointCloud(PointCloud {
            points: (0..points).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
            normals: vec![Vec3::Z; points],
            colors: Vec::new(),
        })
    }

    fn colored_cloud(colors: Vec<Vec3>) -> Geometry {
        Geometry::PointCloud(PointCloud {
            points: (0..colors.len()).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect(),
            normals: Vec::new(),
            colors,
        })
    }

    fn mesh() -> Geometry {
        Geometry::TriangleMesh(TriangleMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            triangles: vec![[0, 1, 2]],
            ..TriangleMesh::default()
        })
    }

    fn lighting_fields(panel: &SettingsPanel) -> (f32, f32, Vec3, Vec3, Quat, bool, bool) {
        (
            panel.ibl_intensity,
            panel.sun_intensity,
            panel.sun_dir,
            panel.sun_color,
            panel.ibl_rotation,
            panel.ibl_enabled,
            panel.sun_enabled,
        )
    }

    #[test]
    fn every_profile_round_trips_through_the_panel() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        for (index, profile) in LIGHTING_PROFILES.iter().enumerate() {
            viewer.apply(Command::SelectProfile(index));
            assert_eq!(
                lighting_fields(viewer.settings()),
                (
                    profile.ibl_intensity,
                    profile.sun_intensity,
                    profile.sun_dir,
                    profile.sun_color,
                    profile.ibl_rotation,
                    profile.ibl_enabled,
                    profile.sun_enabled,
                ),
                "profile {}",
                profile.name
            );
            assert_eq!(viewer.settings().profile, ProfileSelection::Named(index));

            let backend = viewer.backend();
            let sun = backend.light(viewer.sun).unwrap();
            assert_eq!(sun.enabled, profile.sun_enabled);
            assert_eq!(sun.description.intensity, profile.sun_intensity);
            assert_eq!(backend.indirect_light_intensity(), profile.ibl_intensity);
            assert_eq!(backend.indirect_light_rotation(), profile.ibl_rotation);
            assert!(backend.skybox().is_none());
        }
    }

    #[test]
    fn any_lighting_edit_switches_to_custom() {
        let dir = resources();
        let park = dir.path().join("park_ibl.ktx");
        let edits = vec![
            Command::SetIblEnabled(false),
            Command::SetSunEnabled(false),
            Command::SetIblIntensity(1234.0),
            Command::SetSunIntensity(4321.0),
            Command::SetSunDirection(Vec3::new(0.0, -1.0, 0.0)),
            Command::SetSunColor(Vec3::new(1.0, 0.5, 0.5)),
            Command::LoadEnvironmentMap(park),
            Command::LoadSkybox(dir.path().join("park_skybox.ktx")),
        ];

        let mut viewer = viewer(&dir);
        for edit in edits {
            viewer.apply(Command::SelectProfile(1));
            assert_eq!(viewer.settings().profile, ProfileSelection::Named(1));
            viewer.apply(edit.clone());
            assert_eq!(viewer.settings().profile, ProfileSelection::Custom, "{edit:?}");
            viewer.apply(Command::SelectProfile(1));
            assert_eq!(viewer.settings().profile, ProfileSelection::Named(1));
        }
    }

    #[test]
    fn dragging_sun_or_environment_switches_to_custom() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        for mode in [MouseMode::Sun, MouseMode::Environment] {
            viewer.apply(Command::SelectProfile(0));
            viewer.apply(Command::SetMouseMode(mode));
            viewer.apply(Command::ViewportDrag {
                delta: Vec2::new(30.0, 10.0),
                zoom: 0.0,
            });
            assert_eq!(viewer.settings().profile, ProfileSelection::Custom);
        }
        assert_ne!(viewer.settings().ibl_rotation, Quat::IDENTITY);
        assert_eq!(
            viewer.backend().indirect_light_rotation(),
            viewer.settings().ibl_rotation
        );
    }

    #[test]
    fn view_toggles_leave_profile_selected() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetShowSkybox(true));
        viewer.apply(Command::SetShowAxes(true));
        viewer.apply(Command::SetBackgroundColor([0.2, 0.2, 0.2]));
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(0));
        assert!(viewer.backend().skybox().is_some());
        assert!(!viewer.settings().background_editable());
    }

    #[test]
    fn custom_entry_opens_advanced_lighting_only() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let before = lighting_fields(viewer.settings());
        viewer.apply(Command::SelectProfile(LIGHTING_PROFILES.len()));
        assert!(viewer.settings().advanced_open);
        assert_eq!(lighting_fields(viewer.settings()), before);
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(0));
    }

    #[test]
    fn unknown_profile_name_changes_nothing() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SelectProfile(2));
        assert!(!viewer.select_profile_by_name("Night on Mars"));
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(2));
    }

    #[test]
    fn all_point_clouds_force_point_cloud_profile() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SelectProfile(2));
        viewer.set_geometry(&[cloud(4), cloud(2)]);

        let (index, _) = lighting::find_profile(POINT_CLOUD_PROFILE_NAME).unwrap();
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(index));
        assert!(viewer.settings().point_size_enabled);
        assert!(!viewer.backend().light(viewer.sun).unwrap().enabled);
    }

    #[test]
    fn mixed_input_keeps_profile() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SelectProfile(2));
        viewer.set_geometry(&[cloud(4), mesh()]);
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(2));
        assert!(viewer.settings().point_size_enabled);

        viewer.set_geometry(&[]);
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(2));
        assert!(!viewer.settings().point_size_enabled);
    }

    #[test]
    fn shading_follows_geometry_kind() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let varied = colored_cloud(vec![Vec3::X, Vec3::Y]);
        let uniform = colored_cloud(vec![Vec3::X, Vec3::X]);
        let lines = Geometry::LineSet(LineSet {
            points: vec![Vec3::ZERO, Vec3::ONE],
            lines: vec![[0, 1]],
            colors: Vec::new(),
        });
        let colored_mesh = Geometry::TriangleMesh(TriangleMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            triangles: vec![[0, 1, 2]],
            vertex_colors: vec![Vec3::ONE; 3],
            vertex_normals: Vec::new(),
        });
        viewer.set_geometry(&[varied, uniform, lines, mesh(), colored_mesh]);

        let expected = [
            MaterialType::Unlit,
            MaterialType::Lit,
            MaterialType::Unlit,
            MaterialType::Lit,
            MaterialType::Unlit,
        ];
        assert_eq!(viewer.geometry_handles().len(), expected.len());
        for (handle, shading) in viewer.geometry_handles().iter().zip(expected) {
            let materials = viewer.materials_for(*handle).unwrap();
            let assigned = viewer.backend().geometry(*handle).unwrap().material;
            assert_eq!(assigned, materials.instance_for(shading));
            assert!(assigned.is_some());
        }
        // The selector mirrors the last geometry.
        assert_eq!(viewer.settings().material_type, MaterialType::Unlit);
        assert!(!viewer.settings().prefab_enabled);
    }

    #[test]
    fn normals_view_mode_wins_over_shading() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetMaterialType(MaterialType::NormalMap));
        viewer.set_geometry(&[mesh()]);
        assert_eq!(viewer.settings().material_type, MaterialType::NormalMap);
    }

    #[test]
    fn unsupported_geometry_is_skipped_and_releases_materials() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let other = Geometry::Other {
            type_name: "VoxelGrid".to_string(),
        };
        viewer.set_geometry(&[other, mesh()]);
        assert_eq!(viewer.geometry_handles().len(), 1);
        assert_eq!(viewer.backend().material_instance_count(), 2);
    }

    #[test]
    fn replacing_geometry_releases_previous_instances() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.set_geometry(&[mesh(), mesh(), cloud(3)]);
        let old = *viewer.materials_for(viewer.geometry_handles()[0]).unwrap();
        assert_eq!(viewer.backend().material_instance_count(), 6);

        viewer.set_geometry(&[mesh()]);
        assert_eq!(viewer.backend().material_instance_count(), 2);
        assert!(viewer.backend().material_instance(old.lit.handle.unwrap()).is_none());
        // One geometry plus the axes.
        assert_eq!(viewer.backend().geometry_count(), 2);
    }

    #[test]
    fn degenerate_bounds_get_unit_axes() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.set_geometry(&[cloud(1)]);
        let axes = viewer.axes_handle().unwrap();
        let entry = viewer.backend().geometry(axes).unwrap();
        let length = entry.bounds.max.x;
        assert!((length - 1.0).abs() < 1e-3, "axis length {length}");
        assert!(!entry.cast_shadows && !entry.receive_shadows);
        assert!(!entry.enabled);
        assert!(viewer.backend().camera().position.is_finite());
    }

    #[test]
    fn axes_scale_with_scene() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetShowAxes(true));
        viewer.set_geometry(&[cloud(5)]);
        let entry = viewer.backend().geometry(viewer.axes_handle().unwrap()).unwrap();
        assert!((entry.bounds.max.x - 4.0).abs() < 1e-3);
        assert!(entry.enabled);
    }

    #[test]
    fn zero_triangle_mesh_file_loads_as_point_cloud() {
        let dir = resources();
        let path = dir.path().join("flat.off");
        std::fs::write(&path, "OFF\n4 0 0\n0 0 0\n1 0 0\n0 1 0\n1 1 0\n").unwrap();

        let mut viewer = viewer(&dir);
        assert!(viewer.load_geometry(&path));
        let handle = viewer.geometry_handles()[0];
        assert_eq!(viewer.backend().geometry(handle).unwrap().type_name, "PointCloud");
        assert_eq!(viewer.settings().profile.label(), POINT_CLOUD_PROFILE_NAME);
    }

    #[test]
    fn unreadable_file_shows_message_box() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let path = dir.path().join("missing.off");
        viewer.apply(Command::OpenGeometry(path.clone()));
        assert_eq!(viewer.title(), format!("geoviz - {}", path.display()));
        assert_eq!(
            viewer.dialog(),
            Some(&Dialog::message(
                "Error loading geometry",
                format!("Error reading geometry file '{}'", path.display())
            ))
        );
        viewer.apply(Command::CloseDialog);
        assert!(viewer.dialog().is_none());
    }

    #[test]
    fn set_ibl_keeps_intensity_and_pairs_skybox() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetIblIntensity(12_345.0));
        viewer.apply(Command::SetShowSkybox(true));

        assert!(viewer.set_ibl(Some(&dir.path().join("park_ibl.ktx"))));
        let backend = viewer.backend();
        assert_eq!(backend.indirect_light_intensity(), 12_345.0);
        assert_eq!(
            backend.indirect_light().unwrap().source,
            dir.path().join("park_ibl.ktx")
        );
        assert_eq!(backend.skybox().unwrap().source, dir.path().join("park_skybox.ktx"));
    }

    #[test]
    fn missing_skybox_falls_back_to_ibl_file() {
        let dir = resources();
        let lonely = write_ktx(dir.path(), "lonely_ibl.ktx");
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetShowSkybox(true));

        assert!(viewer.set_ibl(Some(&lonely)));
        assert_eq!(viewer.backend().skybox().unwrap().source, lonely);
    }

    #[test]
    fn hidden_skybox_stays_hidden_after_set_ibl() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        assert!(viewer.set_ibl(Some(&dir.path().join("park_ibl.ktx"))));
        assert!(viewer.backend().skybox().is_none());

        viewer.apply(Command::SetShowSkybox(true));
        assert_eq!(
            viewer.backend().skybox().unwrap().source,
            dir.path().join("park_skybox.ktx")
        );
    }

    #[test]
    fn failed_set_ibl_keeps_current_light() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let before = viewer.backend().indirect_light_handle();
        assert!(!viewer.set_ibl(Some(&dir.path().join("nope_ibl.ktx"))));
        assert_eq!(viewer.backend().indirect_light_handle(), before);
    }

    #[test]
    fn reenabling_hdr_restores_panel_values() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetIblEnabled(false));
        viewer.apply(Command::SetIblIntensity(5000.0));
        viewer.apply(Command::SetMouseMode(MouseMode::Environment));
        viewer.apply(Command::ViewportDrag {
            delta: Vec2::new(40.0, 0.0),
            zoom: 0.0,
        });
        viewer.apply(Command::SetIblEnabled(true));

        let backend = viewer.backend();
        assert!(backend.indirect_light().is_some());
        assert_eq!(backend.indirect_light_intensity(), 5000.0);
        assert_eq!(backend.indirect_light().unwrap().intensity, 5000.0);
        assert_eq!(backend.indirect_light_rotation(), viewer.settings().ibl_rotation);
        assert_ne!(viewer.settings().ibl_rotation, Quat::IDENTITY);
    }

    #[test]
    fn environment_change_keeps_hdr_off() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetIblEnabled(false));
        viewer.apply(Command::SelectEnvironmentMap("park".to_string()));
        assert!(!viewer.settings().ibl_enabled);
        assert!(viewer.backend().indirect_light().is_none());
        assert_eq!(viewer.settings().environment_map, "park");

        viewer.apply(Command::SetIblEnabled(true));
        assert_eq!(
            viewer.backend().indirect_light().unwrap().source,
            dir.path().join("park_ibl.ktx")
        );
    }

    #[test]
    fn replaced_environments_are_freed() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.apply(Command::SetShowSkybox(true));
        for _ in 0..3 {
            viewer.apply(Command::SelectEnvironmentMap("park".to_string()));
            viewer.apply(Command::LoadSkybox(dir.path().join("default_skybox.ktx")));
            // The point cloud profile reloads the default environment.
            viewer.apply(Command::SelectProfile(LIGHTING_PROFILES.len() - 1));
        }
        let backend = viewer.backend();
        assert_eq!(backend.indirect_light_count(), 1);
        assert_eq!(backend.skybox_count(), 1);
        assert!(backend.indirect_light().is_some());
    }

    #[test]
    fn configured_point_size_reaches_new_instances() {
        let dir = resources();
        let config = ViewerConfig {
            resource_dir: dir.path().to_path_buf(),
            point_size: 7.5,
            ..ViewerConfig::default()
        };
        let mut viewer =
            Visualizer::new(HeadlessBackend::new(), Box::new(AsciiGeometryReader), &config);
        assert_eq!(viewer.backend().builtin_point_size(), 7.5);

        viewer.set_geometry(&[cloud(3)]);
        assert_eq!(viewer.settings().point_size, 7.5);
        let materials = viewer.materials_for(viewer.geometry_handles()[0]).unwrap();
        assert_eq!(materials.lit.point_size, 7.5);
        assert_eq!(materials.unlit.point_size, 7.5);
        for instance in [materials.lit.handle, materials.unlit.handle] {
            let instance = viewer.backend().material_instance(instance.unwrap()).unwrap();
            assert_eq!(instance.floats["pointSize"], 7.5);
        }
    }

    #[test]
    fn custom_environment_entry_asks_for_a_file() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        assert_eq!(
            viewer.settings().environment_maps,
            vec!["default", "park", CUSTOM_ENVIRONMENT_ENTRY]
        );

        let outcome = viewer.apply(Command::SelectEnvironmentMap(
            CUSTOM_ENVIRONMENT_ENTRY.to_string(),
        ));
        assert_eq!(outcome, CommandOutcome::PickFile(FileRequest::EnvironmentMap));
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(0));

        let outcome = viewer.apply(Command::SelectEnvironmentMap("park".to_string()));
        assert_eq!(outcome, CommandOutcome::None);
        assert_eq!(viewer.settings().environment_map, "park");
        assert_eq!(viewer.settings().profile, ProfileSelection::Named(0));
    }

    #[test]
    fn material_type_switch_assigns_instances_and_view_modes() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.set_geometry(&[mesh()]);
        let handle = viewer.geometry_handles()[0];
        let materials = *viewer.materials_for(handle).unwrap();

        viewer.apply(Command::SetMaterialType(MaterialType::Unlit));
        assert_eq!(viewer.backend().geometry(handle).unwrap().material, materials.unlit.handle);
        assert_eq!(viewer.backend().view_mode(), ViewMode::Color);

        viewer.apply(Command::SetMaterialType(MaterialType::Depth));
        assert_eq!(viewer.backend().view_mode(), ViewMode::Depth);
        assert!(!viewer.settings().prefab_enabled);

        viewer.apply(Command::SetMaterialType(MaterialType::Lit));
        assert_eq!(viewer.backend().geometry(handle).unwrap().material, materials.lit.handle);
        assert_eq!(viewer.backend().view_mode(), ViewMode::Color);
        assert!(viewer.settings().prefab_enabled);
    }

    #[test]
    fn prefab_keeps_slider_point_size() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.set_geometry(&[cloud(3)]);
        viewer.apply(Command::SetPointSize(8.0));
        viewer.apply(Command::SelectPrefab("Gold".to_string()));

        let handle = viewer.geometry_handles()[0];
        let lit = viewer.materials_for(handle).unwrap().lit;
        assert_eq!(lit.point_size, 8.0);
        assert_eq!(lit.metallic, 1.0);
        let instance = viewer.backend().material_instance(lit.handle.unwrap()).unwrap();
        assert_eq!(instance.floats["pointSize"], 8.0);
        assert_eq!(instance.float3s["baseColor"], Vec3::new(1.0, 0.766, 0.336));
        assert_eq!(viewer.backend().geometry(handle).unwrap().material, lit.handle);
        assert_eq!(viewer.settings().prefab, "Gold");
    }

    #[test]
    fn point_size_reaches_every_instance_and_builtins() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.set_geometry(&[cloud(3), mesh()]);
        viewer.apply(Command::SetPointSize(6.0));
        for handle in viewer.geometry_handles() {
            let materials = viewer.materials_for(*handle).unwrap();
            for instance in [materials.lit.handle, materials.unlit.handle] {
                let instance = viewer.backend().material_instance(instance.unwrap()).unwrap();
                assert_eq!(instance.floats["pointSize"], 6.0);
            }
        }
        assert_eq!(viewer.backend().builtin_point_size(), 6.0);
    }

    #[test]
    fn export_writes_png() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let path = dir.path().join("out.png");
        viewer.apply(Command::ExportImage {
            path: path.clone(),
            width: 8,
            height: 4,
        });
        assert!(viewer.dialog().is_none());
        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (8, 4));
    }

    #[test]
    fn export_shows_loaded_geometry() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        viewer.set_geometry(&[colored_cloud(vec![Vec3::X, Vec3::Y, Vec3::Z])]);
        let path = dir.path().join("cloud.png");
        viewer.apply(Command::ExportImage {
            path: path.clone(),
            width: 64,
            height: 64,
        });
        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        for color in [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]] {
            assert!(image.pixels().any(|p| p.0 == color), "no {color:?} pixel");
        }
    }

    #[test]
    fn export_failure_shows_message() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let path = dir.path().join("out.notanimage");
        viewer.export_current_image(8, 4, path.clone());
        assert_eq!(
            viewer.dialog(),
            Some(&Dialog::message(
                "Error",
                format!("Could not write image to {}.", path.display())
            ))
        );
    }

    #[test]
    fn menu_items() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        assert_eq!(
            viewer.apply(Command::Menu(MenuItem::FileOpen)),
            CommandOutcome::PickFile(FileRequest::OpenGeometry)
        );
        assert_eq!(
            viewer.apply(Command::Menu(MenuItem::FileExportRgb)),
            CommandOutcome::PickFile(FileRequest::ExportImage)
        );
        assert_eq!(viewer.apply(Command::Menu(MenuItem::FileClose)), CommandOutcome::Close);

        assert!(viewer.settings().visible);
        viewer.apply(Command::Menu(MenuItem::SettingsLightAndMaterials));
        assert!(!viewer.settings().visible);

        viewer.apply(Command::Menu(MenuItem::HelpKeys));
        assert!(viewer.settings().help_visible);

        viewer.apply(Command::Menu(MenuItem::HelpAbout));
        assert_eq!(viewer.dialog(), Some(&Dialog::About));
    }

    #[test]
    fn mouse_mode_selects_view_controls_and_ticks() {
        let dir = resources();
        let mut viewer = viewer(&dir);
        let movement = CameraMovement {
            move_forward: true,
            ..CameraMovement::default()
        };

        let before = viewer.backend().camera().position;
        viewer.apply(Command::Tick { movement, dt: 0.1 });
        assert_eq!(viewer.backend().camera().position, before);

        viewer.apply(Command::SetMouseMode(MouseMode::Fly));
        assert_eq!(viewer.backend().view_controls(), crate::render::ViewControls::Fly);
        viewer.apply(Command::Tick { movement, dt: 0.1 });
        assert_ne!(viewer.backend().camera().position, before);
    }

    #[test]
    fn missing_resources_degrade_to_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer(&dir);
        assert!(viewer.backend().indirect_light().is_none());
        viewer.set_geometry(&[mesh()]);
        assert_eq!(viewer.geometry_handles().len(), 1);
        assert_eq!(viewer.backend().material_instance_count(), 0);
        assert_eq!(viewer.settings().environment_maps, vec![CUSTOM_ENVIRONMENT_ENTRY]);
    }
}
