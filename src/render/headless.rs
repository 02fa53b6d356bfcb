//! In-memory renderer. Keeps every object in arenas, validates asset files
//! when they are loaded and draws frames as flat-shaded points and edges
//! over the background colour.

use std::path::Path;

use glam::{Quat, Vec2, Vec3};

use super::raster::{self, ScreenPrimitive, Wireframe};
use super::{
    Arena, CameraController, CameraMovement, DirectionalLight, GeometryHandle, ImageCallback,
    IndirectLight, IndirectLightHandle, LightDescription, LightHandle, Material, MaterialHandle,
    MaterialInstance, MaterialInstanceHandle, RenderBackend, RgbaImage, SceneGeometry, Skybox,
    SkyboxHandle, ViewControls, ViewMode,
};
use crate::geometry::{Aabb, Geometry};

const KTX1_MAGIC: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Colour of geometry without vertex colours or a bound material.
const FALLBACK_COLOR: Vec3 = Vec3::splat(0.5);
/// Share of a lit colour that does not depend on the sun.
const AMBIENT: f32 = 0.35;

/// Intensity a freshly loaded indirect light starts with.
pub const DEFAULT_INDIRECT_LIGHT_INTENSITY: f32 = 30_000.0;

pub struct HeadlessBackend {
    materials: Arena<Material>,
    instances: Arena<MaterialInstance>,
    indirect_lights: Arena<IndirectLight>,
    skyboxes: Arena<Skybox>,
    geometries: Arena<SceneGeometry>,
    lights: Arena<DirectionalLight>,
    indirect_light: Option<IndirectLightHandle>,
    indirect_light_intensity: f32,
    indirect_light_rotation: Quat,
    skybox: Option<SkyboxHandle>,
    view_mode: ViewMode,
    view_controls: ViewControls,
    background_color: [f32; 4],
    builtin_point_size: f32,
    camera: CameraController,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            materials: Arena::new(),
            instances: Arena::new(),
            indirect_lights: Arena::new(),
            skyboxes: Arena::new(),
            geometries: Arena::new(),
            lights: Arena::new(),
            indirect_light: None,
            indirect_light_intensity: DEFAULT_INDIRECT_LIGHT_INTENSITY,
            indirect_light_rotation: Quat::IDENTITY,
            skybox: None,
            view_mode: ViewMode::Color,
            view_controls: ViewControls::RotateCamera,
            background_color: [1.0, 1.0, 1.0, 1.0],
            builtin_point_size: 5.0,
            camera: CameraController::default(),
        }
    }

    fn read_asset(path: &Path) -> Option<Vec<u8>> {
        match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::debug!("Cannot read {}: {}", path.display(), err);
                None
            }
        }
    }

    fn is_ktx(path: &Path) -> bool {
        Self::read_asset(path).is_some_and(|bytes| bytes.starts_with(&KTX1_MAGIC))
    }

    /// Direction light travels in, from the first enabled sun.
    fn sun_direction(&self) -> Option<Vec3> {
        self.lights
            .iter()
            .find(|(_, light)| light.enabled)
            .map(|(_, light)| light.description.direction.normalize_or_zero())
    }

    /// Colour of point `index`. `depth` is its distance scaled to 0..1 over
    /// the frame.
    fn point_color(&self, entry: &SceneGeometry, index: usize, depth: f32) -> Vec3 {
        let wireframe = &entry.wireframe;
        let normal = wireframe.normals.get(index).copied();
        match self.view_mode {
            ViewMode::Depth => Vec3::splat(depth),
            ViewMode::Normals => normal.map_or(FALLBACK_COLOR, |n| n * 0.5 + Vec3::splat(0.5)),
            ViewMode::Color => {
                let instance = entry.material.and_then(|h| self.instances.get(h));
                if let Some(color) = wireframe.colors.get(index) {
                    return *color;
                }
                let base = instance
                    .and_then(|i| i.float3s.get("baseColor").copied())
                    .unwrap_or(FALLBACK_COLOR);
                let lit = instance.is_some_and(|i| i.floats.contains_key("roughness"));
                match (lit, normal, self.sun_direction()) {
                    (true, Some(normal), Some(sun)) => {
                        let diffuse = normal.dot(-sun).abs();
                        base * (AMBIENT + (1.0 - AMBIENT) * diffuse)
                    }
                    (true, _, None) => base * AMBIENT,
                    _ => base,
                }
            }
        }
    }

    fn point_size(&self, entry: &SceneGeometry) -> f32 {
        match self.view_mode {
            ViewMode::Color => entry
                .material
                .and_then(|h| self.instances.get(h))
                .and_then(|i| i.floats.get("pointSize").copied())
                .unwrap_or(self.builtin_point_size),
            ViewMode::Normals | ViewMode::Depth => self.builtin_point_size,
        }
    }
}

/// Inspection for tests.
#[cfg(test)]
impl HeadlessBackend {
    pub fn material_instance(&self, handle: MaterialInstanceHandle) -> Option<&MaterialInstance> {
        self.instances.get(handle)
    }

    pub fn material_instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&SceneGeometry> {
        self.geometries.get(handle)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn light(&self, handle: LightHandle) -> Option<&DirectionalLight> {
        self.lights.get(handle)
    }

    pub fn indirect_light(&self) -> Option<&IndirectLight> {
        self.indirect_light.and_then(|h| self.indirect_lights.get(h))
    }

    pub fn indirect_light_handle(&self) -> Option<IndirectLightHandle> {
        self.indirect_light
    }

    pub fn indirect_light_rotation(&self) -> Quat {
        self.indirect_light_rotation
    }

    pub fn indirect_light_count(&self) -> usize {
        self.indirect_lights.len()
    }

    pub fn skybox_count(&self) -> usize {
        self.skyboxes.len()
    }

    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.and_then(|h| self.skyboxes.get(h))
    }

    pub fn background_color(&self) -> [f32; 4] {
        self.background_color
    }

    pub fn builtin_point_size(&self) -> f32 {
        self.builtin_point_size
    }

    pub fn view_controls(&self) -> ViewControls {
        self.view_controls
    }
}

impl RenderBackend for HeadlessBackend {
    fn add_material(&mut self, path: &Path) -> Option<MaterialHandle> {
        let bytes = Self::read_asset(path)?;
        if bytes.is_empty() {
            return None;
        }
        Some(self.materials.insert(Material {
            source: path.to_path_buf(),
        }))
    }

    fn add_material_instance(&mut self, material: MaterialHandle) -> Option<MaterialInstanceHandle> {
        if !self.materials.contains(material) {
            return None;
        }
        Some(self.instances.insert(MaterialInstance {
            material,
            floats: Default::default(),
            float3s: Default::default(),
        }))
    }

    fn set_material_float(&mut self, instance: MaterialInstanceHandle, name: &str, value: f32) {
        if let Some(instance) = self.instances.get_mut(instance) {
            instance.floats.insert(name.to_string(), value);
        }
    }

    fn set_material_float3(&mut self, instance: MaterialInstanceHandle, name: &str, value: Vec3) {
        if let Some(instance) = self.instances.get_mut(instance) {
            instance.float3s.insert(name.to_string(), value);
        }
    }

    fn remove_material_instance(&mut self, instance: MaterialInstanceHandle) {
        self.instances.remove(instance);
    }

    fn add_indirect_light(&mut self, path: &Path) -> Option<IndirectLightHandle> {
        if !Self::is_ktx(path) {
            return None;
        }
        Some(self.indirect_lights.insert(IndirectLight {
            source: path.to_path_buf(),
            intensity: DEFAULT_INDIRECT_LIGHT_INTENSITY,
            rotation: Quat::IDENTITY,
        }))
    }

    fn add_skybox(&mut self, path: &Path) -> Option<SkyboxHandle> {
        if !Self::is_ktx(path) {
            return None;
        }
        Some(self.skyboxes.insert(Skybox {
            source: path.to_path_buf(),
        }))
    }

    fn remove_indirect_light(&mut self, light: IndirectLightHandle) {
        self.indirect_lights.remove(light);
        if self.indirect_light == Some(light) {
            self.indirect_light = None;
        }
    }

    fn remove_skybox(&mut self, skybox: SkyboxHandle) {
        self.skyboxes.remove(skybox);
        if self.skybox == Some(skybox) {
            self.skybox = None;
        }
    }

    fn draw_list(&self, aspect: f32) -> Vec<ScreenPrimitive> {
        let view_proj = self.camera.view_proj_matrix(aspect.max(1e-3));
        let projected: Vec<(&SceneGeometry, Vec<Option<(Vec2, f32)>>)> = self
            .geometries
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(_, entry)| {
                let points = entry
                    .wireframe
                    .points
                    .iter()
                    .map(|&point| raster::project(view_proj, point))
                    .collect();
                (entry, points)
            })
            .collect();

        let (near, far) = projected
            .iter()
            .flat_map(|(_, points)| points.iter().flatten())
            .fold((f32::MAX, 0.0f32), |(near, far), &(_, depth)| {
                (near.min(depth), far.max(depth))
            });
        let depth_of = |depth: f32| {
            if far > near {
                (depth - near) / (far - near)
            } else {
                0.0
            }
        };

        let mut primitives = Vec::new();
        for (entry, points) in &projected {
            let wireframe = &entry.wireframe;
            if wireframe.draw_points {
                let size = self.point_size(entry);
                for (index, point) in points.iter().enumerate() {
                    let Some((at, depth)) = *point else {
                        continue;
                    };
                    primitives.push(ScreenPrimitive::Point {
                        at,
                        size,
                        color: self.point_color(entry, index, depth_of(depth)),
                    });
                }
            }
            for &[a, b] in &wireframe.edges {
                let (Some(Some((from, depth))), Some(Some((to, _)))) =
                    (points.get(a as usize), points.get(b as usize))
                else {
                    continue;
                };
                primitives.push(ScreenPrimitive::Segment {
                    from: *from,
                    to: *to,
                    color: self.point_color(entry, a as usize, depth_of(*depth)),
                });
            }
        }
        primitives
    }

    fn render_to_image(&mut self, width: u32, height: u32, on_done: ImageCallback) {
        let [r, g, b, a] = self.background_color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let mut image = RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, a]));
        let primitives = self.draw_list(width as f32 / height.max(1) as f32);
        raster::rasterize(&mut image, &primitives);
        log::debug!(
            "Rendered {}x{} with {} primitives ({:?}, {:?}, ibl {} rotated {:?}, point size {})",
            width,
            height,
            primitives.len(),
            self.view_mode,
            self.view_controls,
            self.indirect_light_intensity,
            self.indirect_light_rotation,
            self.builtin_point_size
        );
        on_done(image);
    }

    fn add_geometry(
        &mut self,
        geometry: &Geometry,
        material: Option<MaterialInstanceHandle>,
    ) -> Option<GeometryHandle> {
        if let Geometry::Other { type_name } = geometry {
            log::warn!("Cannot add geometry of type {}", type_name);
            return None;
        }
        let material = material.filter(|&h| self.instances.contains(h));
        Some(self.geometries.insert(SceneGeometry {
            type_name: geometry.type_name().to_string(),
            bounds: geometry.bounds(),
            material,
            cast_shadows: true,
            receive_shadows: true,
            enabled: true,
            wireframe: Wireframe::from_geometry(geometry),
        }))
    }

    fn remove_geometry(&mut self, geometry: GeometryHandle) {
        self.geometries.remove(geometry);
    }

    fn geometry_bounds(&self, geometry: GeometryHandle) -> Aabb {
        self.geometries
            .get(geometry)
            .map(|g| g.bounds)
            .unwrap_or_default()
    }

    fn assign_material(&mut self, geometry: GeometryHandle, material: MaterialInstanceHandle) {
        if !self.instances.contains(material) {
            return;
        }
        if let Some(entry) = self.geometries.get_mut(geometry) {
            entry.material = Some(material);
        }
    }

    fn set_geometry_shadows(&mut self, geometry: GeometryHandle, cast: bool, receive: bool) {
        if let Some(entry) = self.geometries.get_mut(geometry) {
            entry.cast_shadows = cast;
            entry.receive_shadows = receive;
        }
    }

    fn set_geometry_enabled(&mut self, geometry: GeometryHandle, enabled: bool) {
        if let Some(entry) = self.geometries.get_mut(geometry) {
            entry.enabled = enabled;
        }
    }

    fn add_directional_light(&mut self, description: LightDescription) -> LightHandle {
        self.lights.insert(DirectionalLight {
            description,
            enabled: true,
        })
    }

    fn set_light_enabled(&mut self, light: LightHandle, enabled: bool) {
        if let Some(light) = self.lights.get_mut(light) {
            light.enabled = enabled;
        }
    }

    fn set_light_intensity(&mut self, light: LightHandle, intensity: f32) {
        if let Some(light) = self.lights.get_mut(light) {
            light.description.intensity = intensity;
        }
    }

    fn set_light_direction(&mut self, light: LightHandle, direction: Vec3) {
        if let Some(light) = self.lights.get_mut(light) {
            light.description.direction = direction;
        }
    }

    fn set_light_color(&mut self, light: LightHandle, color: Vec3) {
        if let Some(light) = self.lights.get_mut(light) {
            light.description.color = color;
        }
    }

    fn set_indirect_light(&mut self, light: Option<IndirectLightHandle>) {
        self.indirect_light = light.filter(|&h| self.indirect_lights.contains(h));
        if let Some(current) = self.indirect_light.and_then(|h| self.indirect_lights.get(h)) {
            self.indirect_light_intensity = current.intensity;
            self.indirect_light_rotation = current.rotation;
        }
    }

    fn indirect_light_intensity(&self) -> f32 {
        self.indirect_light_intensity
    }

    fn set_indirect_light_intensity(&mut self, intensity: f32) {
        self.indirect_light_intensity = intensity;
        if let Some(current) = self.indirect_light.and_then(|h| self.indirect_lights.get_mut(h)) {
            current.intensity = intensity;
        }
    }

    fn set_indirect_light_rotation(&mut self, rotation: Quat) {
        self.indirect_light_rotation = rotation;
        if let Some(current) = self.indirect_light.and_then(|h| self.indirect_lights.get_mut(h)) {
            current.rotation = rotation;
        }
    }

    fn set_skybox(&mut self, skybox: Option<SkyboxHandle>) {
        self.skybox = skybox.filter(|&h| self.skyboxes.contains(h));
    }

    fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    fn set_background_color(&mut self, color: [f32; 4]) {
        self.background_color = color;
    }

    fn set_builtin_point_size(&mut self, size: f32) {
        self.builtin_point_size = size;
    }

    fn set_view_controls(&mut self, controls: ViewControls) {
        self.view_controls = controls;
    }

    fn setup_camera(&mut self, vertical_fov_deg: f32, bounds: &Aabb, center: Vec3) {
        self.camera
            .frame_bounds(vertical_fov_deg, center, bounds.extent());
    }

    fn orbit_camera(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32) {
        self.camera.orbit(yaw_delta, pitch_delta, zoom_delta);
    }

    fn nudge_camera(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32) {
        self.camera.nudge(yaw_delta, pitch_delta, zoom_delta);
    }

    fn fly_camera(&mut self, movement: &CameraMovement, frame_dt: f32) -> bool {
        self.camera.update_movement(movement, frame_dt)
    }

    fn camera(&self) -> &CameraController {
        &self.camera
    }
}
