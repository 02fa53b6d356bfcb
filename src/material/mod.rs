//! Material descriptors and the prefab table for lit shading.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use glam::Vec3;

use crate::render::{MaterialInstanceHandle, RenderBackend};

pub const DEFAULT_MATERIAL_NAME: &str = "Polished ceramic [default]";

pub const DEFAULT_POINT_SIZE: f32 = 5.0;
const PREFAB_POINT_SIZE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LitMaterial {
    pub handle: Option<MaterialInstanceHandle>,
    pub base_color: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub reflectance: f32,
    pub clear_coat: f32,
    pub clear_coat_roughness: f32,
    pub anisotropy: f32,
    pub point_size: f32,
}

impl Default for LitMaterial {
    fn default() -> Self {
        Self {
            handle: None,
            base_color: Vec3::splat(0.9),
            metallic: 0.0,
            roughness: 0.7,
            reflectance: 0.5,
            clear_coat: 0.2,
            clear_coat_roughness: 0.2,
            anisotropy: 0.0,
            point_size: DEFAULT_POINT_SIZE,
        }
    }
}

impl LitMaterial {
    /// Copies the shading parameters of `prefab`, keeping this material's
    /// handle and point size.
    pub fn take_prefab(&mut self, prefab: &LitMaterial) {
        *self = LitMaterial {
            handle: self.handle,
            point_size: self.point_size,
            ..*prefab
        };
    }

    /// Writes every parameter to the renderer instance, if one is bound.
    pub fn upload<B: RenderBackend + ?Sized>(&self, backend: &mut B) {
        let Some(handle) = self.handle else {
            return;
        };
        backend.set_material_float3(handle, "baseColor", self.base_color);
        backend.set_material_float(handle, "metallic", self.metallic);
        backend.set_material_float(handle, "roughness", self.roughness);
        backend.set_material_float(handle, "reflectance", self.reflectance);
        backend.set_material_float(handle, "clearCoat", self.clear_coat);
        backend.set_material_float(handle, "clearCoatRoughness", self.clear_coat_roughness);
        backend.set_material_float(handle, "anisotropy", self.anisotropy);
        backend.set_material_float(handle, "pointSize", self.point_size);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlitMaterial {
    pub handle: Option<MaterialInstanceHandle>,
    pub base_color: Vec3,
    pub point_size: f32,
}

impl Default for UnlitMaterial {
    fn default() -> Self {
        Self {
            handle: None,
            base_color: Vec3::ONE,
            point_size: DEFAULT_POINT_SIZE,
        }
    }
}

impl UnlitMaterial {
    pub fn upload<B: RenderBackend + ?Sized>(&self, backend: &mut B) {
        let Some(handle) = self.handle else {
            return;
        };
        backend.set_material_float3(handle, "baseColor", self.base_color);
        backend.set_material_float(handle, "pointSize", self.point_size);
    }
}

/// The lit and unlit instance pair owned by one displayed geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Materials {
    pub lit: LitMaterial,
    pub unlit: UnlitMaterial,
}

impl Materials {
    pub fn instance_for(&self, shading: MaterialType) -> Option<MaterialInstanceHandle> {
        match shading {
            MaterialType::Lit => self.lit.handle,
            MaterialType::Unlit => self.unlit.handle,
            MaterialType::NormalMap | MaterialType::Depth => None,
        }
    }

    pub fn set_point_size<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, size: f32) {
        self.lit.point_size = size;
        self.unlit.point_size = size;
        for handle in [self.lit.handle, self.unlit.handle].into_iter().flatten() {
            backend.set_material_float(handle, "pointSize", size);
        }
    }

    /// Returns both instances to the renderer and clears the handles.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(handle) = self.lit.handle.take() {
            backend.remove_material_instance(handle);
        }
        if let Some(handle) = self.unlit.handle.take() {
            backend.remove_material_instance(handle);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialType {
    Lit,
    Unlit,
    NormalMap,
    Depth,
}

impl MaterialType {
    pub const ALL: [MaterialType; 4] = [Self::Lit, Self::Unlit, Self::NormalMap, Self::Depth];

    pub fn label(self) -> &'static str {
        match self {
            Self::Lit => "Lit",
            Self::Unlit => "Unlit",
            Self::NormalMap => "Normal map",
            Self::Depth => "Depth",
        }
    }
}

fn metal(base_color: Vec3, roughness: f32) -> LitMaterial {
    LitMaterial {
        handle: None,
        base_color,
        metallic: 1.0,
        roughness,
        reflectance: 0.9,
        clear_coat: 0.0,
        clear_coat_roughness: 0.0,
        anisotropy: 0.0,
        point_size: PREFAB_POINT_SIZE,
    }
}

fn dielectric(
    base_color: Vec3,
    roughness: f32,
    reflectance: f32,
    clear_coat: f32,
    clear_coat_roughness: f32,
) -> LitMaterial {
    LitMaterial {
        handle: None,
        base_color,
        metallic: 0.0,
        roughness,
        reflectance,
        clear_coat,
        clear_coat_roughness,
        anisotropy: 0.0,
        point_size: PREFAB_POINT_SIZE,
    }
}

/// Named lit presets, ordered by name. Handles are always `None`.
pub fn prefab_materials() -> &'static BTreeMap<&'static str, LitMaterial> {
    static PREFABS: OnceLock<BTreeMap<&'static str, LitMaterial>> = OnceLock::new();
    PREFABS.get_or_init(|| {
        BTreeMap::from([
            (
                DEFAULT_MATERIAL_NAME,
                LitMaterial {
                    point_size: PREFAB_POINT_SIZE,
                    ..LitMaterial::default()
                },
            ),
            ("Aluminum", metal(Vec3::new(0.913, 0.921, 0.925), 0.5)),
            ("Gold", metal(Vec3::new(1.0, 0.766, 0.336), 0.3)),
            ("Copper", metal(Vec3::new(0.955, 0.637, 0.538), 0.3)),
            ("Iron", metal(Vec3::new(0.560, 0.570, 0.580), 0.5)),
            ("Plastic (white)", dielectric(Vec3::ONE, 0.5, 0.5, 0.5, 0.2)),
            (
                "Glazed ceramic (white)",
                dielectric(Vec3::ONE, 0.5, 0.9, 1.0, 0.1),
            ),
            ("Clay", dielectric(Vec3::splat(0.7725), 1.0, 0.5, 0.1, 0.287)),
        ])
    })
}
