//! Factories for the document nodes behind a cached asset.
//!
//! Each call creates fresh nodes with UUID-suffixed names so that two loads
//! of different files can never collide. Deduplication is the cache's job,
//! not this module's.

use crate::asset_cache::DerivedAsset;
use scene::{attrs, AttrValue, DocumentError, ElementKind, SceneDocument};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a texture image is projected onto geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureMapping {
    #[serde(rename = "2d")]
    Planar,
    #[default]
    Cube,
    Skybox,
}

impl TextureMapping {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planar => "2d",
            Self::Cube => "cube",
            Self::Skybox => "skybox",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureOptions {
    pub mapping: TextureMapping,
    pub repeat: [f32; 2],
    /// Scale the texture with the geom instead of per face.
    pub uniform: bool,
    pub emission: f32,
    pub specular: f32,
    pub shininess: f32,
    pub reflectance: f32,
    pub color: [f32; 4],
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            mapping: TextureMapping::Cube,
            repeat: [1.0, 1.0],
            uniform: false,
            emission: 0.0,
            specular: 0.5,
            shininess: 0.5,
            reflectance: 0.0,
            color: [1.0; 4],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    pub scale: [f32; 3],
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self { scale: [1.0; 3] }
    }
}

/// Add a texture for `path` and a material referencing it.
///
/// The material is the asset's root; the texture is its only dependent.
///
/// # Errors
///
/// Document errors from adding either node. A texture added before a
/// failing material is removed again.
pub fn create_material(
    doc: &mut SceneDocument,
    path: &str,
    options: &TextureOptions,
) -> Result<DerivedAsset, DocumentError> {
    let texture = doc.add_asset(
        ElementKind::Texture,
        Some(&format!("texture_{}", Uuid::new_v4())),
        attrs([
            ("file", path.into()),
            ("type", options.mapping.as_str().into()),
        ]),
    )?;
    let material = doc.add_asset(
        ElementKind::Material,
        Some(&format!("material_{}", Uuid::new_v4())),
        attrs([
            ("texture", AttrValue::Ref(texture)),
            ("texrepeat", options.repeat.into()),
            ("texuniform", options.uniform.into()),
            ("emission", options.emission.into()),
            ("specular", options.specular.into()),
            ("shininess", options.shininess.into()),
            ("reflectance", options.reflectance.into()),
            ("rgba", options.color.into()),
        ]),
    );
    match material {
        Ok(material) => Ok(DerivedAsset::with_dependents(material, vec![texture])),
        Err(err) => {
            doc.remove(texture)?;
            Err(err)
        }
    }
}

/// Add a mesh asset for `path`.
///
/// # Errors
///
/// Document errors from adding the node.
pub fn create_mesh(
    doc: &mut SceneDocument,
    path: &str,
    options: &MeshOptions,
) -> Result<DerivedAsset, DocumentError> {
    let mesh = doc.add_asset(
        ElementKind::Mesh,
        Some(&format!("mesh_{}", Uuid::new_v4())),
        attrs([
            ("file", path.into()),
            ("scale", options.scale.into()),
        ]),
    )?;
    Ok(DerivedAsset::new(mesh))
}

