//! Primitive types shared by the document, its JSON format and its consumers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Handle to a node of a [`crate::SceneDocument`].
///
/// The generation is bumped whenever a slot is freed, so a handle to a
/// removed node never resolves to whatever reuses its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}v{}", self.index, self.generation)
    }
}

/// The kind of a document node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    World,
    Assets,
    Body,
    Geom,
    Joint,
    Site,
    Light,
    Camera,
    Texture,
    Material,
    Mesh,
}

impl ElementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Assets => "assets",
            Self::Body => "body",
            Self::Geom => "geom",
            Self::Joint => "joint",
            Self::Site => "site",
            Self::Light => "light",
            Self::Camera => "camera",
            Self::Texture => "texture",
            Self::Material => "material",
            Self::Mesh => "mesh",
        }
    }

    /// Kinds that live in the asset section.
    #[must_use]
    pub const fn is_asset(self) -> bool {
        matches!(self, Self::Texture | Self::Material | Self::Mesh)
    }

    /// The two fixed roots every document owns.
    #[must_use]
    pub const fn is_root(self) -> bool {
        matches!(self, Self::World | Self::Assets)
    }

    /// Whether a node of this kind may directly own a `child` node.
    #[must_use]
    pub const fn accepts_child(self, child: ElementKind) -> bool {
        match self {
            Self::World | Self::Body => matches!(
                child,
                Self::Body | Self::Geom | Self::Joint | Self::Site | Self::Light | Self::Camera
            ),
            Self::Assets => child.is_asset(),
            _ => false,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attribute value stored on a node.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Vector(Vec<f32>),
    Text(String),
    /// Cross reference to another node, usually an asset.
    Ref(NodeId),
}

impl AttrValue {
    /// Booleans, integers (non-zero is true) and the strings `"true"`/`"false"`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Int(value) => Some(*value != 0),
            Self::Text(text) => match text.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f32),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Self::Vector(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Ref(node) => Some(*node),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<f32>> for AttrValue {
    fn from(values: Vec<f32>) -> Self {
        Self::Vector(values)
    }
}

impl<const N: usize> From<[f32; N]> for AttrValue {
    fn from(values: [f32; N]) -> Self {
        Self::Vector(values.to_vec())
    }
}

impl From<&str> for AttrValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NodeId> for AttrValue {
    fn from(node: NodeId) -> Self {
        Self::Ref(node)
    }
}

/// Attribute map of a node, ordered by key.
pub type Attrs = BTreeMap<String, AttrValue>;

/// Builds an [`Attrs`] map from literal pairs.
pub fn attrs<const N: usize>(pairs: [(&str, AttrValue); N]) -> Attrs {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// World-level settings that feed the compiled runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub timestep: f32,
    pub gravity: [f32; 3],
    pub headlight: Headlight,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timestep: 0.01,
            gravity: [0.0, 0.0, -9.81],
            headlight: Headlight::default(),
        }
    }
}

/// The viewer's camera-attached light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Headlight {
    pub active: bool,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

impl Default for Headlight {
    fn default() -> Self {
        Self {
            active: true,
            ambient: [0.1; 3],
            diffuse: [0.4; 3],
            specular: [0.5; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_only_nest_under_the_asset_section() {
        assert!(ElementKind::Assets.accepts_child(ElementKind::Texture));
        assert!(!ElementKind::Assets.accepts_child(ElementKind::Body));
        assert!(!ElementKind::World.accepts_child(ElementKind::Mesh));
        assert!(ElementKind::Body.accepts_child(ElementKind::Joint));
        assert!(!ElementKind::Geom.accepts_child(ElementKind::Geom));
    }

    #[test]
    fn loose_bool_parsing() {
        assert_eq!(AttrValue::from("true").as_bool(), Some(true));
        assert_eq!(AttrValue::Int(0).as_bool(), Some(false));
        assert_eq!(AttrValue::Float(1.0).as_bool(), None);
        assert_eq!(AttrValue::Int(3).as_float(), Some(3.0));
    }
}
