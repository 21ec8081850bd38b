//! # JSON Scene Format
//!
//! Documents are stored as a nested JSON description:
//!
//! ```json
//! {
//!   "options": { "timestep": 0.01 },
//!   "assets": [{ "kind": "mesh", "name": "mug", "attrs": { "file": "mug.obj" } }],
//!   "world": [{
//!     "kind": "body", "name": "cup",
//!     "children": [{ "kind": "geom", "attrs": { "type": "mesh", "mesh": { "ref": "mug" } } }]
//!   }]
//! }
//! ```
//!
//! Attribute values map onto [`AttrValue`] by JSON type. References are
//! written as `{ "ref": "<asset name>" }` and resolved against the asset
//! section once every asset exists.

use crate::document::SceneDocument;
use crate::error::DocumentError;
use crate::types::{AttrValue, Attrs, ElementKind, NodeId, Options};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::path::Path;

/// Serialized form of a whole document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub options: Options,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<NodeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub world: Vec<NodeSpec>,
}

/// Serialized form of one node and its subtree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

const ASSET_KINDS: [ElementKind; 3] = [ElementKind::Texture, ElementKind::Material, ElementKind::Mesh];

impl SceneDocument {
    /// Parse a document from its JSON description.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Parse`] for malformed JSON and the usual
    /// structural errors for invalid trees or unresolved references.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let description: SceneDescription = serde_json::from_str(json)?;
        Self::from_description(&description)
    }

    /// Read and parse a JSON scene file.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] when the file cannot be read, otherwise
    /// the errors of [`SceneDocument::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading scene document");
        Self::from_json(&json)
    }

    /// Build a document from an already parsed description.
    ///
    /// # Errors
    ///
    /// Structural errors of [`SceneDocument::add`] and
    /// [`DocumentError::UnresolvedReference`].
    pub fn from_description(description: &SceneDescription) -> Result<Self, DocumentError> {
        let mut doc = Self::new();
        doc.update_options(|options| *options = description.options.clone());

        let mut pending = Vec::new();
        let assets = doc.assets();
        for spec in &description.assets {
            doc.add_spec(assets, spec, &mut pending)?;
        }
        let world = doc.world();
        for spec in &description.world {
            doc.add_spec(world, spec, &mut pending)?;
        }

        for (node, key, target) in pending {
            let resolved = ASSET_KINDS
                .iter()
                .find_map(|&kind| doc.find(kind, &target))
                .ok_or(DocumentError::UnresolvedReference(target))?;
            doc.set(node, &key, resolved)?;
        }
        Ok(doc)
    }

    /// Convert the document back into its serialized description.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnnamedReference`] when a reference targets
    /// a node without a name.
    pub fn to_description(&self) -> Result<SceneDescription, DocumentError> {
        let specs = |root: NodeId| -> Result<Vec<NodeSpec>, DocumentError> {
            self.children(root)
                .iter()
                .map(|&child| self.node_spec(child))
                .collect()
        };
        Ok(SceneDescription {
            options: self.options().clone(),
            assets: specs(self.assets())?,
            world: specs(self.world())?,
        })
    }

    /// Pretty-printed JSON description.
    ///
    /// # Errors
    ///
    /// See [`SceneDocument::to_description`].
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.to_description()?)?)
    }

    fn add_spec(
        &mut self,
        parent: NodeId,
        spec: &NodeSpec,
        pending: &mut Vec<(NodeId, String, String)>,
    ) -> Result<(), DocumentError> {
        let mut attrs = Attrs::new();
        let mut references = Vec::new();
        for (key, value) in &spec.attrs {
            match reference_name(value) {
                Some(target) => references.push((key.clone(), target.to_owned())),
                None => {
                    attrs.insert(key.clone(), attr_from_json(key, value)?);
                }
            }
        }
        let node = self.add(parent, spec.kind, spec.name.as_deref(), attrs)?;
        pending.extend(references.into_iter().map(|(key, target)| (node, key, target)));
        for child in &spec.children {
            self.add_spec(node, child, pending)?;
        }
        Ok(())
    }

    fn node_spec(&self, id: NodeId) -> Result<NodeSpec, DocumentError> {
        let mut attrs = Map::new();
        for (key, value) in self.attrs(id).into_iter().flatten() {
            attrs.insert(key.clone(), self.attr_to_json(value)?);
        }
        let children = self
            .children(id)
            .iter()
            .map(|&child| self.node_spec(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NodeSpec {
            kind: self.kind(id).ok_or(DocumentError::UnknownNode(id))?,
            name: self.name(id).map(str::to_owned),
            attrs,
            children,
        })
    }

    fn attr_to_json(&self, value: &AttrValue) -> Result<Value, DocumentError> {
        Ok(match value {
            AttrValue::Bool(flag) => Value::Bool(*flag),
            AttrValue::Int(number) => Value::from(*number),
            AttrValue::Float(number) => float_to_json(*number),
            AttrValue::Vector(values) => Value::Array(values.iter().map(|&v| float_to_json(v)).collect()),
            AttrValue::Text(text) => Value::String(text.clone()),
            AttrValue::Ref(target) => {
                let name = self.name(*target).ok_or(DocumentError::UnnamedReference(*target))?;
                let mut object = Map::new();
                object.insert("ref".to_owned(), Value::String(name.to_owned()));
                Value::Object(object)
            }
        })
    }
}

fn reference_name(value: &Value) -> Option<&str> {
    match value {
        Value::Object(object) if object.len() == 1 => object.get("ref").and_then(Value::as_str),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn attr_from_json(key: &str, value: &Value) -> Result<AttrValue, DocumentError> {
    let invalid = |reason| DocumentError::InvalidAttribute {
        name: key.to_owned(),
        reason,
    };
    match value {
        Value::Bool(flag) => Ok(AttrValue::Bool(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Ok(AttrValue::Int(integer)),
            None => number
                .as_f64()
                .map(|float| AttrValue::Float(float as f32))
                .ok_or_else(|| invalid("number out of range")),
        },
        Value::String(text) => Ok(AttrValue::Text(text.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_f64().map(|float| float as f32))
            .collect::<Option<Vec<f32>>>()
            .map(AttrValue::Vector)
            .ok_or_else(|| invalid("arrays may only hold numbers")),
        Value::Null => Err(invalid("null is not a value")),
        Value::Object(_) => Err(invalid("objects other than {\"ref\": name} are not supported")),
    }
}

fn float_to_json(value: f32) -> Value {
    Number::from_f64(f64::from(value)).map_or(Value::Null, Value::Number)
}
