#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Scene Document
//!
//! The editable description of a simulated world. A [`SceneDocument`] is a
//! tree of typed, optionally named nodes (bodies, geoms, joints, sites,
//! lights, cameras) hanging off a fixed world root, plus an asset section
//! holding textures, materials and meshes.
//!
//! The document knows nothing about compilation. It only guarantees that
//! every successful mutation advances [`SceneDocument::revision`], that node
//! handles never alias after removal, and that removing a node scrubs every
//! reference that pointed at it.
//!
//! ```rust,ignore
//! use scene::{attrs, ElementKind, SceneDocument};
//!
//! let mut doc = SceneDocument::new();
//! let body = doc.add(doc.world(), ElementKind::Body, Some("cart"), attrs([]))?;
//! doc.add(body, ElementKind::Geom, None, attrs([("type", "box".into())]))?;
//! ```

pub mod document;
pub mod error;
pub mod format;
pub mod types;

pub use document::SceneDocument;
pub use error::DocumentError;
pub use format::{NodeSpec, SceneDescription};
pub use types::{attrs, AttrValue, Attrs, ElementKind, Headlight, NodeId, Options};
