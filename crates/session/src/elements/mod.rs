//! # Element Accessors
//!
//! Lightweight typed handles onto document nodes. A handle is just a
//! [`NodeId`]; every operation takes the [`Session`] explicitly. Setters
//! write the document through [`Session::edit`], so they always mark the
//! compiled state dirty. Getters that report simulated state read through
//! [`Session::runtime`] and therefore rebuild first when needed.
//!
//! Shared behaviour lives in capability traits: [`Transform`] for anything
//! with a pose, [`Colored`] for anything with an `rgba`, and [`Textured`] for
//! colourable elements that can take a material.

mod body;
mod camera;
mod geom;
mod joint;
mod light;
mod site;

pub use body::{Body, BodyOptions};
pub use camera::{Camera, CameraOptions};
pub use geom::{Geom, GeomOptions};
pub use joint::{Joint, JointOptions};
pub use light::{Light, LightOptions, LightType};
pub use site::{Site, SiteOptions};

use crate::assets::TextureOptions;
use crate::error::SessionError;
use crate::session::Session;
use scene::{attrs, AttrValue, Attrs, DocumentError, ElementKind, NodeId};

const DEFAULT_RGBA: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
const WHITE: [f32; 4] = [1.0; 4];
const IDENTITY: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// A typed handle onto one document node.
pub trait Element: Sized + Copy {
    const KIND: ElementKind;

    fn node(self) -> NodeId;

    /// Wrap `node` without checking its kind.
    #[doc(hidden)]
    fn wrap(node: NodeId) -> Self;

    /// Node kinds this handle may point at.
    #[must_use]
    fn accepts(kind: ElementKind) -> bool {
        kind == Self::KIND
    }

    /// # Errors
    ///
    /// [`SessionError::WrongKind`] if `node` is not of this kind, or a
    /// document error if it does not exist.
    fn from_node(session: &Session, node: NodeId) -> Result<Self, SessionError> {
        match session.document().kind(node) {
            Some(kind) if Self::accepts(kind) => Ok(Self::wrap(node)),
            Some(found) => Err(SessionError::WrongKind {
                node,
                expected: Self::KIND,
                found,
            }),
            None => Err(DocumentError::UnknownNode(node).into()),
        }
    }

    /// Look up an element by name anywhere in the document.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownElement`] when no such element exists.
    fn get(session: &Session, name: &str) -> Result<Self, SessionError> {
        session
            .document()
            .find(Self::KIND, name)
            .map(Self::wrap)
            .ok_or_else(|| SessionError::UnknownElement {
                kind: Self::KIND,
                name: name.to_owned(),
            })
    }

    /// Look up an element by name below `scope`.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownElement`] when `scope` has no such descendant.
    fn get_in(session: &Session, scope: NodeId, name: &str) -> Result<Self, SessionError> {
        session
            .document()
            .find_in(scope, Self::KIND, name)
            .map(Self::wrap)
            .ok_or_else(|| SessionError::UnknownElement {
                kind: Self::KIND,
                name: name.to_owned(),
            })
    }

    #[must_use]
    fn name<'s>(self, session: &'s Session) -> Option<&'s str> {
        session.document().name(self.node())
    }

    #[must_use]
    fn exists(self, session: &Session) -> bool {
        session.document().kind(self.node()).is_some_and(Self::accepts)
    }

    /// Remove the element and its subtree. Returns the number of removed
    /// nodes.
    ///
    /// # Errors
    ///
    /// Document errors, such as removing the world body.
    fn remove(self, session: &mut Session) -> Result<usize, SessionError> {
        let node = self.node();
        Ok(session.edit(|doc| doc.remove(node))?)
    }
}

/// Elements with a position and orientation relative to their parent.
pub trait Transform: Element {
    /// # Errors
    ///
    /// Document errors when the element no longer exists.
    fn set_position(self, session: &mut Session, pos: [f32; 3]) -> Result<(), SessionError> {
        let node = self.node();
        Ok(session.edit(|doc| doc.set(node, "pos", pos))?)
    }

    /// World position in the current runtime.
    ///
    /// # Errors
    ///
    /// Build errors, or [`SessionError::Unbound`] if the element was not
    /// compiled.
    fn position(self, session: &mut Session) -> Result<[f32; 3], SessionError> {
        let node = self.node();
        session
            .runtime()?
            .position(node)
            .map(|pos| pos.to_array())
            .ok_or(SessionError::Unbound(node))
    }

    /// Set the local orientation as `[w, x, y, z]`; it is stored normalised.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for a zero or non-finite
    /// quaternion, and document errors.
    fn set_quaternion(self, session: &mut Session, quat: [f32; 4]) -> Result<(), SessionError> {
        let norm = quat.iter().map(|c| c * c).sum::<f32>().sqrt();
        if !(norm.is_finite() && norm > f32::EPSILON) {
            return Err(SessionError::InvalidArgument("quaternion must be non-zero and finite"));
        }
        let node = self.node();
        let quat = quat.map(|c| c / norm);
        Ok(session.edit(|doc| doc.set(node, "quat", quat))?)
    }

    /// World orientation as `[w, x, y, z]` in the current runtime.
    ///
    /// # Errors
    ///
    /// See [`Transform::position`].
    fn quaternion(self, session: &mut Session) -> Result<[f32; 4], SessionError> {
        let node = self.node();
        session
            .runtime()?
            .quaternion(node)
            .ok_or(SessionError::Unbound(node))
    }
}

/// Elements with an `rgba` colour.
pub trait Colored: Element {
    /// Accepts RGB or RGBA; a missing alpha is opaque.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for other lengths, and document
    /// errors.
    fn set_color(self, session: &mut Session, color: &[f32]) -> Result<(), SessionError> {
        let rgba = rgba(color)?;
        let node = self.node();
        Ok(session.edit(|doc| doc.set(node, "rgba", rgba))?)
    }

    /// The colour stored on the element.
    ///
    /// # Errors
    ///
    /// Document errors when the element no longer exists.
    fn color(self, session: &mut Session) -> Result<[f32; 4], SessionError> {
        stored_color(session, self.node())
    }
}

/// Colourable elements that can be given a textured material.
pub trait Textured: Colored {
    /// Assign a material for the texture at `path`, reusing a cached one
    /// when the same file and mapping were loaded before. An element without
    /// a colour becomes opaque white so the texture shows unaltered.
    /// Returns the material node.
    ///
    /// # Errors
    ///
    /// Document errors from creating the material or assigning it.
    fn set_texture(
        self,
        session: &mut Session,
        path: &str,
        options: &TextureOptions,
    ) -> Result<NodeId, SessionError> {
        let material = session.load_texture(path, options)?;
        let node = self.node();
        session.edit(|doc| -> Result<(), DocumentError> {
            doc.set(node, "material", material)?;
            if doc.get(node, "rgba").is_none() {
                doc.set(node, "rgba", WHITE)?;
            }
            Ok(())
        })?;
        Ok(material)
    }

    /// The assigned material, if any.
    #[must_use]
    fn material(self, session: &Session) -> Option<NodeId> {
        session
            .document()
            .get(self.node(), "material")
            .and_then(AttrValue::as_node)
    }
}

fn rgba(color: &[f32]) -> Result<[f32; 4], SessionError> {
    match *color {
        [r, g, b] => Ok([r, g, b, 1.0]),
        [r, g, b, a] => Ok([r, g, b, a]),
        _ => Err(SessionError::InvalidArgument("colours need three or four components")),
    }
}

fn stored_color(session: &Session, node: NodeId) -> Result<[f32; 4], SessionError> {
    let doc = session.document();
    if !doc.contains(node) {
        return Err(DocumentError::UnknownNode(node).into());
    }
    Ok(doc
        .get(node, "rgba")
        .and_then(AttrValue::as_vector)
        .and_then(|values| rgba(values).ok())
        .unwrap_or(DEFAULT_RGBA))
}

/// `pos` and `quat` attributes for a newly created element.
fn pose_attrs(pos: [f32; 3], quat: [f32; 4]) -> Attrs {
    attrs([("pos", pos.into()), ("quat", quat.into())])
}
