use super::{pose_attrs, Colored, Element, Geom, Joint, Textured, Transform, IDENTITY};
use crate::assets::TextureOptions;
use crate::error::SessionError;
use crate::session::Session;
use physics::JointType;
use scene::{AttrValue, ElementKind, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct BodyOptions {
    pub name: Option<String>,
    pub pos: [f32; 3],
    pub quat: [f32; 4],
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            name: None,
            pos: [0.0; 3],
            quat: IDENTITY,
        }
    }
}

/// A rigid body, or the world body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Body(NodeId);

impl Element for Body {
    const KIND: ElementKind = ElementKind::Body;

    fn node(self) -> NodeId {
        self.0
    }

    fn wrap(node: NodeId) -> Self {
        Self(node)
    }

    fn accepts(kind: ElementKind) -> bool {
        matches!(kind, ElementKind::Body | ElementKind::World)
    }
}

impl Transform for Body {}

impl Body {
    #[must_use]
    pub fn world(session: &Session) -> Self {
        Self(session.document().world())
    }

    /// Add a body under `parent`, or under the world body.
    ///
    /// # Errors
    ///
    /// Document errors such as a duplicate name.
    pub fn create(session: &mut Session, parent: Option<Self>, options: &BodyOptions) -> Result<Self, SessionError> {
        let parent = parent.map_or_else(|| session.document().world(), Element::node);
        let node = session.edit(|doc| {
            doc.add(
                parent,
                ElementKind::Body,
                options.name.as_deref(),
                pose_attrs(options.pos, options.quat),
            )
        })?;
        Ok(Self(node))
    }

    #[must_use]
    pub fn is_world(self, session: &Session) -> bool {
        session.document().kind(self.0) == Some(ElementKind::World)
    }

    /// The enclosing body; `None` for the world body.
    #[must_use]
    pub fn parent(self, session: &Session) -> Option<Self> {
        session.document().parent(self.0).map(Self)
    }

    /// Geoms attached directly to this body.
    #[must_use]
    pub fn geoms(self, session: &Session) -> Vec<Geom> {
        children(session, self.0, ElementKind::Geom)
            .map(Geom::wrap)
            .collect()
    }

    /// Joints attached directly to this body.
    #[must_use]
    pub fn joints(self, session: &Session) -> Vec<Joint> {
        children(session, self.0, ElementKind::Joint)
            .map(Joint::wrap)
            .collect()
    }

    /// Whether one of the body's joints is a free joint.
    #[must_use]
    pub fn is_free(self, session: &Session) -> bool {
        let doc = session.document();
        children(session, self.0, ElementKind::Joint).any(|joint| {
            doc.get(joint, "type").and_then(AttrValue::as_text) == Some(JointType::Free.as_str())
        })
    }

    /// Colour every geom of the body.
    ///
    /// # Errors
    ///
    /// See [`Colored::set_color`].
    pub fn set_color(self, session: &mut Session, color: &[f32]) -> Result<(), SessionError> {
        for geom in self.geoms(session) {
            geom.set_color(session, color)?;
        }
        Ok(())
    }

    /// Texture every geom of the body with one shared material.
    ///
    /// # Errors
    ///
    /// See [`Textured::set_texture`].
    pub fn set_texture(self, session: &mut Session, path: &str, options: &TextureOptions) -> Result<(), SessionError> {
        for geom in self.geoms(session) {
            geom.set_texture(session, path, options)?;
        }
        Ok(())
    }
}

fn children(session: &Session, node: NodeId, kind: ElementKind) -> impl Iterator<Item = NodeId> + '_ {
    let doc = session.document();
    doc.children(node)
        .iter()
        .copied()
        .filter(move |&child| doc.kind(child) == Some(kind))
}
