use super::{pose_attrs, Body, BodyOptions, Colored, Element, Transform, IDENTITY, WHITE};
use crate::error::SessionError;
use crate::session::Session;
use scene::{ElementKind, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct SiteOptions {
    pub name: Option<String>,
    pub size: Vec<f32>,
    pub pos: [f32; 3],
    pub quat: [f32; 4],
    pub color: [f32; 4],
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            name: None,
            size: vec![0.1; 3],
            pos: [0.0; 3],
            quat: IDENTITY,
            color: WHITE,
        }
    }
}

/// A marker frame attached to a body. Sites never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Site(NodeId);

impl Element for Site {
    const KIND: ElementKind = ElementKind::Site;

    fn node(self) -> NodeId {
        self.0
    }

    fn wrap(node: NodeId) -> Self {
        Self(node)
    }
}

impl Transform for Site {}

impl Colored for Site {}

impl Site {
    /// Add a site to `parent`, or to a new body under the world body.
    ///
    /// # Errors
    ///
    /// Document errors such as a duplicate name.
    pub fn create(session: &mut Session, parent: Option<Body>, options: &SiteOptions) -> Result<Self, SessionError> {
        let parent = match parent {
            Some(parent) => parent,
            None => Body::create(session, None, &BodyOptions::default())?,
        };
        let mut attrs = pose_attrs(options.pos, options.quat);
        attrs.insert("size".to_owned(), options.size.clone().into());
        attrs.insert("rgba".to_owned(), options.color.into());
        let node = session.edit(|doc| doc.add(parent.node(), ElementKind::Site, options.name.as_deref(), attrs))?;
        Ok(Self(node))
    }

    /// # Errors
    ///
    /// Document errors when the site no longer exists.
    pub fn body(self, session: &Session) -> Result<Body, SessionError> {
        session
            .document()
            .parent(self.0)
            .map(Body::wrap)
            .ok_or_else(|| scene::DocumentError::UnknownNode(self.0).into())
    }
}
