use super::{pose_attrs, rgba, Body, BodyOptions, Colored, Element, Textured, Transform, IDENTITY, WHITE};
use crate::assets::MeshOptions;
use crate::error::SessionError;
use crate::session::Session;
use physics::GeomType;
use scene::{AttrValue, DocumentError, ElementKind, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct GeomOptions {
    pub name: Option<String>,
    pub geom_type: GeomType,
    /// One to three components, depending on the shape.
    pub size: Vec<f32>,
    pub pos: [f32; 3],
    pub quat: [f32; 4],
    pub color: [f32; 4],
    pub collidable: bool,
}

impl Default for GeomOptions {
    fn default() -> Self {
        Self {
            name: None,
            geom_type: GeomType::Box,
            size: vec![0.1; 3],
            pos: [0.0; 3],
            quat: IDENTITY,
            color: WHITE,
            collidable: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Geom(NodeId);

impl Element for Geom {
    const KIND: ElementKind = ElementKind::Geom;

    fn node(self) -> NodeId {
        self.0
    }

    fn wrap(node: NodeId) -> Self {
        Self(node)
    }
}

impl Transform for Geom {}

impl Colored for Geom {
    /// The compiled colour, which falls back to the material's colour when
    /// the geom has none of its own.
    fn color(self, session: &mut Session) -> Result<[f32; 4], SessionError> {
        session.runtime()?.rgba(self.0).ok_or(SessionError::Unbound(self.0))
    }
}

impl Textured for Geom {}

impl Geom {
    /// Add a geom to `parent`. Without a parent a new body is created under
    /// the world body to hold it.
    ///
    /// # Errors
    ///
    /// Document errors such as a duplicate name. A body created for the
    /// geom is removed again when adding the geom fails.
    pub fn create(session: &mut Session, parent: Option<Body>, options: &GeomOptions) -> Result<Self, SessionError> {
        let (parent, created) = match parent {
            Some(parent) => (parent, false),
            None => (Body::create(session, None, &BodyOptions::default())?, true),
        };
        let parent = parent.node();
        let mut attrs = pose_attrs(options.pos, options.quat);
        attrs.insert("type".to_owned(), options.geom_type.as_str().into());
        attrs.insert("size".to_owned(), options.size.clone().into());
        attrs.insert("rgba".to_owned(), options.color.into());
        let affinity = i64::from(options.collidable);
        attrs.insert("contype".to_owned(), affinity.into());
        attrs.insert("conaffinity".to_owned(), affinity.into());

        let added = session.edit(|doc| doc.add(parent, ElementKind::Geom, options.name.as_deref(), attrs));
        match added {
            Ok(node) => Ok(Self(node)),
            Err(err) => {
                if created {
                    session.edit(|doc| doc.remove(parent))?;
                }
                Err(err.into())
            }
        }
    }

    /// The body the geom is attached to.
    ///
    /// # Errors
    ///
    /// Document errors when the geom no longer exists.
    pub fn body(self, session: &Session) -> Result<Body, SessionError> {
        session
            .document()
            .parent(self.0)
            .map(Body::wrap)
            .ok_or_else(|| DocumentError::UnknownNode(self.0).into())
    }

    /// The shape stored in the document; sphere when unset.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for an unknown stored type.
    pub fn geom_type(self, session: &Session) -> Result<GeomType, SessionError> {
        match session.document().get(self.0, "type") {
            None => Ok(GeomType::Sphere),
            Some(value) => value
                .as_text()
                .and_then(GeomType::parse)
                .ok_or(SessionError::InvalidArgument("unknown geom type")),
        }
    }

    /// # Errors
    ///
    /// Document errors when the geom no longer exists.
    pub fn set_geom_type(self, session: &mut Session, geom_type: GeomType) -> Result<(), SessionError> {
        Ok(session.edit(|doc| doc.set(self.0, "type", geom_type.as_str()))?)
    }

    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] unless `size` has one to three
    /// components, and document errors.
    pub fn set_size(self, session: &mut Session, size: &[f32]) -> Result<(), SessionError> {
        if !(1..=3).contains(&size.len()) {
            return Err(SessionError::InvalidArgument("sizes need one to three components"));
        }
        Ok(session.edit(|doc| doc.set(self.0, "size", size.to_vec()))?)
    }

    /// Turn the geom into a mesh geom showing the mesh at `path`, reusing a
    /// cached mesh asset when one exists. Returns the mesh node.
    ///
    /// # Errors
    ///
    /// Document errors from creating the mesh or assigning it.
    pub fn set_mesh(self, session: &mut Session, path: &str, options: &MeshOptions) -> Result<NodeId, SessionError> {
        let mesh = session.load_mesh(path, options)?;
        session.edit(|doc| -> Result<(), DocumentError> {
            doc.set(self.0, "type", GeomType::Mesh.as_str())?;
            doc.set(self.0, "mesh", mesh)
        })?;
        Ok(mesh)
    }

    /// The mesh asset the geom shows, if any.
    #[must_use]
    pub fn mesh(self, session: &Session) -> Option<NodeId> {
        session.document().get(self.0, "mesh").and_then(AttrValue::as_node)
    }

    /// Enable or disable contacts for this geom.
    ///
    /// # Errors
    ///
    /// Document errors when the geom no longer exists.
    pub fn set_collidable(self, session: &mut Session, collidable: bool) -> Result<(), SessionError> {
        let affinity = i64::from(collidable);
        Ok(session.edit(|doc| -> Result<(), DocumentError> {
            doc.set(self.0, "contype", affinity)?;
            doc.set(self.0, "conaffinity", affinity)
        })?)
    }

    /// # Errors
    ///
    /// Build errors, or [`SessionError::Unbound`] if the geom was not
    /// compiled.
    pub fn is_collidable(self, session: &mut Session) -> Result<bool, SessionError> {
        session
            .runtime()?
            .is_collidable(self.0)
            .ok_or(SessionError::Unbound(self.0))
    }

    /// Whether the geom touches `other`, or anything at all when `other` is
    /// `None`, in the current runtime state.
    ///
    /// # Errors
    ///
    /// Build errors, or [`SessionError::Unbound`] if the geom was not
    /// compiled.
    pub fn has_collided(self, session: &mut Session, other: Option<Self>) -> Result<bool, SessionError> {
        let runtime = session.runtime()?;
        if runtime.geom(self.0).is_none() {
            return Err(SessionError::Unbound(self.0));
        }
        Ok(match other {
            Some(other) => runtime.in_contact(self.0, other.0),
            None => runtime.has_contact(self.0),
        })
    }

    /// The colour stored on the geom itself, ignoring any material.
    ///
    /// # Errors
    ///
    /// Document errors when the geom no longer exists.
    pub fn own_color(self, session: &Session) -> Result<Option<[f32; 4]>, SessionError> {
        let doc = session.document();
        if !doc.contains(self.0) {
            return Err(DocumentError::UnknownNode(self.0).into());
        }
        Ok(doc
            .get(self.0, "rgba")
            .and_then(AttrValue::as_vector)
            .and_then(|values| rgba(values).ok()))
    }
}
