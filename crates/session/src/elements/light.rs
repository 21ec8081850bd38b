use super::{Body, Element};
use crate::error::SessionError;
use crate::session::Session;
use scene::{attrs, AttrValue, ElementKind, NodeId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightType {
    #[default]
    Spotlight,
    Directional,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightOptions {
    pub name: Option<String>,
    pub pos: [f32; 3],
    pub dir: [f32; 3],
    pub light_type: LightType,
    pub shadows: bool,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

impl Default for LightOptions {
    fn default() -> Self {
        Self {
            name: None,
            pos: [0.0, 0.0, 2.0],
            dir: [0.0, 0.0, -1.0],
            light_type: LightType::Spotlight,
            shadows: true,
            ambient: [0.1; 3],
            diffuse: [0.4; 3],
            specular: [0.5; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Light(NodeId);

impl Element for Light {
    const KIND: ElementKind = ElementKind::Light;

    fn node(self) -> NodeId {
        self.0
    }

    fn wrap(node: NodeId) -> Self {
        Self(node)
    }
}

impl Light {
    /// Add a light to `parent`, or to the world body.
    ///
    /// # Errors
    ///
    /// Document errors such as a duplicate name.
    pub fn create(session: &mut Session, parent: Option<Body>, options: &LightOptions) -> Result<Self, SessionError> {
        let parent = parent.map_or_else(|| session.document().world(), Element::node);
        let values = attrs([
            ("pos", options.pos.into()),
            ("dir", options.dir.into()),
            ("directional", (options.light_type == LightType::Directional).into()),
            ("castshadow", options.shadows.into()),
            ("ambient", options.ambient.into()),
            ("diffuse", options.diffuse.into()),
            ("specular", options.specular.into()),
        ]);
        let node = session.edit(|doc| doc.add(parent, ElementKind::Light, options.name.as_deref(), values))?;
        Ok(Self(node))
    }

    /// # Errors
    ///
    /// Document errors when the light no longer exists.
    pub fn set_position(self, session: &mut Session, pos: [f32; 3]) -> Result<(), SessionError> {
        self.write(session, "pos", pos)
    }

    /// World position in the current runtime.
    ///
    /// # Errors
    ///
    /// Build errors, or [`SessionError::Unbound`] if the light was not
    /// compiled.
    pub fn position(self, session: &mut Session) -> Result<[f32; 3], SessionError> {
        session
            .runtime()?
            .light(self.0)
            .map(|light| light.pos.to_array())
            .ok_or(SessionError::Unbound(self.0))
    }

    /// # Errors
    ///
    /// Document errors when the light no longer exists.
    pub fn set_active(self, session: &mut Session, active: bool) -> Result<(), SessionError> {
        self.write(session, "active", active)
    }

    #[must_use]
    pub fn is_active(self, session: &Session) -> bool {
        self.flag(session, "active", true)
    }

    /// # Errors
    ///
    /// Document errors when the light no longer exists.
    pub fn set_ambient(self, session: &mut Session, color: [f32; 3]) -> Result<(), SessionError> {
        self.write(session, "ambient", color)
    }

    #[must_use]
    pub fn ambient(self, session: &Session) -> Option<[f32; 3]> {
        self.triple(session, "ambient")
    }

    /// # Errors
    ///
    /// Document errors when the light no longer exists.
    pub fn set_diffuse(self, session: &mut Session, color: [f32; 3]) -> Result<(), SessionError> {
        self.write(session, "diffuse", color)
    }

    #[must_use]
    pub fn diffuse(self, session: &Session) -> Option<[f32; 3]> {
        self.triple(session, "diffuse")
    }

    /// # Errors
    ///
    /// Document errors when the light no longer exists.
    pub fn set_specular(self, session: &mut Session, color: [f32; 3]) -> Result<(), SessionError> {
        self.write(session, "specular", color)
    }

    #[must_use]
    pub fn specular(self, session: &Session) -> Option<[f32; 3]> {
        self.triple(session, "specular")
    }

    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for a zero direction, and document
    /// errors.
    pub fn set_direction(self, session: &mut Session, dir: [f32; 3]) -> Result<(), SessionError> {
        if dir.iter().all(|c| c.abs() <= f32::EPSILON) {
            return Err(SessionError::InvalidArgument("light direction must be non-zero"));
        }
        self.write(session, "dir", dir)
    }

    #[must_use]
    pub fn direction(self, session: &Session) -> Option<[f32; 3]> {
        self.triple(session, "dir")
    }

    /// # Errors
    ///
    /// Document errors when the light no longer exists.
    pub fn set_shadows(self, session: &mut Session, shadows: bool) -> Result<(), SessionError> {
        self.write(session, "castshadow", shadows)
    }

    #[must_use]
    pub fn is_using_shadows(self, session: &Session) -> bool {
        self.flag(session, "castshadow", true)
    }

    /// # Errors
    ///
    /// Document errors when the light no longer exists.
    pub fn set_light_type(self, session: &mut Session, light_type: LightType) -> Result<(), SessionError> {
        self.write(session, "directional", light_type == LightType::Directional)
    }

    #[must_use]
    pub fn light_type(self, session: &Session) -> LightType {
        if self.flag(session, "directional", false) {
            LightType::Directional
        } else {
            LightType::Spotlight
        }
    }

    fn write(self, session: &mut Session, key: &str, value: impl Into<AttrValue>) -> Result<(), SessionError> {
        let value = value.into();
        session.edit(|doc| doc.set(self.0, key, value))?;
        Ok(())
    }

    fn flag(self, session: &Session, key: &str, default: bool) -> bool {
        session
            .document()
            .get(self.0, key)
            .and_then(AttrValue::as_bool)
            .unwrap_or(default)
    }

    fn triple(self, session: &Session, key: &str) -> Option<[f32; 3]> {
        session
            .document()
            .get(self.0, key)
            .and_then(AttrValue::as_vector)
            .and_then(|values| <[f32; 3]>::try_from(values).ok())
    }
}

