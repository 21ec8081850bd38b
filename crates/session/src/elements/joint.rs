use super::{Body, Element};
use crate::error::SessionError;
use crate::session::Session;
use physics::JointType;
use scene::{attrs, ElementKind, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct JointOptions {
    pub name: Option<String>,
    pub joint_type: JointType,
    pub axis: [f32; 3],
    /// `[min, max]` limits; unlimited when `None`.
    pub range: Option<[f32; 2]>,
    pub stiffness: f32,
    pub springref: f32,
    pub damping: f32,
}

impl Default for JointOptions {
    fn default() -> Self {
        Self {
            name: None,
            joint_type: JointType::Hinge,
            axis: [1.0, 0.0, 0.0],
            range: None,
            stiffness: 0.0,
            springref: 0.0,
            damping: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Joint(NodeId);

impl Element for Joint {
    const KIND: ElementKind = ElementKind::Joint;

    fn node(self) -> NodeId {
        self.0
    }

    fn wrap(node: NodeId) -> Self {
        Self(node)
    }
}

impl Joint {
    /// Add a joint to `body`.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for a decreasing range, and document
    /// errors such as a duplicate name.
    pub fn create(session: &mut Session, body: Body, options: &JointOptions) -> Result<Self, SessionError> {
        let mut values = attrs([
            ("type", options.joint_type.as_str().into()),
            ("axis", options.axis.into()),
            ("stiffness", options.stiffness.into()),
            ("springref", options.springref.into()),
            ("damping", options.damping.into()),
        ]);
        if let Some(range) = options.range {
            values.insert("range".to_owned(), checked_range(range)?.into());
        }
        let parent = body.node();
        let node = session.edit(|doc| doc.add(parent, ElementKind::Joint, options.name.as_deref(), values))?;
        Ok(Self(node))
    }

    /// The body the joint moves.
    ///
    /// # Errors
    ///
    /// Document errors when the joint no longer exists.
    pub fn body(self, session: &Session) -> Result<Body, SessionError> {
        session
            .document()
            .parent(self.0)
            .map(Body::wrap)
            .ok_or_else(|| scene::DocumentError::UnknownNode(self.0).into())
    }

    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for an unknown stored type.
    pub fn joint_type(self, session: &Session) -> Result<JointType, SessionError> {
        match session.document().get(self.0, "type") {
            None => Ok(JointType::Hinge),
            Some(value) => value
                .as_text()
                .and_then(JointType::parse)
                .ok_or(SessionError::InvalidArgument("unknown joint type")),
        }
    }

    /// Set the joint coordinate the runtime starts from after a rebuild.
    ///
    /// # Errors
    ///
    /// Document errors when the joint no longer exists.
    pub fn set_position(self, session: &mut Session, qpos: f32) -> Result<(), SessionError> {
        Ok(session.edit(|doc| doc.set(self.0, "qpos", qpos))?)
    }

    /// Current joint coordinate in the runtime.
    ///
    /// # Errors
    ///
    /// Build errors, or [`SessionError::Unbound`] if the joint was not
    /// compiled.
    pub fn position(self, session: &mut Session) -> Result<f32, SessionError> {
        session
            .runtime()?
            .joint_position(self.0)
            .ok_or(SessionError::Unbound(self.0))
    }

    /// # Errors
    ///
    /// See [`Joint::position`].
    pub fn velocity(self, session: &mut Session) -> Result<f32, SessionError> {
        session
            .runtime()?
            .joint_velocity(self.0)
            .ok_or(SessionError::Unbound(self.0))
    }

    /// Overwrite the joint velocity in the runtime state only. The value
    /// does not survive a rebuild.
    ///
    /// # Errors
    ///
    /// See [`Joint::position`].
    pub fn set_velocity(self, session: &mut Session, qvel: f32) -> Result<(), SessionError> {
        if session.runtime_mut()?.set_joint_velocity(self.0, qvel) {
            Ok(())
        } else {
            Err(SessionError::Unbound(self.0))
        }
    }

    /// # Errors
    ///
    /// Document errors when the joint no longer exists.
    pub fn set_axis(self, session: &mut Session, axis: [f32; 3]) -> Result<(), SessionError> {
        Ok(session.edit(|doc| doc.set(self.0, "axis", axis))?)
    }

    /// Limit the joint to `range`, or remove the limit with `None`.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for a decreasing range, and document
    /// errors.
    pub fn set_range(self, session: &mut Session, range: Option<[f32; 2]>) -> Result<(), SessionError> {
        match range {
            Some(range) => {
                let range = checked_range(range)?;
                Ok(session.edit(|doc| doc.set(self.0, "range", range))?)
            }
            None => {
                session.edit(|doc| doc.unset(self.0, "range"))?;
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// Document errors when the joint no longer exists.
    pub fn set_stiffness(self, session: &mut Session, stiffness: f32) -> Result<(), SessionError> {
        Ok(session.edit(|doc| doc.set(self.0, "stiffness", stiffness))?)
    }

    /// # Errors
    ///
    /// Document errors when the joint no longer exists.
    pub fn set_springref(self, session: &mut Session, springref: f32) -> Result<(), SessionError> {
        Ok(session.edit(|doc| doc.set(self.0, "springref", springref))?)
    }

    /// # Errors
    ///
    /// Document errors when the joint no longer exists.
    pub fn set_damping(self, session: &mut Session, damping: f32) -> Result<(), SessionError> {
        Ok(session.edit(|doc| doc.set(self.0, "damping", damping))?)
    }
}

fn checked_range([low, high]: [f32; 2]) -> Result<[f32; 2], SessionError> {
    if low <= high {
        Ok([low, high])
    } else {
        Err(SessionError::InvalidArgument("joint ranges must be increasing"))
    }
}
