use super::{pose_attrs, Body, Element, Transform, IDENTITY};
use crate::error::SessionError;
use crate::session::Session;
use scene::{AttrValue, ElementKind, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct CameraOptions {
    pub name: Option<String>,
    pub pos: [f32; 3],
    pub quat: [f32; 4],
    /// Vertical field of view in degrees.
    pub fovy: Option<f32>,
    pub focal: Option<[f32; 2]>,
    pub sensor_size: Option<[f32; 2]>,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            name: None,
            pos: [0.0; 3],
            quat: IDENTITY,
            fovy: None,
            focal: None,
            sensor_size: None,
        }
    }
}

/// A viewpoint fixed to a body. Position and orientation come from the
/// runtime; the optical parameters are document fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Camera(NodeId);

impl Element for Camera {
    const KIND: ElementKind = ElementKind::Camera;

    fn node(self) -> NodeId {
        self.0
    }

    fn wrap(node: NodeId) -> Self {
        Self(node)
    }
}

impl Transform for Camera {}

impl Camera {
    /// Add a camera to `parent`, or to the world body.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] for a non-positive field of view,
    /// and document errors such as a duplicate name.
    pub fn create(session: &mut Session, parent: Option<Body>, options: &CameraOptions) -> Result<Self, SessionError> {
        let parent = parent.map_or_else(|| session.document().world(), Element::node);
        let mut values = pose_attrs(options.pos, options.quat);
        if let Some(fovy) = options.fovy {
            values.insert("fovy".to_owned(), checked_fovy(fovy)?.into());
        }
        if let Some(focal) = options.focal {
            values.insert("focal".to_owned(), focal.into());
        }
        if let Some(sensor_size) = options.sensor_size {
            values.insert("sensorsize".to_owned(), sensor_size.into());
        }
        let node = session.edit(|doc| doc.add(parent, ElementKind::Camera, options.name.as_deref(), values))?;
        Ok(Self(node))
    }

    /// # Errors
    ///
    /// [`SessionError::InvalidArgument`] unless `fovy` is positive and
    /// finite, and document errors.
    pub fn set_fovy(self, session: &mut Session, fovy: f32) -> Result<(), SessionError> {
        let fovy = checked_fovy(fovy)?;
        self.write(session, &[("fovy", fovy.into())])
    }

    #[must_use]
    pub fn fovy(self, session: &Session) -> Option<f32> {
        session
            .document()
            .get(self.0, "fovy")
            .and_then(AttrValue::as_float)
    }

    /// Set the focal length. A missing sensor size and resolution are filled
    /// in, since the focal length means nothing without them.
    ///
    /// # Errors
    ///
    /// Document errors when the camera no longer exists.
    pub fn set_focal(self, session: &mut Session, focal: [f32; 2]) -> Result<(), SessionError> {
        let mut values: Vec<(&str, AttrValue)> = vec![("focal", focal.into())];
        self.fill_intrinsics(session, &mut values, &["sensorsize"]);
        self.write(session, &values)
    }

    #[must_use]
    pub fn focal(self, session: &Session) -> Option<[f32; 2]> {
        self.pair(session, "focal")
    }

    /// Set the focal length in pixels, filling in a missing sensor size and
    /// resolution.
    ///
    /// # Errors
    ///
    /// Document errors when the camera no longer exists.
    pub fn set_focal_pixel(self, session: &mut Session, focal_pixel: [f32; 2]) -> Result<(), SessionError> {
        let mut values: Vec<(&str, AttrValue)> = vec![("focalpixel", focal_pixel.into())];
        self.fill_intrinsics(session, &mut values, &["sensorsize"]);
        self.write(session, &values)
    }

    #[must_use]
    pub fn focal_pixel(self, session: &Session) -> Option<[f32; 2]> {
        self.pair(session, "focalpixel")
    }

    /// Set the sensor size. A sensor needs a focal length in either unit, so
    /// a zero `focal` is added when neither is set.
    ///
    /// # Errors
    ///
    /// Document errors when the camera no longer exists.
    pub fn set_sensor_size(self, session: &mut Session, sensor_size: [f32; 2]) -> Result<(), SessionError> {
        let mut values: Vec<(&str, AttrValue)> = vec![("sensorsize", sensor_size.into())];
        if self.pair(session, "focal").is_none() && self.pair(session, "focalpixel").is_none() {
            values.push(("focal", [0.0_f32; 2].into()));
        }
        self.fill_intrinsics(session, &mut values, &[]);
        self.write(session, &values)
    }

    #[must_use]
    pub fn sensor_size(self, session: &Session) -> Option<[f32; 2]> {
        self.pair(session, "sensorsize")
    }

    #[must_use]
    pub fn resolution(self, session: &Session) -> Option<[f32; 2]> {
        self.pair(session, "resolution")
    }

    /// Queue defaults for `resolution` and each of `extra` that the camera
    /// lacks.
    fn fill_intrinsics(self, session: &Session, values: &mut Vec<(&'static str, AttrValue)>, extra: &[&'static str]) {
        if self.pair(session, "resolution").is_none() {
            values.push(("resolution", [1.0_f32; 2].into()));
        }
        for &key in extra {
            if self.pair(session, key).is_none() {
                values.push((key, [0.0_f32; 2].into()));
            }
        }
    }

    fn write(self, session: &mut Session, values: &[(&'static str, AttrValue)]) -> Result<(), SessionError> {
        session.edit(|doc| {
            values
                .iter()
                .try_for_each(|(key, value)| doc.set(self.0, key, value.clone()))
        })?;
        Ok(())
    }

    fn pair(self, session: &Session, key: &str) -> Option<[f32; 2]> {
        session
            .document()
            .get(self.0, key)
            .and_then(AttrValue::as_vector)
            .and_then(|values| <[f32; 2]>::try_from(values).ok())
    }
}

fn checked_fovy(fovy: f32) -> Result<f32, SessionError> {
    if fovy.is_finite() && fovy > 0.0 {
        Ok(fovy)
    } else {
        Err(SessionError::InvalidArgument("field of view must be positive and finite"))
    }
}
