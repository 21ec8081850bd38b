//! # Runtime Compilation
//!
//! Walks a [`SceneDocument`] depth first and flattens it into the body, geom,
//! joint, site, light and camera arrays of a [`PhysicsSim`]. Parents are
//! always compiled before their children, so body indices are topologically
//! ordered and forward kinematics is a single pass.

use crate::error::BuildError;
use crate::simulation::PhysicsSim;
use crate::types::{
    from_wxyz, Binding, Body, Camera, Geom, GeomType, Joint, JointType, Light, Site,
};
use glam::{Quat, Vec3};
use scene::{ElementKind, NodeId, SceneDocument};

const DEFAULT_RGBA: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
const IDENTITY_WXYZ: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

impl PhysicsSim {
    /// Compile a runtime from the current content of `doc`.
    ///
    /// The build is deterministic: two builds of the same revision produce
    /// identical state, differing only in their [`crate::BuildId`].
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] describing the first node that cannot be
    /// compiled.
    pub fn build(doc: &SceneDocument) -> Result<Self, BuildError> {
        let options = doc.options();
        if !(options.timestep.is_finite() && options.timestep > 0.0) {
            return Err(BuildError::InvalidTimestep(options.timestep));
        }

        let mut sim = Self::empty(doc);
        Compiler { doc, sim: &mut sim }.subtree(doc.world(), 0)?;
        sim.place(true);
        sim.refresh_contacts();

        tracing::debug!(
            build = %sim.id(),
            revision = doc.revision(),
            bodies = sim.bodies().len(),
            geoms = sim.geoms().len(),
            joints = sim.joints().len(),
            "compiled runtime"
        );
        Ok(sim)
    }
}

struct Compiler<'a> {
    doc: &'a SceneDocument,
    sim: &'a mut PhysicsSim,
}

impl Compiler<'_> {
    fn subtree(&mut self, parent: NodeId, body: usize) -> Result<(), BuildError> {
        let doc = self.doc;
        for &child in doc.children(parent) {
            let Some(kind) = doc.kind(child) else { continue };
            let reader = Reader { doc, node: child };
            let index = match kind {
                ElementKind::Body => {
                    let index = self.body(&reader, body)?;
                    self.subtree(child, index)?;
                    index
                }
                ElementKind::Geom => self.geom(&reader, body)?,
                ElementKind::Joint => self.joint(&reader, body)?,
                ElementKind::Site => self.site(&reader, body)?,
                ElementKind::Light => self.light(&reader, body)?,
                ElementKind::Camera => self.camera(&reader, body)?,
                _ => continue,
            };
            self.sim.bind(child, Binding { kind, index });
        }
        Ok(())
    }

    fn body(&mut self, reader: &Reader<'_>, parent: usize) -> Result<usize, BuildError> {
        let bodies = self.sim.bodies_mut();
        bodies.push(Body {
            node: reader.node,
            parent,
            local_pos: reader.pos()?,
            local_quat: reader.quat()?,
            joints: Vec::new(),
            free: false,
            pos: Vec3::ZERO,
            quat: Quat::IDENTITY,
            vel: Vec3::ZERO,
        });
        Ok(bodies.len() - 1)
    }

    fn geom(&mut self, reader: &Reader<'_>, body: usize) -> Result<usize, BuildError> {
        let type_name = reader.text("type", "sphere")?;
        let kind = GeomType::parse(type_name).ok_or_else(|| BuildError::UnknownGeomType {
            node: reader.node,
            name: type_name.to_owned(),
        })?;

        let mesh = reader.reference("mesh")?;
        let size = match kind {
            GeomType::Mesh => {
                let mesh = mesh.ok_or(BuildError::MissingMesh(reader.node))?;
                Reader { doc: self.doc, node: mesh }.vector("scale", [1.0; 3])?
            }
            _ => reader.size()?,
        };
        check_size(reader.node, kind, size)?;

        let material = reader.reference("material")?;
        let rgba = match (reader.has("rgba"), material) {
            (false, Some(material)) => Reader { doc: self.doc, node: material }.color("rgba")?,
            _ => reader.color("rgba")?,
        };

        let geoms = self.sim.geoms_mut();
        geoms.push(Geom {
            node: reader.node,
            body,
            kind,
            size,
            local_pos: reader.pos()?,
            local_quat: reader.quat()?,
            rgba,
            material,
            mesh,
            contype: reader.int("contype", 1)?,
            conaffinity: reader.int("conaffinity", 1)?,
            pos: Vec3::ZERO,
            quat: Quat::IDENTITY,
        });
        Ok(geoms.len() - 1)
    }

    fn joint(&mut self, reader: &Reader<'_>, body: usize) -> Result<usize, BuildError> {
        if body == 0 {
            return Err(BuildError::JointOnWorldBody(reader.node));
        }
        let type_name = reader.text("type", "hinge")?;
        let kind = JointType::parse(type_name).ok_or_else(|| BuildError::UnknownJointType {
            node: reader.node,
            name: type_name.to_owned(),
        })?;

        let axis = Vec3::from_array(reader.vector("axis", [0.0, 0.0, 1.0])?)
            .try_normalize()
            .ok_or_else(|| reader.invalid("axis", "a non-zero vector"))?;
        let range = if reader.has("range") {
            let [low, high] = reader.vector("range", [0.0; 2])?;
            if low > high {
                return Err(reader.invalid("range", "an increasing [min, max] pair"));
            }
            Some([low, high])
        } else {
            None
        };

        let joints = self.sim.joints_mut();
        joints.push(Joint {
            node: reader.node,
            body,
            kind,
            axis,
            range,
            stiffness: reader.float("stiffness", 0.0)?,
            springref: reader.float("springref", 0.0)?,
            damping: reader.float("damping", 0.0)?,
            qpos: reader.float("qpos", 0.0)?,
            qvel: 0.0,
        });
        let index = joints.len() - 1;

        let owner = &mut self.sim.bodies_mut()[body];
        owner.joints.push(index);
        owner.free |= kind == JointType::Free;
        Ok(index)
    }

    fn site(&mut self, reader: &Reader<'_>, body: usize) -> Result<usize, BuildError> {
        let sites = self.sim.sites_mut();
        sites.push(Site {
            node: reader.node,
            body,
            local_pos: reader.pos()?,
            local_quat: reader.quat()?,
            pos: Vec3::ZERO,
            quat: Quat::IDENTITY,
        });
        Ok(sites.len() - 1)
    }

    fn light(&mut self, reader: &Reader<'_>, body: usize) -> Result<usize, BuildError> {
        let dir = Vec3::from_array(reader.vector("dir", [0.0, 0.0, -1.0])?)
            .try_normalize()
            .ok_or_else(|| reader.invalid("dir", "a non-zero vector"))?;
        let lights = self.sim.lights_mut();
        lights.push(Light {
            node: reader.node,
            body,
            local_pos: reader.pos()?,
            dir,
            active: reader.flag("active", true)?,
            directional: reader.flag("directional", false)?,
            castshadow: reader.flag("castshadow", true)?,
            ambient: reader.vector("ambient", [0.0; 3])?,
            diffuse: reader.vector("diffuse", [0.7; 3])?,
            specular: reader.vector("specular", [0.3; 3])?,
            pos: Vec3::ZERO,
        });
        Ok(lights.len() - 1)
    }

    fn camera(&mut self, reader: &Reader<'_>, body: usize) -> Result<usize, BuildError> {
        let cameras = self.sim.cameras_mut();
        cameras.push(Camera {
            node: reader.node,
            body,
            local_pos: reader.pos()?,
            local_quat: reader.quat()?,
            fovy: reader.float("fovy", 45.0)?,
            pos: Vec3::ZERO,
            quat: Quat::IDENTITY,
        });
        Ok(cameras.len() - 1)
    }
}

fn check_size(node: NodeId, kind: GeomType, [a, b, c]: [f32; 3]) -> Result<(), BuildError> {
    let (valid, expected) = match kind {
        GeomType::Plane => (true, ""),
        GeomType::Sphere => (a > 0.0, "a positive radius"),
        GeomType::Capsule | GeomType::Cylinder => {
            (a > 0.0 && b > 0.0, "a positive radius and half-length")
        }
        GeomType::Box | GeomType::Ellipsoid | GeomType::Mesh => {
            (a > 0.0 && b > 0.0 && c > 0.0, "three positive extents")
        }
    };
    if valid {
        Ok(())
    } else {
        Err(BuildError::InvalidSize {
            node,
            shape: kind.as_str(),
            expected,
        })
    }
}

/// Typed attribute access for one node, with defaults for absent keys.
struct Reader<'a> {
    doc: &'a SceneDocument,
    node: NodeId,
}

impl<'a> Reader<'a> {
    fn has(&self, attr: &str) -> bool {
        self.doc.get(self.node, attr).is_some()
    }

    fn invalid(&self, attr: &str, expected: &'static str) -> BuildError {
        BuildError::InvalidAttribute {
            node: self.node,
            attr: attr.to_owned(),
            expected,
        }
    }

    fn float(&self, attr: &str, default: f32) -> Result<f32, BuildError> {
        self.doc.get(self.node, attr).map_or(Ok(default), |value| {
            value.as_float().ok_or_else(|| self.invalid(attr, "a number"))
        })
    }

    fn int(&self, attr: &str, default: i64) -> Result<i64, BuildError> {
        self.doc.get(self.node, attr).map_or(Ok(default), |value| {
            value.as_int().ok_or_else(|| self.invalid(attr, "an integer"))
        })
    }

    fn flag(&self, attr: &str, default: bool) -> Result<bool, BuildError> {
        self.doc.get(self.node, attr).map_or(Ok(default), |value| {
            value.as_bool().ok_or_else(|| self.invalid(attr, "a boolean"))
        })
    }

    fn text(&self, attr: &str, default: &'static str) -> Result<&'a str, BuildError> {
        self.doc.get(self.node, attr).map_or(Ok(default), |value| {
            value.as_text().ok_or_else(|| self.invalid(attr, "a string"))
        })
    }

    fn reference(&self, attr: &str) -> Result<Option<NodeId>, BuildError> {
        self.doc
            .get(self.node, attr)
            .map(|value| value.as_node().ok_or_else(|| self.invalid(attr, "an asset reference")))
            .transpose()
    }

    fn vector<const N: usize>(&self, attr: &str, default: [f32; N]) -> Result<[f32; N], BuildError> {
        self.doc.get(self.node, attr).map_or(Ok(default), |value| {
            value
                .as_vector()
                .and_then(|values| <[f32; N]>::try_from(values).ok())
                .ok_or_else(|| self.invalid(attr, "a vector of the expected length"))
        })
    }

    /// Geom sizes may omit trailing components; missing ones are zero.
    fn size(&self) -> Result<[f32; 3], BuildError> {
        let Some(value) = self.doc.get(self.node, "size") else {
            return Ok([0.0; 3]);
        };
        if let Some(scalar) = value.as_float() {
            return Ok([scalar, 0.0, 0.0]);
        }
        match value.as_vector() {
            Some(values) if (1..=3).contains(&values.len()) => {
                let mut size = [0.0; 3];
                size[..values.len()].copy_from_slice(values);
                Ok(size)
            }
            _ => Err(self.invalid("size", "one to three numbers")),
        }
    }

    /// Colours accept RGB or RGBA; alpha defaults to opaque.
    fn color(&self, attr: &str) -> Result<[f32; 4], BuildError> {
        let Some(value) = self.doc.get(self.node, attr) else {
            return Ok(DEFAULT_RGBA);
        };
        match value.as_vector() {
            Some(&[r, g, b]) => Ok([r, g, b, 1.0]),
            Some(&[r, g, b, a]) => Ok([r, g, b, a]),
            _ => Err(self.invalid(attr, "three or four colour components")),
        }
    }

    fn pos(&self) -> Result<Vec3, BuildError> {
        self.vector("pos", [0.0; 3]).map(Vec3::from_array)
    }

    fn quat(&self) -> Result<Quat, BuildError> {
        let quat = from_wxyz(self.vector("quat", IDENTITY_WXYZ)?);
        if quat.length_squared() <= f32::EPSILON {
            return Err(self.invalid("quat", "a non-zero quaternion"));
        }
        Ok(quat.normalize())
    }
}
