//! # Physics Simulation Core
//!
//! [`PhysicsSim`] is the compiled form of one document revision. Its topology
//! (which bodies, geoms and joints exist and how they nest) is fixed at build
//! time; only state advances: joint coordinates, free body motion, contacts
//! and the derived world poses.
//!
//! Every query is keyed by the document [`NodeId`] the element was compiled
//! from, so callers never deal with the internal array layout.

use crate::collision;
use crate::integrator::{integrate_free_bodies, integrate_joints};
use crate::transform::compose;
use crate::types::{
    wxyz, Binding, Body, BodyPose, BuildId, Camera, Contact, Geom, Joint, JointType, Light, Site,
};
use glam::{Quat, Vec3};
use scene::{ElementKind, Headlight, NodeId, SceneDocument};
use std::collections::HashMap;

/// A compiled, steppable runtime.
#[derive(Clone, Debug)]
pub struct PhysicsSim {
    id: BuildId,
    source_revision: u64,
    timestep: f32,
    gravity: Vec3,
    headlight: Headlight,
    time: f32,
    steps: u64,

    bodies: Vec<Body>,
    geoms: Vec<Geom>,
    joints: Vec<Joint>,
    sites: Vec<Site>,
    lights: Vec<Light>,
    cameras: Vec<Camera>,
    contacts: Vec<Contact>,

    bindings: HashMap<NodeId, Binding>,
}

impl PhysicsSim {
    /// A runtime holding only the world body, configured from `doc`'s options.
    pub(crate) fn empty(doc: &SceneDocument) -> Self {
        let options = doc.options();
        let world = Body {
            node: doc.world(),
            parent: 0,
            local_pos: Vec3::ZERO,
            local_quat: Quat::IDENTITY,
            joints: Vec::new(),
            free: false,
            pos: Vec3::ZERO,
            quat: Quat::IDENTITY,
            vel: Vec3::ZERO,
        };
        let mut bindings = HashMap::new();
        bindings.insert(
            doc.world(),
            Binding {
                kind: ElementKind::World,
                index: 0,
            },
        );
        Self {
            id: BuildId::next(),
            source_revision: doc.revision(),
            timestep: options.timestep,
            gravity: Vec3::from_array(options.gravity),
            headlight: options.headlight,
            time: 0.0,
            steps: 0,
            bodies: vec![world],
            geoms: Vec::new(),
            joints: Vec::new(),
            sites: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            contacts: Vec::new(),
            bindings,
        }
    }

    #[must_use]
    pub const fn id(&self) -> BuildId {
        self.id
    }

    /// Revision of the document this runtime was compiled from.
    #[must_use]
    pub const fn source_revision(&self) -> u64 {
        self.source_revision
    }

    #[must_use]
    pub const fn timestep(&self) -> f32 {
        self.timestep
    }

    #[must_use]
    pub const fn gravity(&self) -> Vec3 {
        self.gravity
    }

    #[must_use]
    pub const fn headlight(&self) -> &Headlight {
        &self.headlight
    }

    /// Simulated time since the build.
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Number of steps taken since the build.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    #[must_use]
    pub fn geoms(&self) -> &[Geom] {
        &self.geoms
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[must_use]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Contacts found by the last build or step.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Where `node` was compiled to, if it was compiled at all.
    #[must_use]
    pub fn binding(&self, node: NodeId) -> Option<Binding> {
        self.bindings.get(&node).copied()
    }

    #[must_use]
    pub fn body(&self, node: NodeId) -> Option<&Body> {
        self.index_of(node, &[ElementKind::World, ElementKind::Body])
            .map(|index| &self.bodies[index])
    }

    #[must_use]
    pub fn geom(&self, node: NodeId) -> Option<&Geom> {
        self.index_of(node, &[ElementKind::Geom])
            .map(|index| &self.geoms[index])
    }

    #[must_use]
    pub fn joint(&self, node: NodeId) -> Option<&Joint> {
        self.index_of(node, &[ElementKind::Joint])
            .map(|index| &self.joints[index])
    }

    #[must_use]
    pub fn site(&self, node: NodeId) -> Option<&Site> {
        self.index_of(node, &[ElementKind::Site])
            .map(|index| &self.sites[index])
    }

    #[must_use]
    pub fn light(&self, node: NodeId) -> Option<&Light> {
        self.index_of(node, &[ElementKind::Light])
            .map(|index| &self.lights[index])
    }

    #[must_use]
    pub fn camera(&self, node: NodeId) -> Option<&Camera> {
        self.index_of(node, &[ElementKind::Camera])
            .map(|index| &self.cameras[index])
    }

    /// World position of a body, geom, site, light or camera.
    #[must_use]
    pub fn position(&self, node: NodeId) -> Option<Vec3> {
        let Binding { kind, index } = self.binding(node)?;
        match kind {
            ElementKind::World | ElementKind::Body => Some(self.bodies[index].pos),
            ElementKind::Geom => Some(self.geoms[index].pos),
            ElementKind::Site => Some(self.sites[index].pos),
            ElementKind::Light => Some(self.lights[index].pos),
            ElementKind::Camera => Some(self.cameras[index].pos),
            _ => None,
        }
    }

    /// World orientation as `[w, x, y, z]`.
    #[must_use]
    pub fn quaternion(&self, node: NodeId) -> Option<[f32; 4]> {
        let Binding { kind, index } = self.binding(node)?;
        let quat = match kind {
            ElementKind::World | ElementKind::Body => self.bodies[index].quat,
            ElementKind::Geom => self.geoms[index].quat,
            ElementKind::Site => self.sites[index].quat,
            ElementKind::Camera => self.cameras[index].quat,
            _ => return None,
        };
        Some(wxyz(quat))
    }

    /// Compiled colour of a geom, after material fallback.
    #[must_use]
    pub fn rgba(&self, node: NodeId) -> Option<[f32; 4]> {
        self.geom(node).map(|geom| geom.rgba)
    }

    #[must_use]
    pub fn is_collidable(&self, node: NodeId) -> Option<bool> {
        self.geom(node).map(Geom::is_collidable)
    }

    #[must_use]
    pub fn joint_position(&self, node: NodeId) -> Option<f32> {
        self.joint(node).map(|joint| joint.qpos)
    }

    #[must_use]
    pub fn joint_velocity(&self, node: NodeId) -> Option<f32> {
        self.joint(node).map(|joint| joint.qvel)
    }

    /// Overwrite a joint coordinate in the runtime state. Returns `false`
    /// when `node` is not a compiled joint.
    pub fn set_joint_position(&mut self, node: NodeId, qpos: f32) -> bool {
        let Some(index) = self.index_of(node, &[ElementKind::Joint]) else {
            return false;
        };
        self.joints[index].qpos = qpos;
        self.place(false);
        true
    }

    /// Overwrite a joint velocity in the runtime state. Returns `false` when
    /// `node` is not a compiled joint.
    pub fn set_joint_velocity(&mut self, node: NodeId, qvel: f32) -> bool {
        let Some(index) = self.index_of(node, &[ElementKind::Joint]) else {
            return false;
        };
        self.joints[index].qvel = qvel;
        true
    }

    /// Whether a geom, or any geom of a body, is part of a current contact.
    #[must_use]
    pub fn has_contact(&self, node: NodeId) -> bool {
        let Some(Binding { kind, index }) = self.binding(node) else {
            return false;
        };
        let touches = |geom: usize| match kind {
            ElementKind::Geom => geom == index,
            ElementKind::Body | ElementKind::World => self.geoms[geom].body == index,
            _ => false,
        };
        self.contacts
            .iter()
            .any(|contact| touches(contact.geom_a) || touches(contact.geom_b))
    }

    /// Whether two geoms touch each other in the current contact set.
    #[must_use]
    pub fn in_contact(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(a), Some(b)) = (
            self.index_of(a, &[ElementKind::Geom]),
            self.index_of(b, &[ElementKind::Geom]),
        ) else {
            return false;
        };
        self.contacts.iter().any(|contact| {
            (contact.geom_a, contact.geom_b) == (a, b) || (contact.geom_a, contact.geom_b) == (b, a)
        })
    }

    /// World pose of every geom in compile order.
    #[must_use]
    pub fn geom_poses(&self) -> Vec<BodyPose> {
        self.geoms
            .iter()
            .map(|geom| BodyPose::new(geom.pos, geom.quat))
            .collect()
    }

    /// Advance the simulation by one timestep.
    pub fn step(&mut self) {
        let dt = self.timestep;
        integrate_joints(&mut self.joints, dt);
        integrate_free_bodies(&mut self.bodies, self.gravity, dt);
        self.place(false);

        self.contacts = collision::detect(&self.bodies, &self.geoms);
        if collision::resolve(&self.contacts, &self.geoms, &mut self.bodies) {
            self.place(false);
        }

        self.time += dt;
        self.steps += 1;
    }

    /// Advance the simulation by `steps` timesteps.
    pub fn step_n(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Forward kinematics. Free bodies keep their integrated pose unless
    /// `include_free` is set, which is only the case right after a build.
    pub(crate) fn place(&mut self, include_free: bool) {
        for index in 1..self.bodies.len() {
            let parent = &self.bodies[self.bodies[index].parent];
            let (parent_pos, parent_quat) = (parent.pos, parent.quat);
            let body = &self.bodies[index];
            if body.free && !include_free {
                continue;
            }
            let (mut pos, mut quat) = compose(parent_pos, parent_quat, body.local_pos, body.local_quat);
            for joint in body.joints.iter().map(|&joint| &self.joints[joint]) {
                match joint.kind {
                    JointType::Hinge => quat *= Quat::from_axis_angle(joint.axis, joint.qpos),
                    JointType::Slide => pos += quat * (joint.axis * joint.qpos),
                    JointType::Free | JointType::Ball => {}
                }
            }
            let body = &mut self.bodies[index];
            body.pos = pos;
            body.quat = quat.normalize();
        }

        let bodies = &self.bodies;
        for geom in &mut self.geoms {
            let body = &bodies[geom.body];
            (geom.pos, geom.quat) = compose(body.pos, body.quat, geom.local_pos, geom.local_quat);
        }
        for site in &mut self.sites {
            let body = &bodies[site.body];
            (site.pos, site.quat) = compose(body.pos, body.quat, site.local_pos, site.local_quat);
        }
        for light in &mut self.lights {
            let body = &bodies[light.body];
            light.pos = body.pos + body.quat * light.local_pos;
        }
        for camera in &mut self.cameras {
            let body = &bodies[camera.body];
            (camera.pos, camera.quat) =
                compose(body.pos, body.quat, camera.local_pos, camera.local_quat);
        }
    }

    pub(crate) fn refresh_contacts(&mut self) {
        self.contacts = collision::detect(&self.bodies, &self.geoms);
    }

    pub(crate) fn bind(&mut self, node: NodeId, binding: Binding) {
        self.bindings.insert(node, binding);
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut Vec<Body> {
        &mut self.bodies
    }

    pub(crate) fn geoms_mut(&mut self) -> &mut Vec<Geom> {
        &mut self.geoms
    }

    pub(crate) fn joints_mut(&mut self) -> &mut Vec<Joint> {
        &mut self.joints
    }

    pub(crate) fn sites_mut(&mut self) -> &mut Vec<Site> {
        &mut self.sites
    }

    pub(crate) fn lights_mut(&mut self) -> &mut Vec<Light> {
        &mut self.lights
    }

    pub(crate) fn cameras_mut(&mut self) -> &mut Vec<Camera> {
        &mut self.cameras
    }

    fn index_of(&self, node: NodeId, kinds: &[ElementKind]) -> Option<usize> {
        self.binding(node)
            .filter(|binding| kinds.contains(&binding.kind))
            .map(|binding| binding.index)
    }
}
