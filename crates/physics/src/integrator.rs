//! # Physics Integration
//!
//! Semi-implicit Euler updates for the two kinds of state a compiled runtime
//! carries: scalar joint coordinates and free body translation.

use crate::types::{Body, Joint, JointType};
use glam::Vec3;

/// Integrate free bodies under gravity.
pub fn integrate_free_bodies(bodies: &mut [Body], gravity: Vec3, dt: f32) {
    for body in bodies.iter_mut().filter(|body| body.free) {
        body.vel += gravity * dt;
        body.pos += body.vel * dt;
    }
}

/// Integrate hinge and slide joints driven by their spring and damper,
/// clamping to the joint range.
pub fn integrate_joints(joints: &mut [Joint], dt: f32) {
    for joint in joints
        .iter_mut()
        .filter(|joint| matches!(joint.kind, JointType::Hinge | JointType::Slide))
    {
        let acceleration =
            -joint.stiffness * (joint.qpos - joint.springref) - joint.damping * joint.qvel;
        joint.qvel += acceleration * dt;
        joint.qpos += joint.qvel * dt;

        if let Some([low, high]) = joint.range {
            if joint.qpos < low {
                joint.qpos = low;
                joint.qvel = joint.qvel.max(0.0);
            } else if joint.qpos > high {
                joint.qpos = high;
                joint.qvel = joint.qvel.min(0.0);
            }
        }
    }
}
