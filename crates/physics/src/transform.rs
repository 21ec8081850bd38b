//! Pose composition helpers.

use glam::{Quat, Vec3};

/// World pose of a child frame given its parent's world pose and its own
/// pose relative to the parent.
#[must_use]
pub fn compose(parent_pos: Vec3, parent_quat: Quat, local_pos: Vec3, local_quat: Quat) -> (Vec3, Quat) {
    (parent_pos + parent_quat * local_pos, parent_quat * local_quat)
}
