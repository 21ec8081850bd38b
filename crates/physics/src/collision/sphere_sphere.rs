//! Bounding sphere contacts between two non-plane geoms.

use super::{Hit, CONTACT_MARGIN};
use crate::types::Geom;
use glam::Vec3;

pub(super) fn detect(a: &Geom, b: &Geom) -> Option<Hit> {
    let (radius_a, radius_b) = (a.bounding_radius(), b.bounding_radius());
    let delta = b.pos - a.pos;
    let distance = delta.length();
    let depth = radius_a + radius_b - distance;
    if depth < -CONTACT_MARGIN {
        return None;
    }
    let normal = delta.try_normalize().unwrap_or(Vec3::Z);
    Some(Hit {
        point: a.pos + normal * (radius_a - depth * 0.5),
        normal,
        depth,
    })
}
