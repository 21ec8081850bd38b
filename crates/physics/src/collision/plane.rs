//! Plane contacts. The plane normal is the local z axis of the geom.

use super::{Hit, CONTACT_MARGIN};
use crate::types::{Geom, GeomType};
use glam::Vec3;

pub(super) fn detect(plane: &Geom, other: &Geom) -> Option<Hit> {
    let normal = plane.quat * Vec3::Z;
    let height = |point: Vec3| (point - plane.pos).dot(normal);

    let (point, depth) = match other.kind {
        GeomType::Box => lowest_corner(other, height),
        _ => {
            let radius = other.bounding_radius();
            (other.pos - normal * radius, radius - height(other.pos))
        }
    };
    (depth >= -CONTACT_MARGIN).then_some(Hit {
        point,
        normal,
        depth,
    })
}

fn lowest_corner(cuboid: &Geom, height: impl Fn(Vec3) -> f32) -> (Vec3, f32) {
    let [x, y, z] = cuboid.size;
    let mut lowest = (cuboid.pos, f32::INFINITY);
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                let corner = cuboid.pos + cuboid.quat * Vec3::new(sx * x, sy * y, sz * z);
                let h = height(corner);
                if h < lowest.1 {
                    lowest = (corner, h);
                }
            }
        }
    }
    (lowest.0, -lowest.1)
}
