//! # Collision Detection and Response
//!
//! Narrow phase over every geom pair that passes the contype/conaffinity
//! filter. Planes get exact tests against spheres and boxes; every other
//! pairing falls back to bounding spheres. Response only moves free bodies.

mod plane;
mod sphere_sphere;

use crate::types::{Body, Contact, Geom, GeomType};
use glam::Vec3;

/// Separation below which two geoms still count as touching.
pub const CONTACT_MARGIN: f32 = 1e-3;

/// Find every contact between the geoms of distinct bodies.
#[must_use]
pub fn detect(bodies: &[Body], geoms: &[Geom]) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for (a, geom_a) in geoms.iter().enumerate() {
        for (b, geom_b) in geoms.iter().enumerate().skip(a + 1) {
            if !filtered_in(bodies, geom_a, geom_b) {
                continue;
            }
            let contact = match (geom_a.kind, geom_b.kind) {
                (GeomType::Plane, GeomType::Plane) => None,
                (GeomType::Plane, _) => plane::detect(geom_a, geom_b).map(|hit| hit.between(a, b)),
                (_, GeomType::Plane) => plane::detect(geom_b, geom_a).map(|hit| hit.between(b, a)),
                _ => sphere_sphere::detect(geom_a, geom_b).map(|hit| hit.between(a, b)),
            };
            contacts.extend(contact);
        }
    }
    contacts
}

/// Push free bodies out of penetration and cancel their approaching
/// velocity. Returns whether any body moved.
pub fn resolve(contacts: &[Contact], geoms: &[Geom], bodies: &mut [Body]) -> bool {
    let mut moved = false;
    for contact in contacts.iter().filter(|contact| contact.depth > 0.0) {
        let body_a = geoms[contact.geom_a].body;
        let body_b = geoms[contact.geom_b].body;
        let (free_a, free_b) = (bodies[body_a].free, bodies[body_b].free);
        let share = if free_a && free_b { 0.5 } else { 1.0 };
        if free_a {
            push_out(&mut bodies[body_a], -contact.normal, contact.depth * share);
        }
        if free_b {
            push_out(&mut bodies[body_b], contact.normal, contact.depth * share);
        }
        moved |= free_a || free_b;
    }
    moved
}

fn push_out(body: &mut Body, normal: Vec3, depth: f32) {
    body.pos += normal * depth;
    let approaching = body.vel.dot(normal);
    if approaching < 0.0 {
        body.vel -= normal * approaching;
    }
}

/// Same-body pairs never collide, nor do direct parent/child pairs unless
/// the parent is the world.
fn filtered_in(bodies: &[Body], a: &Geom, b: &Geom) -> bool {
    if a.body == b.body {
        return false;
    }
    let parent_child = (bodies[a.body].parent == b.body && b.body != 0)
        || (bodies[b.body].parent == a.body && a.body != 0);
    let compatible = (a.contype & b.conaffinity) != 0 || (b.contype & a.conaffinity) != 0;
    compatible && !parent_child
}

/// Contact geometry before it is attached to a geom pair.
struct Hit {
    point: Vec3,
    normal: Vec3,
    depth: f32,
}

impl Hit {
    fn between(self, geom_a: usize, geom_b: usize) -> Contact {
        Contact {
            geom_a,
            geom_b,
            point: self.point,
            normal: self.normal,
            depth: self.depth,
        }
    }
}
