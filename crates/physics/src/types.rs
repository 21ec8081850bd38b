use glam::{Quat, Vec3};
use scene::{ElementKind, NodeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identity of one compiled runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildId(u64);

impl BuildId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build#{}", self.0)
    }
}

/// World pose of one geom, laid out for upload to a viewer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BodyPose {
    pub pos: [f32; 3],
    /// Orientation as `[w, x, y, z]`.
    pub quat: [f32; 4],
}

impl BodyPose {
    #[must_use]
    pub fn new(pos: Vec3, quat: Quat) -> Self {
        Self {
            pos: pos.to_array(),
            quat: wxyz(quat),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeomType {
    Plane,
    Sphere,
    Capsule,
    Ellipsoid,
    Cylinder,
    Box,
    Mesh,
}

impl GeomType {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "plane" => Self::Plane,
            "sphere" => Self::Sphere,
            "capsule" => Self::Capsule,
            "ellipsoid" => Self::Ellipsoid,
            "cylinder" => Self::Cylinder,
            "box" => Self::Box,
            "mesh" => Self::Mesh,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plane => "plane",
            Self::Sphere => "sphere",
            Self::Capsule => "capsule",
            Self::Ellipsoid => "ellipsoid",
            Self::Cylinder => "cylinder",
            Self::Box => "box",
            Self::Mesh => "mesh",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointType {
    Free,
    Hinge,
    Slide,
    Ball,
}

impl JointType {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "free" => Self::Free,
            "hinge" => Self::Hinge,
            "slide" => Self::Slide,
            "ball" => Self::Ball,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Hinge => "hinge",
            Self::Slide => "slide",
            Self::Ball => "ball",
        }
    }
}

/// A rigid body. Index 0 is always the world body.
#[derive(Clone, Debug)]
pub struct Body {
    pub node: NodeId,
    pub parent: usize,
    pub local_pos: Vec3,
    pub local_quat: Quat,
    pub joints: Vec<usize>,
    /// Carries a free joint and moves in world space.
    pub free: bool,
    pub pos: Vec3,
    pub quat: Quat,
    pub vel: Vec3,
}

#[derive(Clone, Debug)]
pub struct Geom {
    pub node: NodeId,
    pub body: usize,
    pub kind: GeomType,
    pub size: [f32; 3],
    pub local_pos: Vec3,
    pub local_quat: Quat,
    pub rgba: [f32; 4],
    pub material: Option<NodeId>,
    pub mesh: Option<NodeId>,
    pub contype: i64,
    pub conaffinity: i64,
    pub pos: Vec3,
    pub quat: Quat,
}

impl Geom {
    /// Radius of a sphere enclosing the geom; infinite for planes.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        let [a, b, c] = self.size;
        match self.kind {
            GeomType::Plane => f32::INFINITY,
            GeomType::Sphere => a,
            GeomType::Capsule => a + b,
            GeomType::Cylinder => a.hypot(b),
            GeomType::Ellipsoid => a.max(b).max(c),
            GeomType::Box | GeomType::Mesh => Vec3::new(a, b, c).length(),
        }
    }

    #[must_use]
    pub const fn is_collidable(&self) -> bool {
        self.contype != 0 || self.conaffinity != 0
    }
}

#[derive(Clone, Debug)]
pub struct Joint {
    pub node: NodeId,
    pub body: usize,
    pub kind: JointType,
    pub axis: Vec3,
    pub range: Option<[f32; 2]>,
    pub stiffness: f32,
    pub springref: f32,
    pub damping: f32,
    pub qpos: f32,
    pub qvel: f32,
}

#[derive(Clone, Debug)]
pub struct Site {
    pub node: NodeId,
    pub body: usize,
    pub local_pos: Vec3,
    pub local_quat: Quat,
    pub pos: Vec3,
    pub quat: Quat,
}

#[derive(Clone, Debug)]
pub struct Light {
    pub node: NodeId,
    pub body: usize,
    pub local_pos: Vec3,
    pub dir: Vec3,
    pub active: bool,
    pub directional: bool,
    pub castshadow: bool,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub pos: Vec3,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub node: NodeId,
    pub body: usize,
    pub local_pos: Vec3,
    pub local_quat: Quat,
    pub fovy: f32,
    pub pos: Vec3,
    pub quat: Quat,
}

/// A touching pair of geoms; `normal` points from `geom_a` towards `geom_b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub geom_a: usize,
    pub geom_b: usize,
    pub point: Vec3,
    pub normal: Vec3,
    pub depth: f32,
}

/// Where a document node ended up in the compiled arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub kind: ElementKind,
    pub index: usize,
}

/// Converts a glam quaternion to the document's `[w, x, y, z]` order.
#[must_use]
pub fn wxyz(quat: Quat) -> [f32; 4] {
    [quat.w, quat.x, quat.y, quat.z]
}

/// Converts a `[w, x, y, z]` quaternion to glam.
#[must_use]
pub fn from_wxyz(quat: [f32; 4]) -> Quat {
    Quat::from_xyzw(quat[1], quat[2], quat[3], quat[0])
}
