use scene::NodeId;
use thiserror::Error;

/// Reasons a document cannot be compiled into a [`crate::PhysicsSim`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),
    #[error("{node}: unknown geom type `{name}`")]
    UnknownGeomType { node: NodeId, name: String },
    #[error("{node}: unknown joint type `{name}`")]
    UnknownJointType { node: NodeId, name: String },
    #[error("{node}: a {shape} needs {expected}")]
    InvalidSize {
        node: NodeId,
        shape: &'static str,
        expected: &'static str,
    },
    #[error("{0}: mesh geom without a mesh asset")]
    MissingMesh(NodeId),
    #[error("{0}: joints cannot be attached to the world body")]
    JointOnWorldBody(NodeId),
    #[error("{node}: attribute `{attr}` must be {expected}")]
    InvalidAttribute {
        node: NodeId,
        attr: String,
        expected: &'static str,
    },
}
