use crate::config::ConfigError;
use crate::live_view::ViewerError;
use physics::BuildError;
use scene::{DocumentError, ElementKind, NodeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no live view is attached")]
    NotAttached,
    #[error("a live view is already attached")]
    AlreadyAttached,
    #[error("failed to build the runtime: {0}")]
    Build(#[from] BuildError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("live view failed: {0}")]
    Viewer(#[from] ViewerError),
    #[error("body `{body}` has a free joint; load with free joint handling enabled")]
    FreeJointNotAllowed { body: String },
    #[error("{node} is a {found}, expected a {expected}")]
    WrongKind {
        node: NodeId,
        expected: ElementKind,
        found: ElementKind,
    },
    #[error("no {kind} named `{name}`")]
    UnknownElement { kind: ElementKind, name: String },
    #[error("{0} is not part of the compiled runtime")]
    Unbound(NodeId),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
