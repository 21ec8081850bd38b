use crate::types::{ElementKind, NodeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{0} does not exist in the document")]
    UnknownNode(NodeId),
    #[error("a {child} cannot be placed under a {parent}")]
    InvalidParent {
        parent: ElementKind,
        child: ElementKind,
    },
    #[error("a {kind} named `{name}` already exists")]
    DuplicateName { kind: ElementKind, name: String },
    #[error("the {0} root cannot be removed")]
    RootRemoval(ElementKind),
    #[error("reference to unknown asset `{0}`")]
    UnresolvedReference(String),
    #[error("{0} is referenced but has no name to serialize")]
    UnnamedReference(NodeId),
    #[error("attribute `{name}` has an unsupported value: {reason}")]
    InvalidAttribute { name: String, reason: &'static str },
    #[error("malformed scene description: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to access scene file: {0}")]
    Io(#[from] std::io::Error),
}
