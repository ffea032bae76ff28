//! Error types for the core library.

use crate::identity::Identity;
use crate::proxy::NodeKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Failures of the node registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The identity is already bound to a servant in this registry.
    #[error("identity `{0}` is already registered")]
    DuplicateIdentity(Identity),
    /// No servant is registered under the identity.
    #[error("no servant registered for `{0}`")]
    NotFound(Identity),
    /// The servant exists but has a different type than the reference says.
    #[error("`{identity}` is a {actual}, not a {expected}")]
    KindMismatch {
        identity: Identity,
        expected: NodeKind,
        actual: NodeKind,
    },
}

/// Failures reported to a remote caller when a call cannot be dispatched.
///
/// Serializable because it travels back over the wire in place of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DispatchError {
    /// The reference names an identity absent from the registry. Expected
    /// for stale references; not fatal to the tree.
    #[error("object `{0}` does not exist")]
    NotFound(Identity),
    /// The target exists but does not implement the requested operation.
    #[error("operation `{operation}` does not exist on {kind} `{identity}`")]
    OperationNotExist {
        identity: Identity,
        kind: NodeKind,
        operation: String,
    },
}

/// Errors that can occur while building and activating the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The node was activated before, or its fixed identity is taken.
    #[error("node `{0}` is already activated")]
    AlreadyActivated(Identity),
    /// The parent directory was dropped before the child was activated.
    #[error("parent of node `{0}` is no longer available")]
    ParentUnavailable(String),
    /// The parent directory exists but has not been activated yet.
    #[error("parent of node `{0}` is not activated")]
    ParentNotActivated(String),
    /// Only a directory can take the root identity.
    #[error("node `{0}` has no parent but is not a directory")]
    RootNotDirectory(String),
    /// A string could not be parsed as an identity.
    #[error("invalid identity `{0}`")]
    InvalidIdentity(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
