//! Remote references ("proxies").
//!
//! A `RemoteRef` names a target object by identity and target type. It holds
//! no pointer to the servant: whether the object still exists is only known
//! when a call is resolved against a registry. This makes references safe to
//! store in directory listings and to pass between processes.

use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target type of a remote reference.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "File",
            NodeKind::Directory => "Directory",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, serializable handle to a node.
///
/// Equality and hashing use `(identity, kind)` only.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RemoteRef {
    pub identity: Identity,
    pub kind: NodeKind,
}

impl RemoteRef {
    pub fn new(identity: Identity, kind: NodeKind) -> Self {
        Self { identity, kind }
    }

    #[inline]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -t:{}", self.identity, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_identity_and_kind() {
        let a = RemoteRef::new(Identity::new("x", ""), NodeKind::File);
        let b = RemoteRef::new(Identity::new("x", ""), NodeKind::File);
        let c = RemoteRef::new(Identity::new("x", ""), NodeKind::Directory);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let r = RemoteRef::new(Identity::root(), NodeKind::Directory);
        assert_eq!(r.to_string(), "RootDir -t:Directory");
        assert!(r.is_directory());
        assert!(!r.is_file());
    }
}
