//! Logical remote operations and their dispatch onto servants.
//!
//! | Target    | Operation | Reply                 |
//! |-----------|-----------|-----------------------|
//! | any node  | `Name`    | `Name(String)`        |
//! | any node  | `Kind`    | `Kind(NodeKind)`      |
//! | Directory | `List`    | `List(Vec<RemoteRef>)`|
//! | File      | `Read`    | `Read(Vec<String>)`   |
//! | File      | `Write`   | `Unit`                |
//!
//! These are transport-agnostic: any host that can carry an identity and an
//! `Operation` to a registry and bring the result back can serve the tree.

use crate::error::DispatchError;
use crate::identity::Identity;
use crate::node::Servant;
use crate::proxy::{NodeKind, RemoteRef};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Name,
    /// Type check used by checked casts.
    Kind,
    List,
    Read,
    Write(Vec<String>),
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Name => "name",
            Operation::Kind => "kind",
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Write(_) => "write",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Name(String),
    Kind(NodeKind),
    List(Vec<RemoteRef>),
    Read(Vec<String>),
    Unit,
}

impl Servant {
    /// Runs `operation` against this servant. `identity` is only used to
    /// describe failures.
    pub fn dispatch(
        &self,
        identity: &Identity,
        operation: Operation,
    ) -> Result<Reply, DispatchError> {
        match (self, operation) {
            (servant, Operation::Name) => Ok(Reply::Name(servant.name().to_string())),
            (servant, Operation::Kind) => Ok(Reply::Kind(servant.kind())),
            (Servant::Directory(dir), Operation::List) => Ok(Reply::List(dir.list())),
            (Servant::File(file), Operation::Read) => Ok(Reply::Read(file.read())),
            (Servant::File(file), Operation::Write(text)) => {
                file.write(text);
                Ok(Reply::Unit)
            }
            (servant, operation) => Err(DispatchError::OperationNotExist {
                identity: identity.clone(),
                kind: servant.kind(),
                operation: operation.as_str().to_string(),
            }),
        }
    }
}
