//! Typed proxies.
//!
//! A proxy pairs a [`RemoteRef`] with the [`Connection`] used to reach it.
//! Holding a proxy says nothing about whether the object exists; every call
//! is resolved on the serving side, and a stale reference shows up as
//! [`TransportError::Dispatch`] with `NotFound`.

use crate::connection::Connection;
use crate::error::{Result, TransportError};
use corelib::{Identity, NodeKind, Operation, RemoteRef, Reply};
use std::fmt;
use std::sync::Arc;

/// Proxy for any node.
#[derive(Clone)]
pub struct NodePrx {
    reference: RemoteRef,
    connection: Arc<dyn Connection>,
}

impl NodePrx {
    pub fn new(reference: RemoteRef, connection: Arc<dyn Connection>) -> Self {
        Self {
            reference,
            connection,
        }
    }

    pub fn reference(&self) -> &RemoteRef {
        &self.reference
    }

    pub fn identity(&self) -> &Identity {
        &self.reference.identity
    }

    pub fn kind(&self) -> NodeKind {
        self.reference.kind
    }

    pub async fn name(&self) -> Result<String> {
        match self.invoke(Operation::Name).await? {
            Reply::Name(name) => Ok(name),
            reply => Err(unexpected("name", reply)),
        }
    }

    /// Asks the object for its actual kind.
    pub async fn remote_kind(&self) -> Result<NodeKind> {
        match self.invoke(Operation::Kind).await? {
            Reply::Kind(kind) => Ok(kind),
            reply => Err(unexpected("kind", reply)),
        }
    }

    /// Narrows by the kind recorded in the reference, without a remote call.
    pub fn as_directory(&self) -> Option<DirectoryPrx> {
        self.reference.is_directory().then(|| DirectoryPrx {
            node: self.clone(),
        })
    }

    /// Narrows by the kind recorded in the reference, without a remote call.
    pub fn as_file(&self) -> Option<FilePrx> {
        self.reference.is_file().then(|| FilePrx { node: self.clone() })
    }

    async fn invoke(&self, operation: Operation) -> Result<Reply> {
        self.connection
            .invoke(&self.reference.identity, operation)
            .await
    }

    async fn invoke_oneway(&self, operation: Operation) -> Result<()> {
        self.connection
            .invoke_oneway(&self.reference.identity, operation)
            .await
    }
}

impl fmt::Debug for NodePrx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodePrx").field(&self.reference).finish()
    }
}

impl PartialEq for NodePrx {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

/// Proxy for a directory.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectoryPrx {
    node: NodePrx,
}

impl DirectoryPrx {
    /// Builds a directory proxy for `identity` after confirming remotely that
    /// the object is a directory. This is how a client bootstraps from the
    /// well-known root identity.
    pub async fn checked_cast(connection: Arc<dyn Connection>, identity: Identity) -> Result<Self> {
        let candidate = NodePrx::new(
            RemoteRef::new(identity.clone(), NodeKind::Directory),
            connection,
        );
        match candidate.remote_kind().await? {
            NodeKind::Directory => Ok(Self { node: candidate }),
            NodeKind::File => Err(TransportError::NotADirectory(identity)),
        }
    }

    pub fn as_node(&self) -> &NodePrx {
        &self.node
    }

    pub fn reference(&self) -> &RemoteRef {
        self.node.reference()
    }

    pub async fn name(&self) -> Result<String> {
        self.node.name().await
    }

    /// Children in activation order, as proxies over the same connection.
    pub async fn list(&self) -> Result<Vec<NodePrx>> {
        match self.node.invoke(Operation::List).await? {
            Reply::List(children) => Ok(children
                .into_iter()
                .map(|child| NodePrx::new(child, Arc::clone(&self.node.connection)))
                .collect()),
            reply => Err(unexpected("list", reply)),
        }
    }
}

/// Proxy for a file.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePrx {
    node: NodePrx,
}

impl FilePrx {
    pub async fn checked_cast(connection: Arc<dyn Connection>, identity: Identity) -> Result<Self> {
        let candidate = NodePrx::new(RemoteRef::new(identity.clone(), NodeKind::File), connection);
        match candidate.remote_kind().await? {
            NodeKind::File => Ok(Self { node: candidate }),
            NodeKind::Directory => Err(TransportError::NotAFile(identity)),
        }
    }

    pub fn as_node(&self) -> &NodePrx {
        &self.node
    }

    pub fn reference(&self) -> &RemoteRef {
        self.node.reference()
    }

    pub async fn name(&self) -> Result<String> {
        self.node.name().await
    }

    pub async fn read(&self) -> Result<Vec<String>> {
        match self.node.invoke(Operation::Read).await? {
            Reply::Read(text) => Ok(text),
            reply => Err(unexpected("read", reply)),
        }
    }

    /// Replaces the whole file content.
    pub async fn write(&self, text: Vec<String>) -> Result<()> {
        match self.node.invoke(Operation::Write(text)).await? {
            Reply::Unit => Ok(()),
            reply => Err(unexpected("write", reply)),
        }
    }

    /// Like [`write`](FilePrx::write), but does not wait for the server.
    pub async fn write_oneway(&self, text: Vec<String>) -> Result<()> {
        self.node.invoke_oneway(Operation::Write(text)).await
    }
}

fn unexpected(operation: &'static str, reply: Reply) -> TransportError {
    TransportError::UnexpectedReply { operation, reply }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::LocalConnection;
    use corelib::{build_poetry_tree, NodeRegistry, UuidAllocator};

    fn local() -> (Arc<NodeRegistry>, Arc<dyn Connection>) {
        let registry = Arc::new(NodeRegistry::new("local"));
        build_poetry_tree(&registry, &UuidAllocator).unwrap();
        let connection: Arc<dyn Connection> = Arc::new(LocalConnection::new(Arc::clone(&registry)));
        (registry, connection)
    }

    #[tokio::test]
    async fn test_checked_cast_root() {
        let (_registry, connection) = local();
        let root = DirectoryPrx::checked_cast(connection, Identity::root())
            .await
            .unwrap();
        assert_eq!(root.name().await.unwrap(), "/");

        let children = root.list().await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0].as_file().is_some());
        assert!(children[1].as_directory().is_some());
        assert!(children[0].as_directory().is_none());
    }

    #[tokio::test]
    async fn test_checked_cast_wrong_kind() {
        let (_registry, connection) = local();
        let err = FilePrx::checked_cast(connection, Identity::root())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotAFile(id) if id.is_root()));
    }

    #[tokio::test]
    async fn test_stale_proxy_reports_not_found() {
        let (_registry, connection) = local();
        let stale = NodePrx::new(
            RemoteRef::new(Identity::new("gone", ""), NodeKind::File),
            connection,
        );
        let err = stale.name().await.unwrap_err();
        assert!(err.is_not_found());
    }
}
