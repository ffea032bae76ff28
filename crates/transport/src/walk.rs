//! Recursive listing of a remote tree.

use crate::error::Result;
use crate::proxy::{DirectoryPrx, NodePrx};
use corelib::{Identity, NodeKind};
use tracing::warn;

/// One node met during a walk, in depth-first pre-order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// 0 for direct children of the starting directory.
    pub depth: usize,
    pub identity: Identity,
    /// The node's name, or its identity when the node could not be reached.
    pub name: String,
    pub kind: NodeKind,
    /// File lines; empty for directories.
    pub contents: Vec<String>,
    /// The listing held a reference to an object that no longer exists.
    pub stale: bool,
}

/// Walks everything below `root`, reading every file on the way.
///
/// Stale child references are reported as entries with `stale` set rather
/// than failing the walk; any other error aborts it.
pub async fn walk(root: &DirectoryPrx) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut pending: Vec<(usize, NodePrx)> = children_of(root, 0).await?;

    while let Some((depth, node)) = pending.pop() {
        let name = match node.name().await {
            Ok(name) => name,
            Err(err) if err.is_not_found() => {
                warn!(reference = %node.reference(), "skipping stale reference");
                entries.push(TreeEntry {
                    depth,
                    identity: node.identity().clone(),
                    name: node.identity().to_string(),
                    kind: node.kind(),
                    contents: Vec::new(),
                    stale: true,
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        let mut contents = Vec::new();
        if let Some(dir) = node.as_directory() {
            pending.extend(children_of(&dir, depth + 1).await?);
        } else if let Some(file) = node.as_file() {
            contents = file.read().await?;
        }

        entries.push(TreeEntry {
            depth,
            identity: node.identity().clone(),
            name,
            kind: node.kind(),
            contents,
            stale: false,
        });
    }

    Ok(entries)
}

/// Children of `dir`, reversed so popping yields them in listing order.
async fn children_of(dir: &DirectoryPrx, depth: usize) -> Result<Vec<(usize, NodePrx)>> {
    Ok(dir
        .list()
        .await?
        .into_iter()
        .rev()
        .map(|child| (depth, child))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, LocalConnection};
    use corelib::{build_poetry_tree, NodeRegistry, RemoteRef, UuidAllocator};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_walk_poetry_tree() {
        let registry = Arc::new(NodeRegistry::new("local"));
        build_poetry_tree(&registry, &UuidAllocator).unwrap();
        let connection: Arc<dyn Connection> = Arc::new(LocalConnection::new(registry));
        let root = DirectoryPrx::checked_cast(connection, Identity::root())
            .await
            .unwrap();

        let entries = walk(&root).await.unwrap();
        let outline: Vec<(usize, &str, NodeKind)> = entries
            .iter()
            .map(|e| (e.depth, e.name.as_str(), e.kind))
            .collect();
        assert_eq!(
            outline,
            vec![
                (0, "README", NodeKind::File),
                (0, "Coleridge", NodeKind::Directory),
                (1, "Kubla_Khan", NodeKind::File),
            ]
        );
        assert_eq!(entries[2].contents.len(), 5);
        assert!(entries.iter().all(|e| !e.stale));
    }

    #[tokio::test]
    async fn test_walk_reports_stale_reference() {
        let registry = Arc::new(NodeRegistry::new("local"));
        let tree = build_poetry_tree(&registry, &UuidAllocator).unwrap();
        tree.root
            .add_child(RemoteRef::new(Identity::new("vanished", ""), NodeKind::File));

        let connection: Arc<dyn Connection> = Arc::new(LocalConnection::new(registry));
        let root = DirectoryPrx::checked_cast(connection, Identity::root())
            .await
            .unwrap();

        let entries = walk(&root).await.unwrap();
        let last = entries.last().unwrap();
        assert!(last.stale);
        assert_eq!(last.name, "vanished");
        assert_eq!(entries.len(), 4);
    }
}
