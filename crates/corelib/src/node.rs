//! Node servants: files, directories and their activation.
//!
//! A node is constructed locally, then *activated*: registered with a
//! [`NodeRegistry`] (which makes it remotely reachable) and linked into its
//! parent's child list (which makes it discoverable through listings).
//!
//! # Activation
//!
//! 1. Pick the identity: the fixed root identity for a parentless node,
//!    otherwise a fresh one from the [`IdentityAllocator`]. Only a directory
//!    may be a root, and a child waits until its parent is activated.
//! 2. Register the servant, obtaining its [`RemoteRef`]
//! 3. Append that reference to the parent's children
//!
//! A failed registration returns before the parent is touched, so a node is
//! never half-linked. Between steps 2 and 3 the new reference is already
//! invocable while a concurrent `list()` on the parent may not show it yet;
//! listings are allowed to lag registration by that window.
//!
//! # Ownership
//!
//! The registry owns servants. A directory owns only references to its
//! children, never the children themselves. A child keeps a `Weak` handle to
//! its parent for the single append it performs on activation.

use crate::allocator::IdentityAllocator;
use crate::error::{CoreError, RegistryError, Result};
use crate::identity::Identity;
use crate::proxy::{NodeKind, RemoteRef};
use crate::registry::NodeRegistry;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Activation state of a node. `Activated` is terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    Activated(RemoteRef),
}

/// Behavior shared by every node variant.
pub trait Node: Send + Sync {
    /// Name given at construction; never changes.
    fn name(&self) -> &str;

    fn kind(&self) -> NodeKind;

    /// The parent directory, if this node has one and it is still alive.
    fn parent(&self) -> Option<Arc<Directory>>;

    fn lifecycle(&self) -> Lifecycle;

    fn is_activated(&self) -> bool {
        matches!(self.lifecycle(), Lifecycle::Activated(_))
    }

    /// Reference minted on activation, `None` while still constructed.
    fn remote_ref(&self) -> Option<RemoteRef> {
        match self.lifecycle() {
            Lifecycle::Activated(reference) => Some(reference),
            Lifecycle::Constructed => None,
        }
    }
}

/// State common to files and directories.
struct NodeCore {
    name: String,
    parent: Option<Weak<Directory>>,
    state: Mutex<Lifecycle>,
}

impl NodeCore {
    fn new(name: impl Into<String>, parent: Option<&Arc<Directory>>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(Arc::downgrade),
            state: Mutex::new(Lifecycle::Constructed),
        }
    }

    fn parent(&self) -> Option<Arc<Directory>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Runs the activation steps for `servant`, which must wrap this core.
    ///
    /// The state lock is held throughout, so two racing activations of the
    /// same node register it exactly once.
    fn activate(
        &self,
        servant: Servant,
        registry: &NodeRegistry,
        allocator: &dyn IdentityAllocator,
    ) -> Result<RemoteRef> {
        let mut state = self.state.lock();
        if let Lifecycle::Activated(reference) = &*state {
            return Err(CoreError::AlreadyActivated(reference.identity.clone()));
        }

        let parent = match &self.parent {
            Some(weak) => Some(
                weak.upgrade()
                    .ok_or_else(|| CoreError::ParentUnavailable(self.name.clone()))?,
            ),
            None => None,
        };

        // Lock order is child then parent; parents never lock their children.
        let identity = match &parent {
            Some(parent) if !parent.is_activated() => {
                return Err(CoreError::ParentNotActivated(self.name.clone()));
            }
            Some(_) => allocator.new_identity(),
            None if servant.kind() != NodeKind::Directory => {
                return Err(CoreError::RootNotDirectory(self.name.clone()));
            }
            None => Identity::root(),
        };

        let reference = match servant.register_self(registry, identity) {
            Ok(reference) => reference,
            Err(RegistryError::DuplicateIdentity(identity)) => {
                return Err(CoreError::AlreadyActivated(identity));
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(parent) = parent {
            parent.add_child(reference.clone());
        }

        debug!(name = %self.name, reference = %reference, "activated node");
        *state = Lifecycle::Activated(reference.clone());
        Ok(reference)
    }
}

impl fmt::Debug for NodeCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCore")
            .field("name", &self.name)
            .field("has_parent", &self.parent.is_some())
            .field("state", &*self.state.lock())
            .finish()
    }
}

/// A file: an ordered sequence of lines, replaced wholesale on write.
#[derive(Debug)]
pub struct File {
    core: NodeCore,
    lines: RwLock<Vec<String>>,
}

impl File {
    pub fn new(name: impl Into<String>, parent: Option<&Arc<Directory>>) -> Arc<Self> {
        Arc::new(Self {
            core: NodeCore::new(name, parent),
            lines: RwLock::new(Vec::new()),
        })
    }

    /// Snapshot of the current content.
    pub fn read(&self) -> Vec<String> {
        self.lines.read().clone()
    }

    /// Replaces the whole content. Concurrent writers: last one wins.
    pub fn write(&self, text: Vec<String>) {
        *self.lines.write() = text;
    }

    pub fn activate(
        self: &Arc<Self>,
        registry: &NodeRegistry,
        allocator: &dyn IdentityAllocator,
    ) -> Result<RemoteRef> {
        self.core
            .activate(Servant::File(Arc::clone(self)), registry, allocator)
    }
}

impl Node for File {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    fn parent(&self) -> Option<Arc<Directory>> {
        self.core.parent()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.core.state.lock().clone()
    }
}

/// A directory: an append-only list of child references in activation order.
#[derive(Debug)]
pub struct Directory {
    core: NodeCore,
    children: RwLock<Vec<RemoteRef>>,
}

impl Directory {
    pub fn new(name: impl Into<String>, parent: Option<&Arc<Directory>>) -> Arc<Self> {
        Arc::new(Self {
            core: NodeCore::new(name, parent),
            children: RwLock::new(Vec::new()),
        })
    }

    /// Current children, verbatim. References may be stale; callers find
    /// out when they use them.
    pub fn list(&self) -> Vec<RemoteRef> {
        self.children.read().clone()
    }

    /// Appends a child reference. Writers are serialized, so concurrent
    /// appends never lose an entry.
    pub fn add_child(&self, child: RemoteRef) {
        self.children.write().push(child);
    }

    pub fn activate(
        self: &Arc<Self>,
        registry: &NodeRegistry,
        allocator: &dyn IdentityAllocator,
    ) -> Result<RemoteRef> {
        self.core
            .activate(Servant::Directory(Arc::clone(self)), registry, allocator)
    }
}

impl Node for Directory {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Directory
    }

    fn parent(&self) -> Option<Arc<Directory>> {
        self.core.parent()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.core.state.lock().clone()
    }
}

/// A registered object: the tagged union of node variants.
#[derive(Clone, Debug)]
pub enum Servant {
    File(Arc<File>),
    Directory(Arc<Directory>),
}

impl Servant {
    pub fn name(&self) -> &str {
        self.as_node().name()
    }

    pub fn kind(&self) -> NodeKind {
        self.as_node().kind()
    }

    pub fn as_node(&self) -> &dyn Node {
        match self {
            Servant::File(file) => file.as_ref(),
            Servant::Directory(dir) => dir.as_ref(),
        }
    }

    pub fn as_file(&self) -> Option<&Arc<File>> {
        match self {
            Servant::File(file) => Some(file),
            Servant::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Arc<Directory>> {
        match self {
            Servant::Directory(dir) => Some(dir),
            Servant::File(_) => None,
        }
    }

    /// Registers this servant under `identity`; the minted reference carries
    /// the variant's kind.
    pub fn register_self(
        &self,
        registry: &NodeRegistry,
        identity: Identity,
    ) -> std::result::Result<RemoteRef, RegistryError> {
        registry.register(identity, self.clone())
    }

    /// Activates whichever node this servant wraps.
    pub fn activate(
        &self,
        registry: &NodeRegistry,
        allocator: &dyn IdentityAllocator,
    ) -> Result<RemoteRef> {
        match self {
            Servant::File(file) => file.activate(registry, allocator),
            Servant::Directory(dir) => dir.activate(registry, allocator),
        }
    }
}

impl From<Arc<File>> for Servant {
    fn from(file: Arc<File>) -> Self {
        Servant::File(file)
    }
}

impl From<Arc<Directory>> for Servant {
    fn from(dir: Arc<Directory>) -> Self {
        Servant::Directory(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SequentialAllocator;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_gets_root_identity() {
        let registry = NodeRegistry::new("test");
        let root = Directory::new("/", None);
        let reference = root.activate(&registry, &SequentialAllocator::default()).unwrap();

        assert_eq!(reference.identity, Identity::root());
        assert_eq!(reference.kind, NodeKind::Directory);
        assert_eq!(root.remote_ref(), Some(reference));
    }

    #[test]
    fn test_child_linked_into_parent() {
        let registry = NodeRegistry::new("test");
        let allocator = SequentialAllocator::default();
        let root = Directory::new("/", None);
        root.activate(&registry, &allocator).unwrap();

        let file = File::new("README", Some(&root));
        assert!(!file.is_activated());
        assert!(root.list().is_empty());

        let reference = file.activate(&registry, &allocator).unwrap();
        assert_eq!(root.list(), vec![reference.clone()]);
        assert!(!reference.identity.is_root());
        assert_eq!(reference.kind, NodeKind::File);
        assert!(Arc::ptr_eq(&file.parent().unwrap(), &root));
    }

    #[test]
    fn test_second_activation_fails() {
        let registry = NodeRegistry::new("test");
        let allocator = SequentialAllocator::default();
        let root = Directory::new("/", None);
        let first = root.activate(&registry, &allocator).unwrap();

        let err = root.activate(&registry, &allocator).unwrap_err();
        assert_eq!(err, CoreError::AlreadyActivated(Identity::root()));
        assert!(registry.resolve_ref(&first).is_ok());

        let file = File::new("a", Some(&root));
        file.activate(&registry, &allocator).unwrap();
        assert!(matches!(
            file.activate(&registry, &allocator),
            Err(CoreError::AlreadyActivated(_))
        ));
        assert_eq!(root.list().len(), 1, "no duplicate link on re-activation");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_second_root_in_same_registry_fails() {
        let registry = NodeRegistry::new("test");
        let allocator = SequentialAllocator::default();
        Directory::new("/", None)
            .activate(&registry, &allocator)
            .unwrap();

        let other = Directory::new("/", None);
        assert_eq!(
            other.activate(&registry, &allocator),
            Err(CoreError::AlreadyActivated(Identity::root()))
        );
        assert!(!other.is_activated());
    }

    #[test]
    fn test_dropped_parent_fails_before_registration() {
        let registry = NodeRegistry::new("test");
        let parent = Directory::new("tmp", None);
        let file = File::new("orphan", Some(&parent));
        drop(parent);

        let err = file
            .activate(&registry, &SequentialAllocator::default())
            .unwrap_err();
        assert_eq!(err, CoreError::ParentUnavailable("orphan".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parentless_file_cannot_become_root() {
        let registry = NodeRegistry::new("test");
        let allocator = SequentialAllocator::default();
        let file = File::new("README", None);

        let err = file.activate(&registry, &allocator).unwrap_err();
        assert_eq!(err, CoreError::RootNotDirectory("README".to_string()));
        assert!(registry.is_empty());
        assert!(!file.is_activated());

        // The root identity is still free for a directory.
        let root = Directory::new("/", None);
        let reference = root.activate(&registry, &allocator).unwrap();
        assert_eq!(reference.identity, Identity::root());
        assert!(registry.resolve(&Identity::root()).unwrap().as_directory().is_some());
    }

    #[test]
    fn test_child_of_unactivated_parent_fails_before_registration() {
        let registry = NodeRegistry::new("test");
        let allocator = SequentialAllocator::default();
        let root = Directory::new("/", None);
        let file = File::new("early", Some(&root));

        let err = file.activate(&registry, &allocator).unwrap_err();
        assert_eq!(err, CoreError::ParentNotActivated("early".to_string()));
        assert!(registry.is_empty());
        assert!(root.list().is_empty());

        // Once the parent is activated the same child goes through.
        root.activate(&registry, &allocator).unwrap();
        let reference = file.activate(&registry, &allocator).unwrap();
        assert_eq!(root.list(), vec![reference]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_file_write_replaces() {
        let file = File::new("f", None);
        assert!(file.read().is_empty());
        file.write(lines(&["a", "b"]));
        file.write(lines(&["c"]));
        assert_eq!(file.read(), lines(&["c"]));
        file.write(Vec::new());
        assert!(file.read().is_empty());
    }

    #[test]
    fn test_servant_polymorphic_activation() {
        let registry = NodeRegistry::new("test");
        let allocator = SequentialAllocator::default();
        let root = Directory::new("/", None);
        let servants: Vec<Servant> = vec![
            root.clone().into(),
            File::new("f", Some(&root)).into(),
            Directory::new("d", Some(&root)).into(),
        ];

        let kinds: Vec<NodeKind> = servants
            .iter()
            .map(|s| s.activate(&registry, &allocator).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Directory, NodeKind::File, NodeKind::Directory]
        );
        assert_eq!(servants[1].name(), "f");
        assert_eq!(root.list().len(), 2);
    }
}
