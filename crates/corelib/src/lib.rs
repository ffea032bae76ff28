//! Core library for the remote object tree.
//!
//! This crate provides the hierarchical object model served over the network:
//! - Identities and identity allocation
//! - Remote references (proxies) that name objects without owning them
//! - File and directory servants and their activation
//! - The node registry that resolves identities and dispatches calls

pub mod allocator;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod node;
pub mod proxy;
pub mod registry;
pub mod tree;

pub use allocator::{IdentityAllocator, SequentialAllocator, UuidAllocator};
pub use dispatch::{Operation, Reply};
pub use error::{CoreError, DispatchError, RegistryError, Result};
pub use identity::Identity;
pub use node::{Directory, File, Lifecycle, Node, Servant};
pub use proxy::{NodeKind, RemoteRef};
pub use registry::NodeRegistry;
pub use tree::{build_poetry_tree, PoetryTree};
