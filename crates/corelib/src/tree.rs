//! The demo poetry tree.
//!
//! ```text
//! /
//! ├── README
//! └── Coleridge/
//!     └── Kubla_Khan
//! ```
//!
//! Parents are always activated before their children, so each child can
//! append itself to a parent that is already reachable.

use crate::allocator::IdentityAllocator;
use crate::error::Result;
use crate::node::{Directory, File};
use crate::proxy::RemoteRef;
use crate::registry::NodeRegistry;
use std::sync::Arc;

pub const README_TEXT: &str = "This file system contains a collection of poetry.";

pub const KUBLA_KHAN: [&str; 5] = [
    "In Xanadu did Kubla Khan",
    "A stately pleasure-dome decree:",
    "Where Alph, the sacred river, ran",
    "Through caverns measureless to man",
    "Down to a sunless sea.",
];

/// Local handles and references of the nodes in the demo tree.
#[derive(Debug)]
pub struct PoetryTree {
    pub root: Arc<Directory>,
    pub root_ref: RemoteRef,
    pub readme: Arc<File>,
    pub readme_ref: RemoteRef,
    pub coleridge: Arc<Directory>,
    pub coleridge_ref: RemoteRef,
    pub kubla_khan: Arc<File>,
    pub kubla_khan_ref: RemoteRef,
}

/// Builds and activates the demo tree in `registry`.
pub fn build_poetry_tree(
    registry: &NodeRegistry,
    allocator: &dyn IdentityAllocator,
) -> Result<PoetryTree> {
    let root = Directory::new("/", None);
    let root_ref = root.activate(registry, allocator)?;

    let readme = File::new("README", Some(&root));
    readme.write(vec![README_TEXT.to_string()]);
    let readme_ref = readme.activate(registry, allocator)?;

    let coleridge = Directory::new("Coleridge", Some(&root));
    let coleridge_ref = coleridge.activate(registry, allocator)?;

    let kubla_khan = File::new("Kubla_Khan", Some(&coleridge));
    kubla_khan.write(KUBLA_KHAN.iter().map(|line| line.to_string()).collect());
    let kubla_khan_ref = kubla_khan.activate(registry, allocator)?;

    Ok(PoetryTree {
        root,
        root_ref,
        readme,
        readme_ref,
        coleridge,
        coleridge_ref,
        kubla_khan,
        kubla_khan_ref,
    })
}
