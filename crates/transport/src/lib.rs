//! Network hosting and client access for the object tree.
//!
//! This crate carries calls between clients and a [`NodeRegistry`]:
//! - Request/response messages and their length-prefixed codec
//! - The object adapter that accepts connections and dispatches calls
//! - Connections (TCP and in-process) and typed proxies over them
//! - A recursive walk of the tree from the root directory
//!
//! [`NodeRegistry`]: corelib::NodeRegistry

pub mod adapter;
pub mod codec;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod proxy;
pub mod walk;

pub use adapter::ObjectAdapter;
pub use connection::{Connection, LocalConnection, TcpConnection};
pub use error::{Result, TransportError};
pub use protocol::{Request, Response};
pub use proxy::{DirectoryPrx, FilePrx, NodePrx};
pub use walk::{walk, TreeEntry};
