//! CLI tool for hosting and browsing a remote object tree.
//!
//! Provides commands for:
//! - Serving the demo poetry tree on an endpoint
//! - Listing a remote tree recursively from its root
//! - Reading and replacing remote file contents

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
