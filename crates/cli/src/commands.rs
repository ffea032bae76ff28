//! Subcommands and their output.

use anyhow::Context;
use clap::Subcommand;
use corelib::{build_poetry_tree, Identity, NodeKind, NodeRegistry, UuidAllocator};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use transport::{walk, Connection, DirectoryPrx, FilePrx, ObjectAdapter, TcpConnection, TreeEntry};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Host the demo poetry tree until Ctrl-C.
    Serve {
        /// Adapter name, used in logs.
        #[arg(long, default_value = "SimpleFilesystem")]
        adapter: String,
    },
    /// List the remote tree recursively, with file contents.
    Ls {
        /// Identity of the directory to start from.
        #[arg(long, default_value = "RootDir")]
        root: Identity,
        /// Show the identity of every node.
        #[arg(short, long)]
        long: bool,
    },
    /// Print a remote file.
    Cat { identity: Identity },
    /// Replace the content of a remote file, one argument per line.
    Write {
        identity: Identity,
        lines: Vec<String>,
    },
}

/// What a command produced, rendered on stdout.
#[derive(Debug)]
pub enum CommandResult {
    Served { adapter: String },
    Listing { entries: Vec<TreeEntry>, long: bool },
    Text(Vec<String>),
    Written { identity: Identity, lines: usize },
}

impl Command {
    pub async fn execute(self, endpoint: &str) -> anyhow::Result<CommandResult> {
        match self {
            Command::Serve { adapter } => serve(adapter, endpoint).await,
            Command::Ls { root, long } => {
                let root = DirectoryPrx::checked_cast(connect(endpoint).await?, root.clone())
                    .await
                    .with_context(|| format!("`{}` is not a reachable directory", root))?;
                let entries = walk(&root).await?;
                Ok(CommandResult::Listing { entries, long })
            }
            Command::Cat { identity } => {
                let file = FilePrx::checked_cast(connect(endpoint).await?, identity).await?;
                Ok(CommandResult::Text(file.read().await?))
            }
            Command::Write { identity, lines } => {
                let file = FilePrx::checked_cast(connect(endpoint).await?, identity.clone()).await?;
                let count = lines.len();
                file.write(lines).await?;
                Ok(CommandResult::Written {
                    identity,
                    lines: count,
                })
            }
        }
    }
}

async fn connect(endpoint: &str) -> anyhow::Result<Arc<dyn Connection>> {
    let connection = TcpConnection::connect(endpoint)
        .await
        .with_context(|| format!("cannot connect to {}", endpoint))?;
    Ok(Arc::new(connection))
}

async fn serve(adapter: String, endpoint: &str) -> anyhow::Result<CommandResult> {
    let registry = Arc::new(NodeRegistry::new(adapter.clone()));
    let host = ObjectAdapter::bind(adapter.clone(), endpoint, Arc::clone(&registry))
        .await
        .with_context(|| format!("cannot bind {}", endpoint))?;

    let tree = build_poetry_tree(&registry, &UuidAllocator)?;
    info!(root = %tree.root_ref, servants = registry.len(), "tree activated");

    host.run_until(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for Ctrl-C, shutting down");
        }
    })
    .await?;

    Ok(CommandResult::Served { adapter })
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Served { adapter } => writeln!(f, "{} stopped", adapter),
            CommandResult::Listing { entries, long } => {
                writeln!(f, "Contents of root directory:")?;
                for entry in entries {
                    let indent = "\t".repeat(entry.depth + 1);
                    let label = match (entry.stale, entry.kind) {
                        (true, _) => "missing",
                        (false, NodeKind::Directory) => "directory",
                        (false, NodeKind::File) => "file",
                    };
                    if *long && !entry.stale {
                        writeln!(f, "{}{} ({}) [{}]:", indent, entry.name, label, entry.identity)?;
                    } else {
                        writeln!(f, "{}{} ({}):", indent, entry.name, label)?;
                    }
                    for line in &entry.contents {
                        writeln!(f, "{}\t{}", indent, line)?;
                    }
                }
                Ok(())
            }
            CommandResult::Text(lines) => {
                for line in lines {
                    writeln!(f, "{}", line)?;
                }
                Ok(())
            }
            CommandResult::Written { identity, lines } => {
                writeln!(f, "wrote {} line(s) to {}", lines, identity)
            }
        }
    }
}
