//! Object adapter: serves a registry on a TCP endpoint.
//!
//! Bootstrap sequence on the hosting side:
//!
//! 1. Bind an adapter to an endpoint
//! 2. Activate the root directory (and the rest of the tree) against the
//!    adapter's registry, so the root answers to the well-known identity
//! 3. Run the adapter until the shutdown future resolves
//!
//! Every connection is served by its own task, and every request inside a
//! connection is dispatched on a task of its own. Replies are funneled
//! through a single writer per connection, so they may go out in a
//! different order than requests came in; clients match them by id. The
//! reply queue is bounded: when the peer stops reading, dispatch tasks wait
//! for room instead of piling up replies in memory.

use crate::codec::{read_frame, write_frame};
use crate::error::Result;
use crate::protocol::{Request, Response};
use corelib::NodeRegistry;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Replies a connection may hold for its writer before dispatch tasks wait.
pub const REPLY_QUEUE_DEPTH: usize = 64;

pub struct ObjectAdapter {
    name: String,
    listener: TcpListener,
    registry: Arc<NodeRegistry>,
}

impl ObjectAdapter {
    /// Binds a new adapter. Calls are not accepted until [`run_until`].
    ///
    /// [`run_until`]: ObjectAdapter::run_until
    pub async fn bind(
        name: impl Into<String>,
        endpoint: impl ToSocketAddrs,
        registry: Arc<NodeRegistry>,
    ) -> Result<Self> {
        let name = name.into();
        let listener = TcpListener::bind(endpoint).await?;
        info!(adapter = %name, addr = %listener.local_addr()?, "adapter bound");
        Ok(Self {
            name,
            listener,
            registry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Accepts and serves connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep being served by their tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(adapter = %self.name, servants = self.registry.len(), "adapter active");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(adapter = %self.name, "adapter shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(adapter = %self.name, %peer, "accepted connection");
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(async move {
                            if let Err(err) = serve_connection(stream, registry).await {
                                warn!(%peer, error = %err, "connection failed");
                            }
                        });
                    }
                    Err(err) => warn!(adapter = %self.name, error = %err, "accept failed"),
                },
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, registry: Arc<NodeRegistry>) -> Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let (replies, mut outgoing) = mpsc::channel::<Response>(REPLY_QUEUE_DEPTH);

    let writer_task = tokio::spawn(async move {
        while let Some(response) = outgoing.recv().await {
            write_frame(&mut writer, &response).await?;
        }
        Ok::<_, crate::error::TransportError>(())
    });

    while let Some(request) = read_frame::<_, Request>(&mut reader).await? {
        let registry = Arc::clone(&registry);
        let replies = replies.clone();
        tokio::spawn(async move {
            let Request {
                id,
                target,
                operation,
                oneway,
            } = request;
            trace!(id, target = %target, operation = operation.as_str(), oneway, "dispatching");

            let result = registry.dispatch(&target, operation);
            if let Err(err) = &result {
                debug!(id, target = %target, error = %err, "dispatch failed");
            }
            if !oneway {
                // The writer only goes away when the connection is gone.
                let _ = replies.send(Response { id, result }).await;
            }
        });
    }

    drop(replies);
    match writer_task.await {
        Ok(result) => result,
        Err(err) => Err(std::io::Error::new(std::io::ErrorKind::Other, err).into()),
    }
}
