//! Client-side connections.
//!
//! A [`Connection`] delivers an operation to the object named by an identity
//! and brings back the reply. Proxies are written against this trait, so the
//! same client code runs over TCP or directly against an in-process registry.

use crate::codec::{encode, read_frame};
use crate::error::{Result, TransportError};
use crate::protocol::{Request, Response};
use async_trait::async_trait;
use bytes::Bytes;
use corelib::{Identity, NodeRegistry, Operation, Reply};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

#[async_trait]
pub trait Connection: Send + Sync {
    /// Two-way call: waits for the reply or the dispatch failure.
    async fn invoke(&self, target: &Identity, operation: Operation) -> Result<Reply>;

    /// Fire-and-forget call: returns once the request is handed off, without
    /// waiting for the server to run it.
    async fn invoke_oneway(&self, target: &Identity, operation: Operation) -> Result<()>;
}

/// Calls straight into a registry in the same process.
#[derive(Debug, Clone)]
pub struct LocalConnection {
    registry: Arc<NodeRegistry>,
}

impl LocalConnection {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Connection for LocalConnection {
    async fn invoke(&self, target: &Identity, operation: Operation) -> Result<Reply> {
        Ok(self.registry.dispatch(target, operation)?)
    }

    async fn invoke_oneway(&self, target: &Identity, operation: Operation) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let target = target.clone();
        tokio::spawn(async move {
            if let Err(err) = registry.dispatch(&target, operation) {
                warn!(target = %target, error = %err, "oneway call failed");
            }
        });
        Ok(())
    }
}

/// How many encoded requests may wait for the writer task before callers
/// are held back.
const OUTGOING_QUEUE_DEPTH: usize = 256;

type PendingCalls = DashMap<u64, oneshot::Sender<Response>>;

/// A single TCP connection to an [`ObjectAdapter`].
///
/// Requests are queued to a writer task and replies are read by a reader
/// task that hands each one to the caller waiting on its id. Many calls can
/// be in flight at once. A caller that gives up (its future is dropped)
/// leaves the stream framing intact; the late reply is discarded.
///
/// [`ObjectAdapter`]: crate::adapter::ObjectAdapter
#[derive(Debug)]
pub struct TcpConnection {
    outgoing: mpsc::Sender<Bytes>,
    pending: Arc<PendingCalls>,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl TcpConnection {
    pub async fn connect(endpoint: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(endpoint).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        debug!(%peer, "connected");

        let (read_half, write_half) = stream.into_split();
        let (outgoing, frames) = mpsc::channel(OUTGOING_QUEUE_DEPTH);
        let pending = Arc::new(PendingCalls::new());
        let closed = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(read_replies(
            read_half,
            Arc::clone(&pending),
            Arc::clone(&closed),
            peer,
        ));
        let writer = tokio::spawn(write_requests(
            write_half,
            frames,
            Arc::clone(&pending),
            Arc::clone(&closed),
            peer,
        ));

        Ok(Self {
            outgoing,
            pending,
            closed,
            next_id: AtomicU64::new(1),
            reader,
            writer,
        })
    }

    /// Number of two-way calls still waiting for their reply.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn request(&self, target: &Identity, operation: Operation, oneway: bool) -> Request {
        Request {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            target: target.clone(),
            operation,
            oneway,
        }
    }

    async fn send(&self, frame: Bytes) -> Result<()> {
        self.outgoing
            .send(frame)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Removes a waiting call from the table when the caller stops waiting,
/// whether it got its reply, failed, or was cancelled.
struct PendingCall<'a> {
    pending: &'a PendingCalls,
    id: u64,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn invoke(&self, target: &Identity, operation: Operation) -> Result<Reply> {
        let request = self.request(target, operation, false);
        let frame = encode(&request)?;

        let (waiter, reply) = oneshot::channel();
        self.pending.insert(request.id, waiter);
        let _call = PendingCall {
            pending: &self.pending,
            id: request.id,
        };
        // Checked after the insert: either the final sweep in `fail_pending`
        // sees this entry or this load sees the flag.
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        self.send(frame).await?;
        let response = reply.await.map_err(|_| TransportError::ConnectionClosed)?;
        Ok(response.result?)
    }

    async fn invoke_oneway(&self, target: &Identity, operation: Operation) -> Result<()> {
        let request = self.request(target, operation, true);
        self.send(encode(&request)?).await
    }
}

async fn write_requests(
    mut writer: OwnedWriteHalf,
    mut frames: mpsc::Receiver<Bytes>,
    pending: Arc<PendingCalls>,
    closed: Arc<AtomicBool>,
    peer: SocketAddr,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(err) = writer.write_all(&frame).await {
            warn!(%peer, error = %err, "request stream failed");
            fail_pending(&pending, &closed);
            return;
        }
    }
}

async fn read_replies(
    mut reader: OwnedReadHalf,
    pending: Arc<PendingCalls>,
    closed: Arc<AtomicBool>,
    peer: SocketAddr,
) {
    loop {
        match read_frame::<_, Response>(&mut reader).await {
            Ok(Some(response)) => match pending.remove(&response.id) {
                Some((_, waiter)) => {
                    let _ = waiter.send(response);
                }
                None => trace!(%peer, id = response.id, "discarding reply to abandoned call"),
            },
            Ok(None) => {
                debug!(%peer, "connection closed by server");
                break;
            }
            Err(err) => {
                warn!(%peer, error = %err, "reply stream failed");
                break;
            }
        }
    }

    fail_pending(&pending, &closed);
}

/// Marks the connection closed, then drops every waiting sender so each
/// caller wakes with `ConnectionClosed`.
fn fail_pending(pending: &PendingCalls, closed: &AtomicBool) {
    closed.store(true, Ordering::SeqCst);
    pending.clear();
}
