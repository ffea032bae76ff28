//! Transport error types.

use corelib::{DispatchError, Identity, Reply};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),

    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The remote side could not dispatch the call.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("unexpected reply to `{operation}`: {reply:?}")]
    UnexpectedReply {
        operation: &'static str,
        reply: Reply,
    },

    #[error("`{0}` is not a directory")]
    NotADirectory(Identity),

    #[error("`{0}` is not a file")]
    NotAFile(Identity),
}

impl TransportError {
    /// True when the target object does not exist, e.g. a stale reference.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Dispatch(DispatchError::NotFound(_)))
    }
}
