//! Wire messages.
//!
//! A client sends one [`Request`] per call. Two-way requests are answered by
//! a [`Response`] carrying the same `id`; oneway requests get no answer at
//! all, so the caller learns nothing about their outcome.

use corelib::{DispatchError, Identity, Operation, Reply};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub target: Identity,
    pub operation: Operation,
    pub oneway: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub result: Result<Reply, DispatchError>,
}
