//! Error types exposed by this crate.
//!
//! None of them is fatal: an [`RPCError`] is the "no response" outcome of a
//! transport call and is retried on a later heartbeat, while the other errors
//! report misuse of the peer life cycle by the owning server.

use std::error::Error;
use std::time::Duration;

use anyerror::AnyError;

use crate::NodeId;

/// Error returned by a [`Connection`](crate::network::Connection) when no
/// response was received.
///
/// A response that rejects the request is not an error; it is carried by the
/// `success` flag of the response itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, derive_more::TryInto)]
pub enum RPCError {
    #[error(transparent)]
    Unreachable(#[from] Unreachable),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Timeout(#[from] Timeout),
}

/// Error that indicates a node can not be reached, e.g. it is down or
/// partitioned from the leader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unreachable node: {source}")]
pub struct Unreachable {
    #[from]
    source: AnyError,
}

impl Unreachable {
    pub fn new<E: Error + 'static>(e: &E) -> Self {
        Self {
            source: AnyError::new(e),
        }
    }
}

/// Error that indicates a failure when delivering a request or decoding its
/// response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("NetworkError: {source}")]
pub struct NetworkError {
    #[from]
    source: AnyError,
}

impl NetworkError {
    pub fn new<E: Error + 'static>(e: &E) -> Self {
        Self {
            source: AnyError::new(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timeout after {timeout:?} when {action} to {target}")]
pub struct Timeout {
    pub action: String,
    pub target: NodeId,
    pub timeout: Duration,
}

/// Misuse of the heartbeat life cycle of a peer.
///
/// The heartbeat goes through `idle -> running -> stopped`, and a stopped
/// heartbeat can not be started again. A flush outside of the loop excludes
/// a running loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeartbeatError {
    #[error("heartbeat to {target} is already running")]
    AlreadyRunning { target: NodeId },

    #[error("heartbeat to {target} is not running")]
    NotRunning { target: NodeId },

    #[error("heartbeat to {target} has been stopped")]
    Stopped { target: NodeId },

    #[error("a flush to {target} is in progress")]
    Flushing { target: NodeId },

    #[error("heartbeat loop of {target} quit before it started")]
    Quit { target: NodeId },
}

/// Error returned by [`PeerSet`](crate::peer::PeerSet) when adding or
/// removing cluster members.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerSetError {
    #[error("peer {name} already exists")]
    PeerExists { name: NodeId },

    #[error("peer {name} not found")]
    PeerNotFound { name: NodeId },

    #[error(transparent)]
    Heartbeat(#[from] HeartbeatError),
}
