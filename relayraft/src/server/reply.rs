use std::fmt;

use crate::rpc::AppendEntriesResponse;
use crate::rpc::SnapshotRecoveryResponse;
use crate::rpc::VoteReply;
use crate::NodeId;

/// A response received by a peer, tagged with the peer's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerReply {
    AppendEntries {
        target: NodeId,
        reply: AppendEntriesResponse,

        /// Set when the peer accepted entries whose last one was proposed in
        /// the leader's current term, i.e., the reply counts toward
        /// committing them.
        append: bool,
    },

    SnapshotRecovery {
        target: NodeId,
        reply: SnapshotRecoveryResponse,
    },
}

impl PeerReply {
    pub fn target(&self) -> &NodeId {
        match self {
            PeerReply::AppendEntries { target, .. } => target,
            PeerReply::SnapshotRecovery { target, .. } => target,
        }
    }
}

impl fmt::Display for PeerReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerReply::AppendEntries {
                target,
                reply,
                append,
            } => {
                write!(
                    f,
                    "AppendEntriesReply: from {}: {}, append:{}",
                    target, reply, append
                )
            }
            PeerReply::SnapshotRecovery { target, reply } => {
                write!(f, "SnapshotRecoveryReply: from {}: {}", target, reply)
            }
        }
    }
}

/// A vote reply tagged with the voter's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteResult {
    pub voter: NodeId,
    pub reply: VoteReply,
}

impl fmt::Display for VoteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoteResult: from {}: {}", self.voter, self.reply)
    }
}
