use std::fmt;

use crate::storage::Snapshot;
use crate::storage::SnapshotMeta;
use crate::NodeId;

/// Offer a snapshot to a peer whose missing entries have been compacted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct SnapshotRequest {
    pub leader_id: NodeId,
    pub meta: SnapshotMeta,
}

impl fmt::Display for SnapshotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{leader:{}, meta:{}}}", self.leader_id, self.meta)
    }
}

/// Whether a peer accepts a snapshot offer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct SnapshotResponse {
    pub success: bool,
}

impl fmt::Display for SnapshotResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{success:{}}}", self.success)
    }
}

/// Deliver the snapshot data after the peer accepted the offer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct SnapshotRecoveryRequest {
    pub leader_id: NodeId,
    pub snapshot: Snapshot,
}

impl SnapshotRecoveryRequest {
    /// The index of the last entry included in the snapshot being sent.
    pub fn last_index(&self) -> u64 {
        self.snapshot.last_index()
    }
}

impl fmt::Display for SnapshotRecoveryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{leader:{}, snapshot:{}}}", self.leader_id, self.snapshot)
    }
}

/// The response to a [`SnapshotRecoveryRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct SnapshotRecoveryResponse {
    pub term: u64,
    pub success: bool,
    pub commit_index: u64,
}

impl fmt::Display for SnapshotRecoveryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, success:{}, commit:{}}}",
            self.term, self.success, self.commit_index
        )
    }
}
