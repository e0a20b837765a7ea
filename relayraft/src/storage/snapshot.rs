use std::fmt;

use crate::peer::PeerInfo;
use crate::storage::log::log_id::LogId;

/// Describes a snapshot without its data.
///
/// This is what a peer is offered before the snapshot data is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct SnapshotMeta {
    /// The last log entry included in the snapshot.
    pub last_log_id: LogId,

    /// The cluster members at the time the snapshot was taken.
    pub peers: Vec<PeerInfo>,
}

impl fmt::Display for SnapshotMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{last_log:{}, peers:[", self.last_log_id)?;
        for (i, p) in self.peers.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", p.name)?;
        }
        write!(f, "]}}")
    }
}

/// A compacted state of the log up to and including `meta.last_log_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Snapshot {
    pub meta: SnapshotMeta,

    /// The serialized state machine.
    pub data: Vec<u8>,
}

impl Snapshot {
    pub fn new(meta: SnapshotMeta, data: Vec<u8>) -> Self {
        Self { meta, data }
    }

    /// The index of the last entry included in this snapshot.
    pub fn last_index(&self) -> u64 {
        self.meta.last_log_id.index
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{meta:{}, data:{} bytes}}", self.meta, self.data.len())
    }
}
