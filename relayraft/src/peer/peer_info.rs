use std::fmt;

use crate::NodeId;

/// A detached copy of a peer: its identity and matched index only.
///
/// It is what a leader persists or exports about its peers; it has no
/// heartbeat and no reference to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct PeerInfo {
    pub name: NodeId,
    pub connection_string: String,
    pub matched_index: u64,
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}(matched:{})",
            self.name, self.connection_string, self.matched_index
        )
    }
}
