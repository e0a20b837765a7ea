//! Requests and responses exchanged between a leader and its peers.

mod append_entries;
mod request_vote;
mod snapshot;


pub use append_entries::AppendEntriesRequest;
pub use append_entries::AppendEntriesResponse;
pub use request_vote::RequestVote;
pub use request_vote::VoteReply;
pub use snapshot::SnapshotRecoveryRequest;
pub use snapshot::SnapshotRecoveryResponse;
pub use snapshot::SnapshotRequest;
pub use snapshot::SnapshotResponse;
