use std::fmt;
use std::fmt::Debug;

use crate::base::display_ext::DisplaySliceExt;
use crate::storage::log::entry::Entry;
use crate::storage::log::log_id::LogId;
use crate::NodeId;
use crate::TypeConfig;

/// Replicate entries to a peer, or just assert leadership if `entries` is
/// empty.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(bound = "")]
pub struct AppendEntriesRequest<C>
where C: TypeConfig
{
    pub term: u64,

    /// The index of the entry immediately preceding `entries`, i.e., the
    /// matched index of the peer when this request is built.
    pub prev_log_index: u64,

    /// The term of the entry at `prev_log_index`.
    pub prev_log_term: u64,

    pub leader_commit: u64,

    pub leader_id: NodeId,

    pub entries: Vec<Entry<C>>,
}

impl<C> AppendEntriesRequest<C>
where C: TypeConfig
{
    pub fn new(
        term: u64,
        prev_log_index: u64,
        prev_log_term: u64,
        leader_commit: u64,
        leader_id: NodeId,
        entries: Vec<Entry<C>>,
    ) -> Self {
        Self {
            term,
            prev_log_index,
            prev_log_term,
            leader_commit,
            leader_id,
            entries,
        }
    }

    /// The log id of the last entry carried by this request.
    pub fn last_log_id(&self) -> Option<LogId> {
        self.entries.last().map(|e| e.log_id)
    }
}

impl<C> Clone for AppendEntriesRequest<C>
where C: TypeConfig
{
    fn clone(&self) -> Self {
        Self {
            term: self.term,
            prev_log_index: self.prev_log_index,
            prev_log_term: self.prev_log_term,
            leader_commit: self.leader_commit,
            leader_id: self.leader_id.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<C> Debug for AppendEntriesRequest<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppendEntriesRequest")
            .field("term", &self.term)
            .field("prev_log_index", &self.prev_log_index)
            .field("prev_log_term", &self.prev_log_term)
            .field("leader_commit", &self.leader_commit)
            .field("leader_id", &self.leader_id)
            .field("entries", &self.entries)
            .finish()
    }
}

impl<C> PartialEq for AppendEntriesRequest<C>
where C: TypeConfig
{
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
            && self.prev_log_index == other.prev_log_index
            && self.prev_log_term == other.prev_log_term
            && self.leader_commit == other.leader_commit
            && self.leader_id == other.leader_id
            && self.entries == other.entries
    }
}

impl<C> fmt::Display for AppendEntriesRequest<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = self.entries.iter().map(|e| e.log_id).collect::<Vec<_>>();
        write!(
            f,
            "{{term:{}, leader:{}, prev:{}.{}, commit:{}, entries:{}}}",
            self.term,
            self.leader_id,
            self.prev_log_term,
            self.prev_log_index,
            self.leader_commit,
            ids.display()
        )
    }
}

/// The response to an [`AppendEntriesRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct AppendEntriesResponse {
    /// The current term of the peer.
    pub term: u64,

    /// Whether the peer accepted the entries.
    pub success: bool,

    /// The commit index of the peer.
    pub commit_index: u64,

    /// The last index of the peer's log after handling the request.
    ///
    /// On rejection, the leader never retries from an index beyond it.
    pub conflict_index: u64,
}

impl AppendEntriesResponse {
    pub fn new(
        term: u64,
        success: bool,
        commit_index: u64,
        conflict_index: u64,
    ) -> Self {
        Self {
            term,
            success,
            commit_index,
            conflict_index,
        }
    }
}

impl fmt::Display for AppendEntriesResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, success:{}, commit:{}, conflict:{}}}",
            self.term, self.success, self.commit_index, self.conflict_index
        )
    }
}
