use std::collections::BTreeMap;

use relayraft::rpc::AppendEntriesRequest;
use relayraft::rpc::AppendEntriesResponse;
use relayraft::rpc::RequestVote;
use relayraft::rpc::SnapshotRecoveryRequest;
use relayraft::rpc::SnapshotRecoveryResponse;
use relayraft::rpc::SnapshotRequest;
use relayraft::rpc::SnapshotResponse;
use relayraft::rpc::VoteReply;
use relayraft::storage::log::entry::Entry;
use relayraft::storage::log::log_id::LogId;
use relayraft::storage::Snapshot;
use relayraft::storage::SnapshotMeta;
use relayraft::NodeId;
use relayraft::TypeConfig;
use tracing::debug;

/// A simulated follower: the receiving side of every request a peer sends.
///
/// It keeps a log, a term and a vote, and applies the follower rules of log
/// replication to them. There is no state machine: an installed snapshot just
/// replaces the log head.
pub struct Follower<C>
where C: TypeConfig
{
    id: NodeId,
    term: u64,
    voted_for: Option<NodeId>,

    /// Entries after the snapshot.
    entries: BTreeMap<u64, Entry<C>>,
    commit_index: u64,

    snapshot: Option<Snapshot>,

    /// The snapshot accepted by an offer, waiting for its data.
    offered: Option<SnapshotMeta>,
    reject_snapshot: bool,
}

impl<C> Follower<C>
where C: TypeConfig
{
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            term: 0,
            voted_for: None,
            entries: BTreeMap::new(),
            commit_index: 0,
            snapshot: None,
            offered: None,
            reject_snapshot: false,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn term(&self) -> u64 {
        self.term
    }

    pub fn set_term(&mut self, term: u64) {
        self.term = term;
    }

    pub fn voted_for(&self) -> Option<&NodeId> {
        self.voted_for.as_ref()
    }

    pub fn commit_index(&self) -> u64 {
        self.commit_index
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Make this follower reject every snapshot offer.
    pub fn set_reject_snapshot(&mut self, reject: bool) {
        self.reject_snapshot = reject;
    }

    /// The log id of the last entry included in the snapshot.
    pub fn snapshot_last(&self) -> LogId {
        self.snapshot
            .as_ref()
            .map(|s| s.meta.last_log_id)
            .unwrap_or_default()
    }

    pub fn last_log_id(&self) -> LogId {
        self.entries
            .values()
            .next_back()
            .map(|e| e.log_id)
            .unwrap_or_else(|| self.snapshot_last())
    }

    /// Log ids of the entries after the snapshot.
    pub fn log_ids(&self) -> Vec<LogId> {
        self.entries.values().map(|e| e.log_id).collect()
    }

    pub fn entries(&self) -> Vec<Entry<C>> {
        self.entries.values().cloned().collect()
    }

    /// Append an entry directly, e.g., to build a log diverging from the
    /// leader's. Entries at or after its index are replaced.
    pub fn append(&mut self, entry: Entry<C>) {
        let index = entry.index();
        self.entries.retain(|i, _| *i < index);
        self.entries.insert(index, entry);
    }

    fn term_at(&self, index: u64) -> Option<u64> {
        let snap = self.snapshot_last();
        if index == snap.index {
            return Some(snap.term);
        }
        self.entries.get(&index).map(|e| e.term())
    }

    fn reply(&self, success: bool) -> AppendEntriesResponse {
        AppendEntriesResponse::new(
            self.term,
            success,
            self.commit_index,
            self.last_log_id().index,
        )
    }

    fn see_term(&mut self, term: u64) {
        if term > self.term {
            self.term = term;
            self.voted_for = None;
        }
    }

    pub fn handle_append_entries(
        &mut self,
        req: AppendEntriesRequest<C>,
    ) -> AppendEntriesResponse {
        if req.term < self.term {
            debug!("{}: append-entries from stale term {}", self.id, req.term);
            return self.reply(false);
        }
        self.see_term(req.term);

        if self.term_at(req.prev_log_index) != Some(req.prev_log_term) {
            debug!(
                "{}: prev log {}.{} does not match, last: {}",
                self.id,
                req.prev_log_term,
                req.prev_log_index,
                self.last_log_id()
            );
            return self.reply(false);
        }

        let snapshot_last = self.snapshot_last().index;

        let mut last_index = req.prev_log_index;
        for ent in req.entries {
            last_index = ent.index();

            if ent.index() <= snapshot_last {
                continue;
            }

            match self.entries.get(&ent.index()) {
                Some(existing) if existing.term() == ent.term() => {}
                Some(_) => {
                    let index = ent.index();
                    self.entries.retain(|i, _| *i < index);
                    self.entries.insert(index, ent);
                }
                None => {
                    self.entries.insert(ent.index(), ent);
                }
            }
        }

        let committable = req.leader_commit.min(last_index);
        if committable > self.commit_index {
            self.commit_index = committable;
        }

        debug!(
            "{}: appended upto {}, commit: {}",
            self.id, last_index, self.commit_index
        );
        self.reply(true)
    }

    pub fn handle_snapshot(&mut self, req: SnapshotRequest) -> SnapshotResponse {
        if self.reject_snapshot {
            return SnapshotResponse { success: false };
        }

        debug!("{}: accept snapshot offer: {}", self.id, req.meta);
        self.offered = Some(req.meta);
        SnapshotResponse { success: true }
    }

    pub fn handle_snapshot_recovery(
        &mut self,
        req: SnapshotRecoveryRequest,
    ) -> SnapshotRecoveryResponse {
        let accepted = self.offered.take();
        if accepted.as_ref() != Some(&req.snapshot.meta) {
            debug!("{}: snapshot was not offered: {}", self.id, req.snapshot);
            return SnapshotRecoveryResponse {
                term: self.term,
                success: false,
                commit_index: self.commit_index,
            };
        }

        let last = req.snapshot.meta.last_log_id;

        // Entries following the snapshot are kept only if the log contains
        // the last entry of the snapshot.
        if self.term_at(last.index) == Some(last.term) {
            let rest = self.entries.split_off(&(last.index + 1));
            self.entries = rest;
        } else {
            self.entries.clear();
        }

        self.commit_index = self.commit_index.max(last.index);
        self.snapshot = Some(req.snapshot);

        debug!("{}: installed snapshot upto {}", self.id, last);
        SnapshotRecoveryResponse {
            term: self.term,
            success: true,
            commit_index: self.commit_index,
        }
    }

    pub fn handle_request_vote(&mut self, req: RequestVote) -> VoteReply {
        if req.term < self.term {
            return VoteReply::new(self.term, false);
        }
        self.see_term(req.term);

        let last = self.last_log_id();
        let up_to_date =
            (req.last_log_term, req.last_log_index) >= (last.term, last.index);
        let free = match &self.voted_for {
            None => true,
            Some(c) => c == &req.candidate_id,
        };

        let granted = up_to_date && free;
        if granted {
            self.voted_for = Some(req.candidate_id.clone());
        }

        debug!(
            "{}: vote for {} in term {}: {}",
            self.id, req.candidate_id, req.term, granted
        );
        VoteReply::new(self.term, granted)
    }
}
