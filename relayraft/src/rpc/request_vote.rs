use std::fmt;

use crate::NodeId;

/// An RPC sent by candidates to gather votes.
///
/// `candidate_id` is filled in by the sending peer, so the caller may leave it
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct RequestVote {
    pub term: u64,
    pub candidate_id: NodeId,
    pub last_log_index: u64,
    pub last_log_term: u64,
}

impl RequestVote {
    pub fn new(term: u64, last_log_index: u64, last_log_term: u64) -> Self {
        Self {
            term,
            candidate_id: NodeId::default(),
            last_log_index,
            last_log_term,
        }
    }
}

impl fmt::Display for RequestVote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, candidate:{}, last_log:{}.{}}}",
            self.term,
            self.candidate_id,
            self.last_log_term,
            self.last_log_index
        )
    }
}

/// The response to a [`RequestVote`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct VoteReply {
    /// The current term of the voter, for the candidate to update itself.
    pub term: u64,

    /// It is true if the voter granted its vote to the candidate.
    pub vote_granted: bool,
}

impl VoteReply {
    pub fn new(term: u64, vote_granted: bool) -> Self {
        Self { term, vote_granted }
    }
}

impl fmt::Display for VoteReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{term:{}, granted:{}}}", self.term, self.vote_granted)
    }
}
