use crate::rpc::AppendEntriesResponse;
use crate::storage::log::log_id::LogId;

/// How an append-entries response moved the matched index of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub(crate) enum Step {
    /// The peer accepted the request.
    #[display("accepted")]
    Accepted,

    /// The peer knows a higher term; the server is left to step down.
    #[display("higher-term")]
    HigherTerm,

    /// The peer already committed up to its commit index, maybe because an
    /// earlier success response was lost.
    #[display("recovered")]
    Recovered,

    /// The logs diverge; retry from an earlier index.
    #[display("decremented")]
    Decremented,

    /// Rejected at index 0, nothing to retry from.
    #[display("unchanged")]
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reconciled {
    pub(crate) matched_index: u64,

    /// The peer accepted an entry proposed in the current term.
    pub(crate) append: bool,

    pub(crate) step: Step,
}

/// Compute the new matched index of a peer from an append-entries response.
///
/// - `matched_index`: the matched index of the peer now.
/// - `local_term`: the current term of the leader now.
/// - `request_term`: the term the request was sent in.
/// - `last_sent`: the last entry carried by the request, if any.
pub(crate) fn reconcile(
    matched_index: u64,
    local_term: u64,
    request_term: u64,
    last_sent: Option<LogId>,
    resp: &AppendEntriesResponse,
) -> Reconciled {
    if resp.success {
        return match last_sent {
            Some(last) => Reconciled {
                matched_index: last.index,
                append: last.term == local_term,
                step: Step::Accepted,
            },
            None => Reconciled {
                matched_index,
                append: false,
                step: Step::Accepted,
            },
        };
    }

    if resp.term > local_term {
        return Reconciled {
            matched_index,
            append: false,
            step: Step::HigherTerm,
        };
    }

    if resp.term == request_term && resp.commit_index >= matched_index {
        return Reconciled {
            matched_index: resp.commit_index,
            append: false,
            step: Step::Recovered,
        };
    }

    if matched_index > 0 {
        return Reconciled {
            matched_index: (matched_index - 1).min(resp.conflict_index),
            append: false,
            step: Step::Decremented,
        };
    }

    Reconciled {
        matched_index,
        append: false,
        step: Step::Unchanged,
    }
}
