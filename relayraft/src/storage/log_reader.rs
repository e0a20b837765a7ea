use std::io;

use openraft_macros::add_async_trait;

use crate::storage::log::entry::Entry;
use crate::TypeConfig;

/// A batch of entries read from the log, as returned by
/// [`LogReader::entries_after`].
#[derive(Debug, Clone)]
pub struct EntriesAfter<C>
where C: TypeConfig
{
    /// The term of the entry at the index the batch was requested after.
    ///
    /// It is 0 if that index is 0, i.e., the batch starts at the head of the
    /// log.
    pub prev_log_term: u64,

    /// Consecutive entries following that index. It may be empty if the
    /// index is the last one in the log.
    pub entries: Vec<Entry<C>>,
}

/// Read-only access to the leader's log, used by every peer.
///
/// Implementations are cloned into each replication loop, so they are
/// expected to be cheap handles to shared state.
#[add_async_trait]
pub trait LogReader<C>: Clone + Send + Sync + 'static
where C: TypeConfig
{
    /// Return at most `max` entries strictly after `index`, together with
    /// the term of the entry at `index`.
    ///
    /// Returns `Ok(None)` if the entries after `index` have been compacted
    /// into a snapshot and can only be delivered by a snapshot transfer.
    async fn entries_after(
        &mut self,
        index: u64,
        max: u64,
    ) -> Result<Option<EntriesAfter<C>>, io::Error>;

    /// Return the index of the last committed entry.
    async fn commit_index(&mut self) -> Result<u64, io::Error>;
}
