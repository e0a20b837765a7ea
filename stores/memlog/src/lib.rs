use std::collections::BTreeMap;
use std::io::Error;
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::Mutex;

use relayraft::storage::log::entry::Entry;
use relayraft::storage::log::entry::EntryPayload;
use relayraft::storage::log::log_id::LogId;
use relayraft::storage::EntriesAfter;
use relayraft::storage::LogReader;
use tracing::debug;


relayraft::declare_relay_types!(
    /// The type config used by the in-memory log: commands are strings.
    pub TypeConfig
);

struct Inner<C>
where C: relayraft::TypeConfig
{
    entries: BTreeMap<u64, Entry<C>>,

    /// The last entry removed by compaction.
    compacted: LogId,

    commit_index: u64,
}

impl<C> Default for Inner<C>
where C: relayraft::TypeConfig
{
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            compacted: LogId::default(),
            commit_index: 0,
        }
    }
}

/// An in-memory log implementing the [`LogReader`] trait.
///
/// Entries are indexed from 1. The head of the log may be compacted, after
/// which the entries up to the compacted index can only be delivered by a
/// snapshot.
#[derive(Clone)]
pub struct MemLog<C>
where C: relayraft::TypeConfig
{
    inner: Arc<Mutex<Inner<C>>>,
}

impl<C> Default for MemLog<C>
where C: relayraft::TypeConfig
{
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }
}

impl<C> MemLog<C>
where C: relayraft::TypeConfig
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry in `term` carrying `payload`, and return its log id.
    pub fn append(&self, term: u64, payload: EntryPayload<C>) -> LogId {
        let mut inner = self.inner.lock().unwrap();

        let index = inner.last_log_id().index + 1;
        let log_id = LogId::new(term, index);
        inner.entries.insert(index, Entry::new(log_id, payload));

        debug!("MemLog::append: {}", log_id);
        log_id
    }

    /// Append a blank entry, e.g., the first entry of a new leader.
    pub fn append_blank(&self, term: u64) -> LogId {
        self.append(term, vec![])
    }

    /// Replace the entry at `entry.log_id.index` and remove every entry after
    /// it.
    ///
    /// It builds a log that diverges from a follower's.
    pub fn overwrite(&self, entry: Entry<C>) {
        let mut inner = self.inner.lock().unwrap();

        let index = entry.index();
        inner.entries.split_off(&index);
        inner.entries.insert(index, entry);
    }

    pub fn set_commit_index(&self, index: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.commit_index = index;
    }

    pub fn last_log_id(&self) -> LogId {
        let inner = self.inner.lock().unwrap();
        inner.last_log_id()
    }

    /// The last entry removed by compaction, or `LogId::default()`.
    pub fn compacted(&self) -> LogId {
        let inner = self.inner.lock().unwrap();
        inner.compacted
    }

    /// Remove the entries up to and including `upto`.
    ///
    /// Returns the log id of the last removed entry, or `None` if there is
    /// no entry at `upto`.
    pub fn compact(&self, upto: u64) -> Option<LogId> {
        let mut inner = self.inner.lock().unwrap();

        let log_id = inner.entries.get(&upto)?.log_id;

        let rest = inner.entries.split_off(&(upto + 1));
        inner.entries = rest;
        inner.compacted = log_id;

        debug!("MemLog::compact: upto {}", log_id);
        Some(log_id)
    }

    /// All entries that are not compacted.
    pub fn entries(&self) -> Vec<Entry<C>> {
        let inner = self.inner.lock().unwrap();
        inner.entries.values().cloned().collect()
    }
}

impl<C> Inner<C>
where C: relayraft::TypeConfig
{
    fn last_log_id(&self) -> LogId {
        self.entries
            .values()
            .next_back()
            .map(|e| e.log_id)
            .unwrap_or(self.compacted)
    }

    fn term_at(&self, index: u64) -> Option<u64> {
        if index == self.compacted.index {
            return Some(self.compacted.term);
        }
        self.entries.get(&index).map(|e| e.term())
    }
}

impl<C> LogReader<C> for MemLog<C>
where C: relayraft::TypeConfig
{
    async fn entries_after(
        &mut self,
        index: u64,
        max: u64,
    ) -> Result<Option<EntriesAfter<C>>, Error> {
        let inner = self.inner.lock().unwrap();

        if index < inner.compacted.index {
            debug!(
                "MemLog::entries_after: {} is compacted upto {}",
                index, inner.compacted
            );
            return Ok(None);
        }

        let Some(prev_log_term) = inner.term_at(index) else {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "index {} is beyond the last log id {}",
                    index,
                    inner.last_log_id()
                ),
            ));
        };

        let entries = inner
            .entries
            .range((index + 1)..)
            .take(max as usize)
            .map(|(_, e)| e.clone())
            .collect::<Vec<_>>();

        debug!(
            "MemLog::entries_after: index={}, max={}, got {} entries",
            index,
            max,
            entries.len()
        );

        Ok(Some(EntriesAfter {
            prev_log_term,
            entries,
        }))
    }

    async fn commit_index(&mut self) -> Result<u64, Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.commit_index)
    }
}
