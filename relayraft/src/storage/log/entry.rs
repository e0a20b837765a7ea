use std::fmt;
use std::fmt::Debug;

use crate::base::display_ext::DisplaySliceExt;
use crate::storage::log::log_id::LogId;
use crate::TypeConfig;

pub type EntryPayload<C> = Vec<<C as TypeConfig>::AppData>;

/// A log entry replicated from the leader to its peers.
#[derive(Default)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(bound = "")]
pub struct Entry<C>
where C: TypeConfig
{
    pub log_id: LogId,

    /// Application commands carried by this entry. Empty for a blank entry.
    pub payload: EntryPayload<C>,
}

impl<C> Entry<C>
where C: TypeConfig
{
    pub fn new(log_id: LogId, payload: EntryPayload<C>) -> Self {
        Self { log_id, payload }
    }

    pub fn new_blank(log_id: LogId) -> Self {
        Self {
            log_id,
            payload: Vec::new(),
        }
    }

    pub fn index(&self) -> u64 {
        self.log_id.index
    }

    pub fn term(&self) -> u64 {
        self.log_id.term
    }
}

impl<C> Clone for Entry<C>
where C: TypeConfig
{
    fn clone(&self) -> Self {
        Self {
            log_id: self.log_id,
            payload: self.payload.clone(),
        }
    }
}

impl<C> Debug for Entry<C>
where C: TypeConfig
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("log_id", &self.log_id)
            .field("payload", &self.payload)
            .finish()
    }
}

impl<C> PartialEq for Entry<C>
where C: TypeConfig
{
    fn eq(&self, other: &Self) -> bool {
        self.log_id == other.log_id && self.payload == other.payload
    }
}

impl<C> fmt::Display for Entry<C>
where
    C: TypeConfig,
    C::AppData: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.log_id, self.payload.display())
    }
}
