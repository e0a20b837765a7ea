//! Testing utilities for relayraft.


use std::fmt::Display;

use crate::storage::log::entry::Entry;
use crate::storage::log::log_id::LogId;
use crate::NodeId;
use crate::TypeConfig;

crate::declare_relay_types!(
    /// Type config used in tests.
    pub UTConfig
);

/// Builds a log id, for testing purposes.
pub fn log_id(term: u64, index: u64) -> LogId {
    LogId { term, index }
}

/// Create a blank log entry for test.
pub fn blank_ent<C: TypeConfig>(term: u64, index: u64) -> Entry<C> {
    Entry::<C>::new_blank(LogId::new(term, index))
}

/// Create a log entry carrying one command, for test.
pub fn ent<C: TypeConfig>(term: u64, index: u64, data: C::AppData) -> Entry<C> {
    Entry::<C>::new(LogId::new(term, index), vec![data])
}

pub fn nid(x: impl Display) -> NodeId {
    format!("{}", x)
}
