//! The identity of a log entry.

use std::fmt::Display;
use std::fmt::Formatter;

/// The identity of a log entry: the term of the leader that proposed it and
/// its index.
///
/// Index 0 is never used by a real entry; `LogId::default()` stands for "no
/// entry" and has term 0.
#[derive(Debug, Default, Clone, Copy, PartialOrd, Ord, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct LogId {
    pub term: u64,
    /// The index of a log entry.
    ///
    /// Log index is a consecutive integer starting from 1.
    pub index: u64,
}

impl Display for LogId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.term, self.index)
    }
}

impl LogId {
    pub fn new(term: u64, index: u64) -> Self {
        LogId { term, index }
    }

    pub fn term(&self) -> u64 {
        self.term
    }
}
