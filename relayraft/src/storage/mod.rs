//! The log and snapshot types a leader replicates, and the read-only log
//! interface the peers consume.

pub mod log;
mod log_reader;
mod snapshot;

pub use log_reader::EntriesAfter;
pub use log_reader::LogReader;
pub use snapshot::Snapshot;
pub use snapshot::SnapshotMeta;
