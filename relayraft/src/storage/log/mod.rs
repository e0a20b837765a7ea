pub mod entry;
pub mod log_id;
