#![allow(clippy::uninlined_format_args)]

#[path = "../fixtures/mod.rs"]
mod fixtures;

mod t20_backoff;
