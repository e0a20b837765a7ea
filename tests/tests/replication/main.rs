#![allow(clippy::uninlined_format_args)]

#[path = "../fixtures/mod.rs"]
mod fixtures;

mod t10_catch_up;
mod t20_diverged_log;
