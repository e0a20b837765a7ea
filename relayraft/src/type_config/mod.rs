//! Define the types an application plugs into this crate.

mod declare_relay_types;


use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Configuration of types used by replication.
///
/// Entries replicated to peers carry a payload of `AppData`, the application
/// command. It must be serializable because it crosses the wire inside an
/// append-entries request.
///
/// Use [`declare_relay_types!`](crate::declare_relay_types) to declare an
/// implementation.
pub trait TypeConfig:
    Sized
    + Send
    + Sync
    + Debug
    + Clone
    + Copy
    + Default
    + Eq
    + PartialEq
    + Ord
    + PartialOrd
    + 'static
{
    /// Application-specific request data carried by a log entry.
    type AppData: Debug
        + Clone
        + PartialEq
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + 'static;
}
