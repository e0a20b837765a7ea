//! The contract between the peers and the server that owns them.
//!
//! The server creates a [`LeaderContext`] when it becomes leader and shares it
//! with every peer. Peers read the term, log and snapshot from it, and write
//! what they learn back through its two channels, consumed by the server from
//! [`ServerReceivers`].

mod context;
mod event;
mod reply;


pub use context::LeaderContext;
pub use context::ServerReceivers;
pub use event::Event;
pub use reply::PeerReply;
pub use reply::VoteResult;
