#![doc = include_str!("lib_readme.md")]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::bool_comparison)]
#![allow(clippy::type_complexity)]
#![deny(unused_qualifications)]

macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let n = &name[..name.len() - 3];
        let nn = n.replace("::{{closure}}", "");
        nn
    }};
}

pub extern crate openraft_macros;

mod config;
mod node;

pub mod base;
pub mod errors;
pub mod network;
pub mod peer;
pub mod rpc;
pub mod server;
pub mod storage;
pub mod testing;
pub mod type_config;

pub use anyerror;
pub use anyerror::AnyError;
pub use openraft_macros::add_async_trait;

pub use crate::config::Config;
pub use crate::config::ConfigError;
pub use crate::network::Connection;
pub use crate::network::Network;
pub use crate::node::NodeId;
pub use crate::peer::Peer;
pub use crate::peer::PeerInfo;
pub use crate::peer::PeerSet;
pub use crate::server::Event;
pub use crate::server::LeaderContext;
pub use crate::server::PeerReply;
pub use crate::server::ServerReceivers;
pub use crate::server::VoteResult;
pub use crate::storage::LogReader;
pub use crate::type_config::TypeConfig;
