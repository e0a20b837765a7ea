use std::fmt;
use std::time::Duration;

use crate::NodeId;

/// Timing events emitted by the heartbeat loop of a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A heartbeat tick completed, and its flush took `duration`.
    Heartbeat { target: NodeId, duration: Duration },

    /// The heartbeat period of a peer changed because of back-off.
    HeartbeatInterval {
        target: NodeId,
        interval: Duration,
        failed_heartbeats: u32,
    },
}

impl Event {
    pub fn target(&self) -> &NodeId {
        match self {
            Event::Heartbeat { target, .. } => target,
            Event::HeartbeatInterval { target, .. } => target,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Heartbeat { target, duration } => {
                write!(f, "Heartbeat: target={}, took {:?}", target, duration)
            }
            Event::HeartbeatInterval {
                target,
                interval,
                failed_heartbeats,
            } => {
                write!(
                    f,
                    "HeartbeatInterval: target={}, interval={:?}, failed={}",
                    target, interval, failed_heartbeats
                )
            }
        }
    }
}
