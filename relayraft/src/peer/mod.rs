//! A peer is the leader's handle to one other cluster member.
//!
//! It owns the replication state of that member: the index up to which the
//! member's log is known to match the leader's, and the heartbeat loop that
//! drives replication to it. See [`Peer`].

mod backoff;
mod heartbeat;
mod peer_info;
mod peer_set;
mod reconcile;
mod replicate;
mod vote;


use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

pub use peer_info::PeerInfo;
pub use peer_set::PeerSet;

use crate::errors::HeartbeatError;
use crate::network::Network;
use crate::peer::backoff::Backoff;
use crate::peer::heartbeat::HeartbeatState;
use crate::server::LeaderContext;
use crate::storage::LogReader;
use crate::NodeId;
use crate::TypeConfig;

/// The replication target of a leader: one other member of the cluster.
///
/// A peer is created when the server admits a member. While the server is
/// the leader, the peer runs a heartbeat loop (see
/// [`start_heartbeat()`](Self::start_heartbeat)) that periodically sends the
/// member the entries it is missing, or the snapshot if they have been
/// compacted.
///
/// All of the mutable replication state lives under the peer's own lock, and
/// every access goes through the accessors below.
pub struct Peer<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    core: Arc<PeerCore<C, N, Log>>,
    heartbeat: Mutex<HeartbeatState>,
}

/// The part of a peer shared with its heartbeat loop.
pub(crate) struct PeerCore<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    name: NodeId,
    connection_string: String,
    ctx: Arc<LeaderContext<C, Log>>,
    network: N,
    state: Mutex<PeerState>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PeerState {
    /// The highest index the member is known, or assumed, to have stored.
    pub(crate) matched_index: u64,

    /// The base heartbeat interval, before back-off.
    pub(crate) heartbeat_interval: Duration,

    pub(crate) backoff: Backoff,
}

impl<C, N, Log> Peer<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    /// Create a peer with matched index 0 and the heartbeat interval of the
    /// leader's config. Its heartbeat is not started.
    pub fn new(
        name: NodeId,
        connection_string: impl ToString,
        ctx: Arc<LeaderContext<C, Log>>,
        network: N,
    ) -> Self {
        let heartbeat_interval = ctx.config().heartbeat_duration();

        let core = PeerCore {
            name,
            connection_string: connection_string.to_string(),
            ctx,
            network,
            state: Mutex::new(PeerState {
                matched_index: 0,
                heartbeat_interval,
                backoff: Backoff::default(),
            }),
        };

        Self {
            core: Arc::new(core),
            heartbeat: Mutex::new(HeartbeatState::Idle),
        }
    }

    pub fn name(&self) -> &NodeId {
        &self.core.name
    }

    pub fn connection_string(&self) -> &str {
        &self.core.connection_string
    }

    pub fn matched_index(&self) -> u64 {
        self.core.matched_index()
    }

    pub fn set_matched_index(&self, index: u64) {
        self.core.set_matched_index(index)
    }

    /// The base heartbeat interval, before back-off.
    pub fn heartbeat_interval(&self) -> Duration {
        self.core.state.lock().unwrap().heartbeat_interval
    }

    /// Update the base heartbeat interval.
    ///
    /// A running heartbeat keeps its current period until the next back-off
    /// or reset.
    pub fn set_heartbeat_interval(&self, interval: Duration) {
        let mut st = self.core.state.lock().unwrap();
        st.heartbeat_interval = interval;
    }

    /// The number of consecutive heartbeats that got no response.
    pub fn failed_heartbeats(&self) -> u32 {
        self.core.state.lock().unwrap().backoff.failed_heartbeats()
    }

    /// The current heartbeat period, including back-off.
    pub fn heartbeat_period(&self) -> Duration {
        self.core.heartbeat_period()
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.heartbeat.lock().unwrap(), HeartbeatState::Running(_))
    }

    /// Copy the identity and the matched index of this peer.
    ///
    /// The copy has no heartbeat and is not attached to the leader.
    pub fn detached_clone(&self) -> PeerInfo {
        let st = self.core.state.lock().unwrap();
        PeerInfo {
            name: self.core.name.clone(),
            connection_string: self.core.connection_string.clone(),
            matched_index: st.matched_index,
        }
    }

    /// Replicate to this peer once, outside of the heartbeat loop.
    ///
    /// It is rejected while the heartbeat loop is running or another flush is
    /// in progress, and starting the heartbeat is rejected during a flush:
    /// two flushes of the same peer never interleave.
    pub async fn flush(&self) -> Result<(), HeartbeatError> {
        let _guard = self.begin_flush()?;

        let mut conn = self.core.connect().await;
        self.core.flush(&mut conn).await;
        Ok(())
    }
}

impl<C, N, Log> fmt::Display for Peer<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer({})", self.detached_clone())
    }
}

impl<C, N, Log> PeerCore<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    pub(crate) fn matched_index(&self) -> u64 {
        self.state.lock().unwrap().matched_index
    }

    pub(crate) fn set_matched_index(&self, index: u64) {
        let mut st = self.state.lock().unwrap();
        st.matched_index = index;
    }

    pub(crate) fn heartbeat_period(&self) -> Duration {
        let st = self.state.lock().unwrap();
        let max_exp = self.ctx.config().max_backoff_exponent;
        st.backoff.interval(st.heartbeat_interval, max_exp)
    }

    pub(crate) async fn connect(&self) -> N::Connection {
        let mut network = self.network.clone();
        network
            .new_connection(self.name.clone(), &self.connection_string)
            .await
    }
}
