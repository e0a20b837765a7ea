use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;
use tracing::Instrument;
use tracing::Level;

use crate::errors::PeerSetError;
use crate::network::Network;
use crate::peer::Peer;
use crate::peer::PeerInfo;
use crate::rpc::RequestVote;
use crate::server::LeaderContext;
use crate::server::VoteResult;
use crate::storage::LogReader;
use crate::NodeId;
use crate::TypeConfig;

/// The peers of a server, and their heartbeat life cycle as the server gains
/// and loses leadership.
///
/// The server itself is never one of its peers.
pub struct PeerSet<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    ctx: Arc<LeaderContext<C, Log>>,
    network: N,
    peers: BTreeMap<NodeId, Arc<Peer<C, N, Log>>>,
    leading: bool,
}

impl<C, N, Log> PeerSet<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    pub fn new(ctx: Arc<LeaderContext<C, Log>>, network: N) -> Self {
        Self {
            ctx,
            network,
            peers: BTreeMap::new(),
            leading: false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Peer<C, N, Log>>> {
        self.peers.get(name)
    }

    pub fn peers(&self) -> impl Iterator<Item = &Arc<Peer<C, N, Log>>> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_leading(&self) -> bool {
        self.leading
    }

    /// Admit a cluster member.
    ///
    /// Its heartbeat starts at once if this server is leading. Adding the
    /// server itself is a no-op.
    pub async fn add_peer(
        &mut self,
        name: NodeId,
        connection_string: impl ToString,
    ) -> Result<(), PeerSetError> {
        if &name == self.ctx.id() {
            debug!("{}: {} is this server, ignore", func_name!(), name);
            return Ok(());
        }

        if self.peers.contains_key(&name) {
            return Err(PeerSetError::PeerExists { name });
        }

        let peer = Arc::new(self.new_peer(name.clone(), connection_string));

        if self.leading {
            peer.start_heartbeat().await?;
        }

        info!(
            "{}: added {}, leading: {}",
            func_name!(),
            peer,
            self.leading
        );

        self.peers.insert(name, peer);
        Ok(())
    }

    /// Remove a cluster member, and return its final state.
    ///
    /// A running heartbeat is stopped with a last flush, so that the member
    /// receives the entry removing it.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn remove_peer(
        &mut self,
        name: &str,
    ) -> Result<PeerInfo, PeerSetError> {
        let peer = self.peers.remove(name).ok_or_else(|| {
            PeerSetError::PeerNotFound {
                name: name.to_string(),
            }
        })?;

        if peer.is_running() {
            let handle = peer.stop_heartbeat(true)?;
            join_heartbeat(name, handle).await;
        }

        let info = peer.detached_clone();
        info!("{}: removed {}", func_name!(), info);
        Ok(info)
    }

    /// Start replicating to every peer, assuming they have stored up to
    /// `matched_index`.
    ///
    /// Peers whose heartbeat was stopped by an earlier [`step_down()`] are
    /// replaced with fresh ones, since a stopped heartbeat can not be
    /// restarted. Calling it while leading is a no-op.
    ///
    /// [`step_down()`]: Self::step_down
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn become_leader(
        &mut self,
        matched_index: u64,
    ) -> Result<(), PeerSetError> {
        if self.leading {
            return Ok(());
        }

        info!(
            "{}: term: {}, matched_index: {}",
            func_name!(),
            self.ctx.current_term(),
            matched_index
        );

        let names = self.peers.keys().cloned().collect::<Vec<_>>();
        for name in names {
            let Some(old) = self.peers.get(&name) else {
                continue;
            };

            let peer = Arc::new(
                self.new_peer(name.clone(), old.connection_string()),
            );
            peer.set_heartbeat_interval(old.heartbeat_interval());
            peer.set_matched_index(matched_index);
            peer.start_heartbeat().await?;

            self.peers.insert(name, peer);
        }

        self.leading = true;
        Ok(())
    }

    /// Stop the heartbeat of every peer, without a last flush.
    pub async fn step_down(&mut self) {
        if !self.leading {
            return;
        }

        info!("{}: stop {} heartbeats", func_name!(), self.peers.len());

        for (name, peer) in self.peers.iter() {
            match peer.stop_heartbeat(false) {
                Ok(handle) => join_heartbeat(name, handle).await,
                Err(e) => {
                    warn!("{}: {}", func_name!(), e);
                }
            }
        }

        self.leading = false;
    }

    /// Update the base heartbeat interval of every peer.
    pub fn set_heartbeat_interval(&self, interval: Duration) {
        for peer in self.peers.values() {
            peer.set_heartbeat_interval(interval);
        }
    }

    /// Send `rpc` to every peer concurrently.
    ///
    /// Every reply received is delivered to the returned channel. The channel
    /// is closed when all of the requests finish, with or without reply.
    pub fn request_votes(
        &self,
        rpc: RequestVote,
    ) -> mpsc::UnboundedReceiver<VoteResult> {
        let (tx, rx) = mpsc::unbounded_channel();

        for peer in self.peers.values() {
            let peer = peer.clone();
            let rpc = rpc.clone();
            let tx = tx.clone();

            let span = tracing::span!(
                Level::DEBUG,
                "vote",
                candidate = display(self.ctx.id()),
                peer = display(peer.name())
            );

            tokio::spawn(
                async move { peer.send_vote_request(rpc, tx).await }
                    .instrument(span),
            );
        }

        rx
    }

    /// Detached copies of all peers, e.g., to be saved in a snapshot.
    pub fn infos(&self) -> Vec<PeerInfo> {
        self.peers.values().map(|p| p.detached_clone()).collect()
    }

    fn new_peer(
        &self,
        name: NodeId,
        connection_string: impl ToString,
    ) -> Peer<C, N, Log> {
        Peer::new(
            name,
            connection_string,
            self.ctx.clone(),
            self.network.clone(),
        )
    }
}

async fn join_heartbeat(name: &str, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!("heartbeat loop of {} did not quit cleanly: {}", name, e);
    }
}
