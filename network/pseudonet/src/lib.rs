//! An in-process network for testing: every peer talks to a simulated
//! [`Follower`] in the same process.
//!
//! Requests and responses are encoded and decoded as JSON on the way, and the
//! network can be told to lose requests or responses to chosen nodes.

mod follower;


use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;

pub use follower::Follower;
use relayraft::errors::NetworkError;
use relayraft::errors::RPCError;
use relayraft::errors::Unreachable;
use relayraft::network::Connection;
use relayraft::rpc::AppendEntriesRequest;
use relayraft::rpc::AppendEntriesResponse;
use relayraft::rpc::RequestVote;
use relayraft::rpc::SnapshotRecoveryRequest;
use relayraft::rpc::SnapshotRecoveryResponse;
use relayraft::rpc::SnapshotRequest;
use relayraft::rpc::SnapshotResponse;
use relayraft::rpc::VoteReply;
use relayraft::Network;
use relayraft::NodeId;
use relayraft::TypeConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Kinds of request a peer sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RPCTypes {
    AppendEntries,
    Snapshot,
    SnapshotRecovery,
    Vote,
}

impl fmt::Display for RPCTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

struct Router<C>
where C: TypeConfig
{
    followers: BTreeMap<NodeId, Follower<C>>,

    /// Requests to these nodes are lost.
    unreachable: BTreeSet<NodeId>,

    /// Requests to these nodes are handled, but the responses are lost.
    drop_responses: BTreeSet<NodeId>,

    rpc_count: BTreeMap<(NodeId, RPCTypes), u64>,
}

/// A [`Network`] connecting peers to simulated followers.
#[derive(Clone)]
pub struct PseudoNetwork<C>
where C: TypeConfig
{
    router: Arc<Mutex<Router<C>>>,
}

impl<C> Default for PseudoNetwork<C>
where C: TypeConfig
{
    fn default() -> Self {
        let router = Router {
            followers: BTreeMap::new(),
            unreachable: BTreeSet::new(),
            drop_responses: BTreeSet::new(),
            rpc_count: BTreeMap::new(),
        };
        Self {
            router: Arc::new(Mutex::new(router)),
        }
    }
}

impl<C> PseudoNetwork<C>
where C: TypeConfig
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a follower with an empty log, replacing any existing one.
    pub fn add_follower(&self, id: NodeId) {
        let mut r = self.router.lock().unwrap();
        r.followers.insert(id.clone(), Follower::new(id));
    }

    pub fn remove_follower(&self, id: &str) -> Option<Follower<C>> {
        let mut r = self.router.lock().unwrap();
        r.followers.remove(id)
    }

    /// Access a follower, e.g., to inspect or seed its log.
    pub fn follower<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Follower<C>) -> T,
    ) -> Option<T> {
        let mut r = self.router.lock().unwrap();
        r.followers.get_mut(id).map(f)
    }

    /// Lose every request to `id`, or stop losing them.
    pub fn set_unreachable(&self, id: &str, unreachable: bool) {
        let mut r = self.router.lock().unwrap();
        if unreachable {
            r.unreachable.insert(id.to_string());
        } else {
            r.unreachable.remove(id);
        }
    }

    /// Lose every response from `id`, after `id` handled the request.
    pub fn set_drop_responses(&self, id: &str, drop: bool) {
        let mut r = self.router.lock().unwrap();
        if drop {
            r.drop_responses.insert(id.to_string());
        } else {
            r.drop_responses.remove(id);
        }
    }

    /// The number of requests of type `typ` sent to `id`, including lost
    /// ones.
    pub fn rpc_count(&self, id: &str, typ: RPCTypes) -> u64 {
        let r = self.router.lock().unwrap();
        r.rpc_count.get(&(id.to_string(), typ)).copied().unwrap_or_default()
    }

    fn call<Req, Resp>(
        &self,
        target: &NodeId,
        typ: RPCTypes,
        req: Req,
        handle: impl FnOnce(&mut Follower<C>, Req) -> Resp,
    ) -> Result<Resp, RPCError>
    where
        Req: Serialize + DeserializeOwned,
        Resp: Serialize + DeserializeOwned,
    {
        let mut r = self.router.lock().unwrap();

        *r.rpc_count.entry((target.clone(), typ)).or_default() += 1;

        if r.unreachable.contains(target) {
            debug!("{} to {}: unreachable", typ, target);
            return Err(unreachable(target));
        }

        let drop_response = r.drop_responses.contains(target);

        let Some(follower) = r.followers.get_mut(target) else {
            debug!("{} to {}: no such node", typ, target);
            return Err(unreachable(target));
        };

        let req = through_wire(req)?;
        let resp = handle(follower, req);
        let resp = through_wire(resp)?;

        if drop_response {
            debug!("{} to {}: response lost", typ, target);
            return Err(unreachable(target));
        }

        Ok(resp)
    }
}

fn unreachable(target: &NodeId) -> RPCError {
    let e = io::Error::new(
        io::ErrorKind::NotConnected,
        format!("can not reach {}", target),
    );
    RPCError::from(Unreachable::new(&e))
}

/// Encode and decode a message, as a real transport would.
fn through_wire<T>(msg: T) -> Result<T, RPCError>
where T: Serialize + DeserializeOwned {
    let buf = serde_json::to_vec(&msg).map_err(|e| NetworkError::new(&e))?;
    let msg = serde_json::from_slice(&buf).map_err(|e| NetworkError::new(&e))?;
    Ok(msg)
}

impl<C> Network<C> for PseudoNetwork<C>
where C: TypeConfig
{
    type Connection = PseudoConnection<C>;

    async fn new_connection(
        &mut self,
        target: NodeId,
        address: &str,
    ) -> Self::Connection {
        debug!("connect to {} at {}", target, address);
        PseudoConnection {
            target,
            network: self.clone(),
        }
    }
}

pub struct PseudoConnection<C>
where C: TypeConfig
{
    target: NodeId,
    network: PseudoNetwork<C>,
}

impl<C> Connection<C> for PseudoConnection<C>
where C: TypeConfig
{
    async fn append_entries(
        &mut self,
        rpc: AppendEntriesRequest<C>,
    ) -> Result<AppendEntriesResponse, RPCError> {
        self.network.call(
            &self.target,
            RPCTypes::AppendEntries,
            rpc,
            |f, req| f.handle_append_entries(req),
        )
    }

    async fn snapshot(
        &mut self,
        rpc: SnapshotRequest,
    ) -> Result<SnapshotResponse, RPCError> {
        self.network.call(&self.target, RPCTypes::Snapshot, rpc, |f, req| {
            f.handle_snapshot(req)
        })
    }

    async fn snapshot_recovery(
        &mut self,
        rpc: SnapshotRecoveryRequest,
    ) -> Result<SnapshotRecoveryResponse, RPCError> {
        self.network.call(
            &self.target,
            RPCTypes::SnapshotRecovery,
            rpc,
            |f, req| f.handle_snapshot_recovery(req),
        )
    }

    async fn request_vote(
        &mut self,
        rpc: RequestVote,
    ) -> Result<VoteReply, RPCError> {
        self.network.call(&self.target, RPCTypes::Vote, rpc, |f, req| {
            f.handle_request_vote(req)
        })
    }
}
