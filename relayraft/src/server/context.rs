use std::marker::PhantomData;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::warn;

use crate::server::Event;
use crate::server::PeerReply;
use crate::storage::LogReader;
use crate::storage::Snapshot;
use crate::Config;
use crate::NodeId;
use crate::TypeConfig;

/// The receiving ends of the channels a [`LeaderContext`] writes to.
pub struct ServerReceivers {
    /// Responses received by the peers, for commit-index advancement.
    pub rx_reply: mpsc::UnboundedReceiver<PeerReply>,

    /// Heartbeat timing events.
    pub rx_event: mpsc::UnboundedReceiver<Event>,
}

/// The state of the leader shared by all of its peers.
///
/// The term, the log and the snapshot are only read by the peers. They are
/// updated by the server.
pub struct LeaderContext<C, Log>
where
    C: TypeConfig,
    Log: LogReader<C>,
{
    id: NodeId,
    config: Arc<Config>,
    log: Log,
    current_term: AtomicU64,
    snapshot: Mutex<Option<Arc<Snapshot>>>,

    tx_reply: mpsc::UnboundedSender<PeerReply>,
    tx_event: mpsc::UnboundedSender<Event>,

    _p: PhantomData<C>,
}

impl<C, Log> LeaderContext<C, Log>
where
    C: TypeConfig,
    Log: LogReader<C>,
{
    pub fn new(
        id: NodeId,
        config: Arc<Config>,
        log: Log,
        current_term: u64,
    ) -> (Arc<Self>, ServerReceivers) {
        let (tx_reply, rx_reply) = mpsc::unbounded_channel();
        let (tx_event, rx_event) = mpsc::unbounded_channel();

        let ctx = Self {
            id,
            config,
            log,
            current_term: AtomicU64::new(current_term),
            snapshot: Mutex::new(None),
            tx_reply,
            tx_event,
            _p: PhantomData,
        };

        (Arc::new(ctx), ServerReceivers { rx_reply, rx_event })
    }

    /// The id of the leader, sent as `leader_id` in every request.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A handle to the leader's log.
    pub fn log(&self) -> Log {
        self.log.clone()
    }

    pub fn current_term(&self) -> u64 {
        self.current_term.load(Ordering::Acquire)
    }

    pub fn set_term(&self, term: u64) {
        self.current_term.store(term, Ordering::Release);
    }

    /// The latest snapshot, if the log has ever been compacted.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        let mut s = self.snapshot.lock().unwrap();
        *s = Some(Arc::new(snapshot));
    }

    /// Forward a response received by a peer to the server.
    pub fn send_async(&self, reply: PeerReply) {
        let res = self.tx_reply.send(reply);
        if let Err(e) = res {
            warn!(
                "{}: server dropped its reply receiver, discard: {}",
                func_name!(),
                e.0
            );
        }
    }

    pub fn dispatch_event(&self, event: Event) {
        let res = self.tx_event.send(event);
        if let Err(e) = res {
            warn!(
                "{}: server dropped its event receiver, discard: {}",
                func_name!(),
                e.0
            );
        }
    }
}
