//! Fixtures for testing relayraft.

#![allow(dead_code)]

use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Once;
use std::time::Duration;

use lazy_static::lazy_static;
use memlog::MemLog;
use memlog::TypeConfig;
use pseudonet::PseudoNetwork;
use relayraft::Config;
use relayraft::LeaderContext;
use relayraft::NodeId;
use relayraft::Peer;
use relayraft::PeerSet;
use relayraft::ServerReceivers;
use tracing_appender::non_blocking::WorkerGuard;

use crate::fixtures::logging::init_file_logging;


pub type Log = MemLog<TypeConfig>;
pub type Net = PseudoNetwork<TypeConfig>;
pub type Ctx = Arc<LeaderContext<TypeConfig, Log>>;
pub type TestPeer = Peer<TypeConfig, Net, Log>;
pub type TestPeerSet = PeerSet<TypeConfig, Net, Log>;

pub fn init_default_ut_tracing() {
    static START: Once = Once::new();

    START.call_once(|| {
        let mut g = GLOBAL_UT_LOG_GUARD.as_ref().lock().unwrap();
        *g = Some(init_global_tracing("ut", "_log", "DEBUG"));
    });
}

lazy_static! {
    static ref GLOBAL_UT_LOG_GUARD: Arc<Mutex<Option<WorkerGuard>>> =
        Arc::new(Mutex::new(None));
}

pub fn init_global_tracing(
    app_name: &str,
    dir: &str,
    level: &str,
) -> WorkerGuard {
    set_panic_hook();

    let (g, sub) = init_file_logging(app_name, dir, level);
    tracing::subscriber::set_global_default(sub)
        .expect("error setting global tracing subscriber");

    tracing::info!(
        "initialized global tracing: in {}/{} at {}",
        dir,
        app_name,
        level
    );
    g
}

pub fn set_panic_hook() {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        log_panic(panic);
        prev_hook(panic);
    }));
}

pub fn log_panic(panic: &PanicHookInfo) {
    let backtrace = format!("{:?}", Backtrace::force_capture());

    if let Some(location) = panic.location() {
        tracing::error!(
            message = %panic,
            backtrace = %backtrace,
            panic.file = location.file(),
            panic.line = location.line(),
            panic.column = location.column(),
        );
    } else {
        tracing::error!(message = %panic, backtrace = %backtrace);
    }
}

pub fn s(x: u64) -> NodeId {
    format!("n{}", x)
}

/// The leader is always `n0`.
pub const LEADER: u64 = 0;

/// A leader over an in-memory log, and a network of simulated followers.
pub struct Cluster {
    pub ctx: Ctx,
    pub rx: ServerReceivers,
    pub log: Log,
    pub net: Net,
}

impl Cluster {
    /// A leader in `term`, with `followers` added to the network but not yet
    /// to any peer set.
    pub fn new(config: Config, term: u64, followers: &[u64]) -> anyhow::Result<Self> {
        let config = Arc::new(config.validate()?);
        let log = Log::new();
        let net = Net::new();

        for id in followers {
            net.add_follower(s(*id));
        }

        let (ctx, rx) = LeaderContext::new(s(LEADER), config, log.clone(), term);

        Ok(Self { ctx, rx, log, net })
    }

    /// Append `n` entries in the current term and commit them.
    pub fn write(&self, n: u64) -> u64 {
        let term = self.ctx.current_term();
        let mut last = 0;
        for i in 0..n {
            last = self.log.append(term, vec![format!("cmd-{}", i)]).index;
        }
        self.log.set_commit_index(last);
        last
    }

    pub fn peer(&self, id: u64) -> TestPeer {
        Peer::new(s(id), format!("addr-{}", id), self.ctx.clone(), self.net.clone())
    }

    pub fn peer_set(&self) -> TestPeerSet {
        PeerSet::new(self.ctx.clone(), self.net.clone())
    }

    /// The last log index of a follower.
    pub fn follower_last_index(&self, id: u64) -> u64 {
        self.net
            .follower(&s(id), |f| f.last_log_id().index)
            .unwrap_or_default()
    }

    /// Wait until follower `id` has stored up to `index`.
    pub async fn wait_follower(
        &self,
        id: u64,
        index: u64,
        timeout: Duration,
    ) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let got = self.follower_last_index(id);
            if got >= index {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!(
                    "timeout waiting for {} to reach {}, got: {}",
                    s(id),
                    index,
                    got
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Poll `f` until it returns true, or fail after `timeout`.
pub async fn wait_for(
    msg: impl ToString,
    timeout: Duration,
    f: impl Fn() -> bool,
) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    while !f() {
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("timeout({:?}) waiting for: {}", timeout, msg.to_string());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    Ok(())
}
