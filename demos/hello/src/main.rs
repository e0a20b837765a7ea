mod logging;

use std::sync::Arc;
use std::time::Duration;

use maplit::btreemap;
use memlog::MemLog;
use pseudonet::PseudoNetwork;
use relayraft::declare_relay_types;
use relayraft::rpc::RequestVote;
use relayraft::storage::Snapshot;
use relayraft::storage::SnapshotMeta;
use relayraft::Config;
use relayraft::LeaderContext;
use relayraft::NodeId;
use relayraft::PeerReply;
use relayraft::PeerSet;

use crate::logging::init_logging;

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Cmd {
    pub key: String,
    pub value: String,
}

impl Cmd {
    pub fn new(key: impl ToString, value: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

declare_relay_types!(pub Types: AppData = Cmd);

fn nid(id: u64) -> NodeId {
    format!("n{}", id)
}

async fn sleep(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let g = init_logging("hello", "_log", "DEBUG");
    Box::leak(Box::new(g));

    let config = Config::build(&[
        "hello",
        "--heartbeat-interval=20",
        "--max-backoff-exponent=3",
        "--vote-timeout=200",
    ])?;

    let log = MemLog::<Types>::new();
    let network = PseudoNetwork::<Types>::new();

    let followers = btreemap! {
        nid(1) => "10.0.0.1:5000",
        nid(2) => "10.0.0.2:5000",
        nid(3) => "10.0.0.3:5000",
    };
    for id in followers.keys() {
        network.add_follower(id.clone());
    }

    let (ctx, rx) = LeaderContext::new(nid(0), Arc::new(config), log.clone(), 1);

    // The server side: print what the peers report back.
    let mut rx_reply = rx.rx_reply;
    tokio::spawn(async move {
        while let Some(reply) = rx_reply.recv().await {
            if let PeerReply::AppendEntries { append: false, .. } = reply {
                continue;
            }
            println!("server: {}", reply);
        }
    });

    let mut peers = PeerSet::new(ctx.clone(), network.clone());
    for (id, addr) in followers.iter() {
        peers.add_peer(id.clone(), addr).await?;
    }

    println!("--- become leader in term 1");
    let first = log.append_blank(1);
    peers.become_leader(first.index - 1).await?;

    println!("--- replicate 3 commands");
    for (k, v) in [("x", 1), ("y", 2), ("z", 3)] {
        log.append(1, vec![Cmd::new(k, v)]);
    }
    log.set_commit_index(log.last_log_id().index);
    sleep(200).await;

    for p in peers.peers() {
        println!("{}", p);
    }

    println!("--- n3 becomes unreachable");
    network.set_unreachable(&nid(3), true);
    log.append(1, vec![Cmd::new("x", 10)]);
    sleep(500).await;

    if let Some(p) = peers.get(&nid(3)) {
        println!(
            "{}: failed heartbeats: {}, period: {:?}",
            p,
            p.failed_heartbeats(),
            p.heartbeat_period()
        );
    }

    println!("--- n3 comes back");
    network.set_unreachable(&nid(3), false);
    sleep(300).await;

    if let Some(p) = peers.get(&nid(3)) {
        println!(
            "{}: failed heartbeats: {}, period: {:?}",
            p,
            p.failed_heartbeats(),
            p.heartbeat_period()
        );
    }

    println!("--- compact the log, then add n4");
    let last = log.last_log_id();
    log.set_commit_index(last.index);
    if let Some(compacted) = log.compact(last.index) {
        let meta = SnapshotMeta {
            last_log_id: compacted,
            peers: peers.infos(),
        };
        ctx.set_snapshot(Snapshot::new(meta, b"x=10,y=2,z=3".to_vec()));
    }

    network.add_follower(nid(4));
    peers.add_peer(nid(4), "10.0.0.4:5000").await?;
    sleep(200).await;

    let snap = network.follower(&nid(4), |f| f.snapshot().map(|s| s.to_string()));
    println!("n4 snapshot: {:?}", snap.flatten());

    println!("--- lose leadership, then campaign for term 2");
    peers.step_down().await;
    ctx.set_term(2);

    let mut rx_vote = peers.request_votes(RequestVote::new(2, last.index, last.term));
    let mut granted = 1;
    while let Some(res) = rx_vote.recv().await {
        println!("{}", res);
        if res.reply.vote_granted {
            granted += 1;
        }
    }
    println!("granted: {} of {}", granted, peers.len() + 1);

    Ok(())
}
