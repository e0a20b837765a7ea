use std::collections::BTreeMap;

use anyhow::Result;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use pseudonet::RPCTypes;
use relayraft::rpc::RequestVote;
use relayraft::storage::log::entry::Entry;
use relayraft::storage::log::log_id::LogId;
use relayraft::Config;
use relayraft::VoteResult;

use crate::fixtures::init_default_ut_tracing;
use crate::fixtures::s;
use crate::fixtures::Cluster;
use crate::fixtures::LEADER;

async fn collect(
    mut rx: tokio::sync::mpsc::UnboundedReceiver<VoteResult>,
) -> BTreeMap<String, (u64, bool)> {
    let mut got = BTreeMap::new();
    while let Some(res) = rx.recv().await {
        got.insert(res.voter, (res.reply.term, res.reply.vote_granted));
    }
    got
}

/// Every reachable peer answers, an unreachable one is left out, and the
/// channel closes when all requests are done.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn request_votes_from_all_peers() -> Result<()> {
    let c = Cluster::new(Config::default(), 3, &[1, 2, 3, 4])?;

    // n2 has a newer log and refuses; n3 is in a newer term.
    c.net.follower(&s(2), |f| {
        f.set_term(2);
        f.append(Entry::new_blank(LogId::new(2, 1)));
    });
    c.net.follower(&s(3), |f| f.set_term(7));
    c.net.set_unreachable(&s(4), true);

    let mut peers = c.peer_set();
    for id in [1, 2, 3, 4] {
        peers.add_peer(s(id), format!("addr-{}", id)).await?;
    }

    let rx = peers.request_votes(RequestVote::new(3, 0, 0));
    let got = collect(rx).await;

    assert_eq!(
        btreemap! {
            s(1) => (3, true),
            s(2) => (3, false),
            s(3) => (7, false),
        },
        got
    );

    assert_eq!(1, c.net.rpc_count(&s(4), RPCTypes::Vote));
    assert_eq!(
        Some(Some(s(LEADER))),
        c.net.follower(&s(1), |f| f.voted_for().cloned())
    );

    Ok(())
}

/// A voter grants one candidate per term.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn one_vote_per_term() -> Result<()> {
    let c = Cluster::new(Config::default(), 1, &[1])?;

    c.net.follower(&s(1), |f| {
        let granted = f
            .handle_request_vote(RequestVote {
                term: 1,
                candidate_id: s(9),
                last_log_index: 0,
                last_log_term: 0,
            })
            .vote_granted;
        assert!(granted);
    });

    let mut peers = c.peer_set();
    peers.add_peer(s(1), "addr-1").await?;

    let got = collect(peers.request_votes(RequestVote::new(1, 0, 0))).await;
    assert_eq!(btreemap! {s(1) => (1, false)}, got);

    let got = collect(peers.request_votes(RequestVote::new(2, 0, 0))).await;
    assert_eq!(btreemap! {s(1) => (2, true)}, got);

    Ok(())
}
