use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use pseudonet::RPCTypes;
use relayraft::Config;

use crate::fixtures::init_default_ut_tracing;
use crate::fixtures::s;
use crate::fixtures::wait_for;
use crate::fixtures::Cluster;

/// Leadership can be lost and regained: stepping down stops every heartbeat
/// without a flush, and becoming leader again starts fresh ones that keep
/// the configured interval.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn step_down_and_lead_again() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1, 2])?;
    let last = c.write(2);

    let mut peers = c.peer_set();
    peers.add_peer(s(1), "addr-1").await?;
    peers.add_peer(s(2), "addr-2").await?;

    peers.become_leader(0).await?;

    tracing::info!("--- becoming leader twice is a no-op");
    {
        peers.become_leader(0).await?;
        assert!(peers.peers().all(|p| p.is_running()));
    }

    for id in [1, 2] {
        c.wait_follower(id, last, timeout()).await?;
    }

    tracing::info!("--- step down");
    {
        peers.step_down().await;
        assert!(!peers.is_leading());
        assert!(peers.peers().all(|p| !p.is_running()));

        let sent = c.net.rpc_count(&s(1), RPCTypes::AppendEntries);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sent, c.net.rpc_count(&s(1), RPCTypes::AppendEntries));
    }

    tracing::info!("--- lead again in a new term, with a slower heartbeat");
    {
        c.ctx.set_term(2);
        let last = c.write(2);

        peers.set_heartbeat_interval(Duration::from_millis(20));
        peers.become_leader(2).await?;

        for p in peers.peers() {
            assert!(p.is_running());
            assert_eq!(Duration::from_millis(20), p.heartbeat_interval());
        }

        for id in [1, 2] {
            let peer = peers.get(&s(id)).unwrap();
            wait_for("peer matched", timeout(), || {
                peer.matched_index() == last
            })
            .await?;
        }

        assert_eq!(Some(2), c.net.follower(&s(1), |f| f.term()));
    }

    peers.step_down().await;
    Ok(())
}

fn timeout() -> Duration {
    Duration::from_millis(2_000)
}
