use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use relayraft::Config;
use relayraft::PeerReply;

use crate::fixtures::init_default_ut_tracing;
use crate::fixtures::s;
use crate::fixtures::wait_for;
use crate::fixtures::Cluster;

/// Followers with empty logs receive every entry of the leader, and every
/// accepted entry of the current term is reported as an append.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn catch_up_from_empty() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        max_payload_entries: 3,
        ..Default::default()
    };
    let mut c = Cluster::new(config, 1, &[1, 2, 3])?;
    let last = c.write(10);

    let mut peers = c.peer_set();
    for id in [1, 2, 3] {
        peers.add_peer(s(id), format!("addr-{}", id)).await?;
    }
    peers.become_leader(0).await?;

    tracing::info!("--- wait for all followers to catch up");
    {
        for id in [1, 2, 3] {
            let peer = peers.get(&s(id)).unwrap();
            wait_for(format!("{} matched", peer), timeout(), || {
                peer.matched_index() == last
            })
            .await?;

            let entries = c.net.follower(&s(id), |f| f.entries()).unwrap();
            assert_eq!(c.log.entries(), entries);
        }
    }

    tracing::info!("--- every reply is tagged with its sender");
    {
        let mut appended = 0;
        while let Ok(reply) = c.rx.rx_reply.try_recv() {
            assert!([s(1), s(2), s(3)].contains(reply.target()));

            match reply {
                PeerReply::AppendEntries { reply, append, .. } => {
                    assert!(reply.success);
                    if append {
                        appended += 1;
                    }
                }
                other => panic!("no snapshot expected: {}", other),
            }
        }

        // 10 entries in batches of 3: at least the first 3 batches to each
        // follower are reported by now.
        assert!(appended >= 3 * 3, "appended: {}", appended);
    }

    peers.step_down().await;
    Ok(())
}

/// An entry written while replicating is delivered by a later heartbeat.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn replicate_new_writes() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1])?;
    c.write(2);

    let mut peers = c.peer_set();
    peers.add_peer(s(1), "addr-1").await?;
    peers.become_leader(0).await?;

    c.wait_follower(1, 2, timeout()).await?;

    let last = c.write(3);
    c.wait_follower(1, last, timeout()).await?;
    wait_for("follower commits", timeout(), || {
        c.net.follower(&s(1), |f| f.commit_index()) == Some(last)
    })
    .await?;

    assert_eq!(Some(last), c.net.follower(&s(1), |f| f.commit_index()));

    peers.step_down().await;
    Ok(())
}

fn timeout() -> Duration {
    Duration::from_millis(2_000)
}
