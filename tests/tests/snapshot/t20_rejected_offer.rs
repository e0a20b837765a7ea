use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use pseudonet::RPCTypes;
use relayraft::storage::Snapshot;
use relayraft::storage::SnapshotMeta;
use relayraft::Config;

use crate::fixtures::init_default_ut_tracing;
use crate::fixtures::s;
use crate::fixtures::wait_for;
use crate::fixtures::Cluster;

/// A rejected offer is retried on later ticks without backing off, and the
/// snapshot data is never sent.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn rejected_offer_is_retried() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1])?;
    let last = c.write(4);

    let compacted = c.log.compact(2).unwrap();
    c.ctx.set_snapshot(Snapshot::new(
        SnapshotMeta {
            last_log_id: compacted,
            peers: vec![],
        },
        vec![1, 2, 3],
    ));

    c.net.follower(&s(1), |f| f.set_reject_snapshot(true));

    let peer = c.peer(1);
    peer.start_heartbeat().await?;

    tracing::info!("--- offers are rejected");
    {
        wait_for("3 offers", timeout(), || {
            c.net.rpc_count(&s(1), RPCTypes::Snapshot) >= 3
        })
        .await?;

        assert_eq!(0, c.net.rpc_count(&s(1), RPCTypes::SnapshotRecovery));
        assert_eq!(0, peer.matched_index());
        assert_eq!(0, peer.failed_heartbeats());
        assert_eq!(Duration::from_millis(10), peer.heartbeat_period());
    }

    tracing::info!("--- the follower accepts");
    {
        c.net.follower(&s(1), |f| f.set_reject_snapshot(false));

        wait_for("peer matched", timeout(), || peer.matched_index() == last)
            .await?;
        assert_eq!(1, c.net.rpc_count(&s(1), RPCTypes::SnapshotRecovery));
    }

    peer.stop_heartbeat(false)?.await?;
    Ok(())
}

/// An unreachable peer is offered the snapshot again on later ticks.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn unreachable_during_offer() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1])?;
    c.write(4);

    let compacted = c.log.compact(4).unwrap();
    c.ctx.set_snapshot(Snapshot::new(
        SnapshotMeta {
            last_log_id: compacted,
            peers: vec![],
        },
        vec![],
    ));

    c.net.set_unreachable(&s(1), true);

    let peer = c.peer(1);
    peer.start_heartbeat().await?;

    wait_for("3 offers", timeout(), || {
        c.net.rpc_count(&s(1), RPCTypes::Snapshot) >= 3
    })
    .await?;
    assert_eq!(0, peer.failed_heartbeats());

    c.net.set_unreachable(&s(1), false);
    wait_for("peer matched", timeout(), || peer.matched_index() == 4).await?;

    assert_eq!(Some(4), c.net.follower(&s(1), |f| f.last_log_id().index));

    peer.stop_heartbeat(false)?.await?;
    Ok(())
}

fn timeout() -> Duration {
    Duration::from_millis(2_000)
}
