use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use relayraft::Config;

use crate::fixtures::init_default_ut_tracing;
use crate::fixtures::s;
use crate::fixtures::wait_for;
use crate::fixtures::Cluster;

/// An unreachable peer is retried less and less often, up to
/// `base * 2^max_backoff_exponent`. The first reply resets the interval.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn backoff_and_reset() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        max_backoff_exponent: 3,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1])?;
    let last = c.write(2);

    c.net.set_unreachable(&s(1), true);

    let peer = c.peer(1);
    peer.start_heartbeat().await?;

    tracing::info!("--- back off while unreachable");
    {
        wait_for("4 failures", timeout(), || peer.failed_heartbeats() >= 4)
            .await?;

        assert_eq!(Duration::from_millis(10), peer.heartbeat_interval());
        assert_eq!(Duration::from_millis(80), peer.heartbeat_period());
        assert_eq!(0, peer.matched_index());
    }

    tracing::info!("--- reachable again");
    {
        c.net.set_unreachable(&s(1), false);

        wait_for("reset", timeout(), || peer.failed_heartbeats() == 0).await?;
        assert_eq!(Duration::from_millis(10), peer.heartbeat_period());

        wait_for("caught up", timeout(), || peer.matched_index() == last)
            .await?;
    }

    peer.stop_heartbeat(false)?.await?;
    Ok(())
}

/// A rejecting reply is a reply: it does not back off.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn rejection_does_not_back_off() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1])?;
    c.write(2);

    // The follower has seen a newer leader and rejects every request.
    c.net.follower(&s(1), |f| f.set_term(5));

    let peer = c.peer(1);
    peer.start_heartbeat().await?;

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(0, peer.failed_heartbeats());
    assert_eq!(Duration::from_millis(10), peer.heartbeat_period());
    assert_eq!(0, peer.matched_index());
    assert_eq!(0, c.follower_last_index(1));

    peer.stop_heartbeat(false)?.await?;
    Ok(())
}

fn timeout() -> Duration {
    Duration::from_millis(3_000)
}
