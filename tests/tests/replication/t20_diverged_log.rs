use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use relayraft::storage::log::entry::Entry;
use relayraft::storage::log::log_id::LogId;
use relayraft::Config;

use crate::fixtures::init_default_ut_tracing;
use crate::fixtures::s;
use crate::fixtures::wait_for;
use crate::fixtures::Cluster;

/// A follower holding entries of an older leader converges to the leader's
/// log: the matched index walks back to the last common entry and the
/// diverged entries are replaced.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn converge_diverged_log() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        ..Default::default()
    };
    let c = Cluster::new(config, 2, &[1])?;

    tracing::info!("--- leader: 1.1 1.2 1.3 2.4 2.5 2.6");
    {
        for _ in 0..3 {
            c.log.append_blank(1);
        }
        for _ in 0..3 {
            c.log.append_blank(2);
        }
        c.log.set_commit_index(3);
    }

    tracing::info!("--- follower: 1.1 1.2 1.3 1.4 1.5");
    {
        c.net.follower(&s(1), |f| {
            f.set_term(1);
            for i in 1..=5 {
                f.append(Entry::new_blank(LogId::new(1, i)));
            }
        });
    }

    let timeout = Duration::from_secs(2);

    let mut peers = c.peer_set();
    peers.add_peer(s(1), "addr-1").await?;
    peers.become_leader(6).await?;

    let want = (1..=3)
        .map(|i| LogId::new(1, i))
        .chain((4..=6).map(|i| LogId::new(2, i)))
        .collect::<Vec<_>>();

    let peer = peers.get(&s(1)).unwrap();
    wait_for("follower log converges", timeout, || {
        c.net.follower(&s(1), |f| f.log_ids()) == Some(want.clone())
    })
    .await?;
    wait_for("peer matched", timeout, || peer.matched_index() == 6).await?;
    assert_eq!(Some(2), c.net.follower(&s(1), |f| f.term()));

    peers.step_down().await;
    Ok(())
}
