use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use pseudonet::RPCTypes;
use relayraft::errors::PeerSetError;
use relayraft::Config;
use relayraft::PeerInfo;

use crate::fixtures::init_default_ut_tracing;
use crate::fixtures::s;
use crate::fixtures::Cluster;
use crate::fixtures::LEADER;

/// Adding and removing members, while not leading.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn add_and_remove() -> Result<()> {
    let c = Cluster::new(Config::default(), 1, &[1, 2])?;
    let mut peers = c.peer_set();

    peers.add_peer(s(1), "addr-1").await?;
    peers.add_peer(s(2), "addr-2").await?;

    tracing::info!("--- the server itself is never a peer");
    {
        peers.add_peer(s(LEADER), "addr-0").await?;
        assert_eq!(2, peers.len());
    }

    tracing::info!("--- duplicate");
    {
        let res = peers.add_peer(s(1), "addr-1b").await;
        assert_eq!(Err(PeerSetError::PeerExists { name: s(1) }), res);
        assert_eq!("addr-1", peers.get(&s(1)).unwrap().connection_string());
    }

    tracing::info!("--- not leading: no heartbeat");
    {
        assert!(peers.peers().all(|p| !p.is_running()));
    }

    tracing::info!("--- remove");
    {
        let info = peers.remove_peer(&s(2)).await?;
        assert_eq!(
            PeerInfo {
                name: s(2),
                connection_string: "addr-2".to_string(),
                matched_index: 0,
            },
            info
        );

        let res = peers.remove_peer(&s(2)).await;
        assert_eq!(Err(PeerSetError::PeerNotFound { name: s(2) }), res);

        let names = peers.infos().into_iter().map(|x| x.name);
        assert_eq!(vec![s(1)], names.collect::<Vec<_>>());
    }

    Ok(())
}

/// A removed member receives a last flush, e.g., carrying the entry that
/// removes it from the cluster.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn remove_flushes_once() -> Result<()> {
    let config = Config {
        heartbeat_interval: 60_000,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1])?;
    let mut peers = c.peer_set();

    peers.add_peer(s(1), "addr-1").await?;
    peers.become_leader(0).await?;

    let last = c.write(3);

    let info = peers.remove_peer(&s(1)).await?;

    assert_eq!(last, info.matched_index);
    assert_eq!(1, c.net.rpc_count(&s(1), RPCTypes::AppendEntries));
    assert_eq!(last, c.follower_last_index(1));

    Ok(())
}

/// A member added while leading starts replicating at once.
#[async_entry::test(
    worker_threads = 4,
    init = "init_default_ut_tracing()",
    tracing_span = "debug"
)]
async fn add_while_leading() -> Result<()> {
    let config = Config {
        heartbeat_interval: 10,
        ..Default::default()
    };
    let c = Cluster::new(config, 1, &[1])?;
    let last = c.write(3);

    let mut peers = c.peer_set();
    peers.become_leader(last).await?;
    assert!(peers.is_leading());

    peers.add_peer(s(1), "addr-1").await?;
    assert!(peers.get(&s(1)).unwrap().is_running());

    c.wait_follower(1, last, Duration::from_secs(2)).await?;

    peers.step_down().await;
    Ok(())
}
