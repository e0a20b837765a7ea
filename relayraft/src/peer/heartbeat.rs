use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::Interval;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::warn;
use tracing::Instrument;
use tracing::Level;

use crate::errors::HeartbeatError;
use crate::network::Network;
use crate::peer::Peer;
use crate::peer::PeerCore;
use crate::server::Event;
use crate::storage::LogReader;
use crate::TypeConfig;

/// `tokio::time::interval` panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// The life cycle of a peer's heartbeat loop: `Idle -> Running -> Stopped`.
///
/// `Flushing` marks a flush outside of the loop, made from `Idle` or
/// `Stopped`; it goes back to that state when the flush is done.
pub(crate) enum HeartbeatState {
    Idle,
    Flushing { stopped: bool },
    Running(HeartbeatHandle),
    Stopped,
}

/// Holds a peer in [`HeartbeatState::Flushing`] until dropped.
pub(crate) struct FlushGuard<'a> {
    heartbeat: &'a Mutex<HeartbeatState>,
    stopped: bool,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let mut hb = self.heartbeat.lock().unwrap();
        *hb = if self.stopped {
            HeartbeatState::Stopped
        } else {
            HeartbeatState::Idle
        };
    }
}

/// What is needed to stop a running heartbeat loop.
pub(crate) struct HeartbeatHandle {
    /// Sends the `flush` flag of the stop request.
    tx_stop: oneshot::Sender<bool>,
    join_handle: JoinHandle<()>,
}

impl<C, N, Log> Peer<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    /// Spawn the heartbeat loop of this peer and wait until it runs.
    ///
    /// The first tick fires one heartbeat interval after the loop starts.
    pub async fn start_heartbeat(&self) -> Result<(), HeartbeatError> {
        let (tx_started, rx_started) = oneshot::channel();

        {
            let mut hb = self.heartbeat.lock().unwrap();
            match &*hb {
                HeartbeatState::Idle => {}
                HeartbeatState::Flushing { .. } => {
                    return Err(HeartbeatError::Flushing {
                        target: self.core.name.clone(),
                    });
                }
                HeartbeatState::Running(_) => {
                    return Err(HeartbeatError::AlreadyRunning {
                        target: self.core.name.clone(),
                    });
                }
                HeartbeatState::Stopped => {
                    return Err(HeartbeatError::Stopped {
                        target: self.core.name.clone(),
                    });
                }
            }

            let (tx_stop, rx_stop) = oneshot::channel();

            let span = tracing::span!(
                Level::DEBUG,
                "heartbeat",
                leader = display(self.core.ctx.id()),
                peer = display(&self.core.name)
            );
            let core = self.core.clone();
            let join_handle = tokio::spawn(
                core.heartbeat_loop(tx_started, rx_stop).instrument(span),
            );

            *hb = HeartbeatState::Running(HeartbeatHandle {
                tx_stop,
                join_handle,
            });
        }

        if rx_started.await.is_err() {
            warn!(
                "{}: heartbeat loop of {} quit before it started",
                func_name!(),
                self.core.name
            );

            let mut hb = self.heartbeat.lock().unwrap();
            if matches!(&*hb, HeartbeatState::Running(_)) {
                *hb = HeartbeatState::Idle;
            }

            return Err(HeartbeatError::Quit {
                target: self.core.name.clone(),
            });
        }

        Ok(())
    }

    /// Mark this peer as flushing outside of the heartbeat loop.
    ///
    /// Fails if the loop is running or another flush is in progress, so that
    /// the flushes of a peer never overlap.
    pub(crate) fn begin_flush(&self) -> Result<FlushGuard<'_>, HeartbeatError> {
        let mut hb = self.heartbeat.lock().unwrap();

        let stopped = match &*hb {
            HeartbeatState::Idle => false,
            HeartbeatState::Stopped => true,
            HeartbeatState::Running(_) => {
                return Err(HeartbeatError::AlreadyRunning {
                    target: self.core.name.clone(),
                });
            }
            HeartbeatState::Flushing { .. } => {
                return Err(HeartbeatError::Flushing {
                    target: self.core.name.clone(),
                });
            }
        };

        *hb = HeartbeatState::Flushing { stopped };
        Ok(FlushGuard {
            heartbeat: &self.heartbeat,
            stopped,
        })
    }

    /// Stop the heartbeat loop.
    ///
    /// With `flush`, the loop replicates one last time before it quits, e.g.,
    /// to deliver the entry that removes this peer from the cluster.
    ///
    /// The returned handle resolves when the loop has quit. A stopped
    /// heartbeat can not be started again.
    pub fn stop_heartbeat(
        &self,
        flush: bool,
    ) -> Result<JoinHandle<()>, HeartbeatError> {
        let mut hb = self.heartbeat.lock().unwrap();

        let state = std::mem::replace(&mut *hb, HeartbeatState::Stopped);
        match state {
            HeartbeatState::Running(handle) => {
                debug!(
                    peer = display(&self.core.name),
                    flush,
                    "{}: stop heartbeat",
                    func_name!()
                );

                if handle.tx_stop.send(flush).is_err() {
                    warn!(
                        "{}: heartbeat loop of {} already quit",
                        func_name!(),
                        self.core.name
                    );
                }
                Ok(handle.join_handle)
            }
            HeartbeatState::Idle | HeartbeatState::Flushing { .. } => {
                *hb = state;
                Err(HeartbeatError::NotRunning {
                    target: self.core.name.clone(),
                })
            }
            HeartbeatState::Stopped => Err(HeartbeatError::NotRunning {
                target: self.core.name.clone(),
            }),
        }
    }
}

impl<C, N, Log> PeerCore<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    pub(crate) async fn heartbeat_loop(
        self: Arc<Self>,
        tx_started: oneshot::Sender<()>,
        mut rx_stop: oneshot::Receiver<bool>,
    ) {
        let mut conn = self.connect().await;

        let period = self.heartbeat_period();
        let mut ticker = new_ticker(period);

        debug!("heartbeat loop started, period: {:?}", period);
        let _ = tx_started.send(());

        loop {
            futures::select_biased! {
                stop = (&mut rx_stop).fuse() => {
                    // A dropped peer stops its loop without flushing.
                    let flush = stop.unwrap_or(false);
                    if flush {
                        self.flush(&mut conn).await;
                        debug!("heartbeat stopped with flush");
                    } else {
                        debug!("heartbeat stopped");
                    }
                    return;
                }

                _ = ticker.tick().fuse() => {
                    let start = Instant::now();
                    let new_period = self.flush(&mut conn).await;
                    let duration = start.elapsed();

                    self.ctx.dispatch_event(Event::Heartbeat {
                        target: self.name.clone(),
                        duration,
                    });

                    if let Some(p) = new_period {
                        debug!("reschedule heartbeat, period: {:?}", p);
                        ticker = new_ticker(p);
                    }
                }
            }
        }
    }
}

/// A ticker that fires every `period`, starting one `period` from now.
///
/// A tick delayed by a slow flush does not cause a burst of ticks to catch up.
fn new_ticker(period: Duration) -> Interval {
    let period = period.max(MIN_PERIOD);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
