use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::network::Connection;
use crate::network::Network;
use crate::peer::reconcile::reconcile;
use crate::peer::reconcile::Step;
use crate::peer::PeerCore;
use crate::rpc::AppendEntriesRequest;
use crate::rpc::SnapshotRecoveryRequest;
use crate::rpc::SnapshotRequest;
use crate::server::Event;
use crate::server::PeerReply;
use crate::storage::LogReader;
use crate::storage::Snapshot;
use crate::TypeConfig;

impl<C, N, Log> PeerCore<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    /// Replicate to the peer once: send the entries after its matched index,
    /// or the snapshot if they are compacted.
    ///
    /// Returns the new heartbeat period if this flush changed it, i.e., the
    /// peer did not respond, or it responded after a series of failures.
    ///
    /// It never fails: an absent or rejecting response is dealt with here,
    /// and a storage error skips this round.
    pub(crate) async fn flush(
        &self,
        conn: &mut N::Connection,
    ) -> Option<Duration> {
        let matched = self.matched_index();
        let term = self.ctx.current_term();
        let max = self.ctx.config().max_payload_entries;

        debug!(
            peer = display(&self.name),
            matched, term, "{}: flush", func_name!()
        );

        let mut log = self.ctx.log();

        let after = match log.entries_after(matched, max).await {
            Ok(x) => x,
            Err(err) => {
                error!(
                    peer = display(&self.name),
                    error = display(&err),
                    "{}: failed to read entries after {}, skip",
                    func_name!(),
                    matched
                );
                return None;
            }
        };

        let Some(after) = after else {
            return self.send_snapshot(conn).await;
        };

        let commit_index = match log.commit_index().await {
            Ok(x) => x,
            Err(err) => {
                error!(
                    peer = display(&self.name),
                    error = display(&err),
                    "{}: failed to read commit index, skip",
                    func_name!()
                );
                return None;
            }
        };

        let req = AppendEntriesRequest::new(
            term,
            matched,
            after.prev_log_term,
            commit_index,
            self.ctx.id().clone(),
            after.entries,
        );

        self.send_append_entries(conn, req).await
    }

    async fn send_append_entries(
        &self,
        conn: &mut N::Connection,
        req: AppendEntriesRequest<C>,
    ) -> Option<Duration> {
        let request_term = req.term;
        let last_sent = req.last_log_id();

        debug!(
            peer = display(&self.name),
            req = display(&req),
            "{}: send",
            func_name!()
        );

        let resp = match conn.append_entries(req).await {
            Ok(x) => x,
            Err(err) => {
                let (interval, failed_heartbeats) = self.back_off();

                debug!(
                    peer = display(&self.name),
                    error = display(&err),
                    failed_heartbeats,
                    "{}: no response, back off heartbeat to {:?}",
                    func_name!(),
                    interval
                );

                self.ctx.dispatch_event(Event::HeartbeatInterval {
                    target: self.name.clone(),
                    interval,
                    failed_heartbeats,
                });
                return Some(interval);
            }
        };

        debug!(
            peer = display(&self.name),
            resp = display(&resp),
            "{}: received",
            func_name!()
        );

        let local_term = self.ctx.current_term();

        let (new_period, reconciled) = {
            let mut st = self.state.lock().unwrap();

            let new_period = if st.backoff.is_backing_off() {
                st.backoff.reset();
                Some(st.heartbeat_interval)
            } else {
                None
            };

            let reconciled = reconcile(
                st.matched_index,
                local_term,
                request_term,
                last_sent,
                &resp,
            );
            st.matched_index = reconciled.matched_index;

            (new_period, reconciled)
        };

        if let Some(p) = new_period {
            info!(
                peer = display(&self.name),
                "{}: peer responds again, reset heartbeat to {:?}",
                func_name!(),
                p
            );
        }

        match reconciled.step {
            Step::HigherTerm => {
                info!(
                    peer = display(&self.name),
                    resp_term = resp.term,
                    local_term,
                    "{}: peer has seen a newer leader",
                    func_name!()
                );
            }
            step => {
                debug!(
                    peer = display(&self.name),
                    matched = reconciled.matched_index,
                    append = reconciled.append,
                    "{}: {}",
                    func_name!(),
                    step
                );
            }
        }

        self.ctx.send_async(PeerReply::AppendEntries {
            target: self.name.clone(),
            reply: resp,
            append: reconciled.append,
        });

        new_period
    }

    /// Increase the failure count and return the new period along with it.
    fn back_off(&self) -> (Duration, u32) {
        let max_exp = self.ctx.config().max_backoff_exponent;

        let mut st = self.state.lock().unwrap();
        st.backoff.fail();

        let interval = st.backoff.interval(st.heartbeat_interval, max_exp);
        (interval, st.backoff.failed_heartbeats())
    }

    /// Reset the back-off after the peer responded.
    ///
    /// Returns the base interval if the peer was backing off.
    fn reset_backoff(&self) -> Option<Duration> {
        let mut st = self.state.lock().unwrap();
        if !st.backoff.is_backing_off() {
            return None;
        }
        st.backoff.reset();
        let interval = st.heartbeat_interval;
        drop(st);

        info!(
            peer = display(&self.name),
            "{}: peer responds again, reset heartbeat to {:?}",
            func_name!(),
            interval
        );
        Some(interval)
    }

    /// Offer the snapshot, and send it if the peer accepts.
    ///
    /// The heartbeat does not back off on this path: the next tick simply
    /// tries again. A response of any kind resets an earlier back-off, and
    /// the base interval is returned then.
    async fn send_snapshot(&self, conn: &mut N::Connection) -> Option<Duration> {
        let Some(snapshot) = self.ctx.snapshot() else {
            warn!(
                peer = display(&self.name),
                "{}: entries after {} are compacted but there is no snapshot",
                func_name!(),
                self.matched_index()
            );
            return None;
        };

        let req = SnapshotRequest {
            leader_id: self.ctx.id().clone(),
            meta: snapshot.meta.clone(),
        };

        debug!(
            peer = display(&self.name),
            req = display(&req),
            "{}: offer snapshot",
            func_name!()
        );

        let resp = match conn.snapshot(req).await {
            Ok(x) => x,
            Err(err) => {
                debug!(
                    peer = display(&self.name),
                    error = display(&err),
                    "{}: no response to snapshot offer",
                    func_name!()
                );
                return None;
            }
        };

        let new_period = self.reset_backoff();

        if !resp.success {
            debug!(
                peer = display(&self.name),
                "{}: snapshot offer rejected",
                func_name!()
            );
            return new_period;
        }

        let recovery_period = self.send_snapshot_recovery(conn, snapshot).await;
        new_period.or(recovery_period)
    }

    /// Returns the base interval if a response reset the back-off.
    async fn send_snapshot_recovery(
        &self,
        conn: &mut N::Connection,
        snapshot: Arc<Snapshot>,
    ) -> Option<Duration> {
        let req = SnapshotRecoveryRequest {
            leader_id: self.ctx.id().clone(),
            snapshot: Snapshot::clone(&snapshot),
        };
        let last_index = req.last_index();

        debug!(
            peer = display(&self.name),
            req = display(&req),
            "{}: send snapshot",
            func_name!()
        );

        let resp = match conn.snapshot_recovery(req).await {
            Ok(x) => x,
            Err(err) => {
                debug!(
                    peer = display(&self.name),
                    error = display(&err),
                    "{}: no response to snapshot recovery",
                    func_name!()
                );
                return None;
            }
        };

        let new_period = self.reset_backoff();

        if !resp.success {
            debug!(
                peer = display(&self.name),
                resp = display(&resp),
                "{}: snapshot recovery rejected",
                func_name!()
            );
            return new_period;
        }

        self.set_matched_index(last_index);

        info!(
            peer = display(&self.name),
            matched = last_index,
            "{}: snapshot installed",
            func_name!()
        );

        self.ctx.send_async(PeerReply::SnapshotRecovery {
            target: self.name.clone(),
            reply: resp,
        });

        new_period
    }
}
