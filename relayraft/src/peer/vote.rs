use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::RPCError;
use crate::errors::Timeout;
use crate::network::Connection;
use crate::network::Network;
use crate::peer::Peer;
use crate::peer::PeerCore;
use crate::rpc::RequestVote;
use crate::server::VoteResult;
use crate::storage::LogReader;
use crate::TypeConfig;

impl<C, N, Log> Peer<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    /// Ask this peer for its vote, and deliver the reply to `tx`.
    ///
    /// The candidate id of `rpc` is set to this server's id. Nothing is
    /// delivered if the peer does not respond.
    pub async fn send_vote_request(
        &self,
        rpc: RequestVote,
        tx: mpsc::UnboundedSender<VoteResult>,
    ) {
        self.core.send_vote_request(rpc, tx).await
    }
}

impl<C, N, Log> PeerCore<C, N, Log>
where
    C: TypeConfig,
    N: Network<C>,
    Log: LogReader<C>,
{
    pub(crate) async fn send_vote_request(
        &self,
        mut rpc: RequestVote,
        tx: mpsc::UnboundedSender<VoteResult>,
    ) {
        rpc.candidate_id = self.ctx.id().clone();

        debug!(
            peer = display(&self.name),
            req = display(&rpc),
            "{}: send vote request",
            func_name!()
        );

        let mut conn = self.connect().await;

        let res = match self.ctx.config().vote_timeout_duration() {
            None => conn.request_vote(rpc).await,
            Some(ttl) => {
                match tokio::time::timeout(ttl, conn.request_vote(rpc)).await {
                    Ok(x) => x,
                    Err(_elapsed) => Err(RPCError::from(Timeout {
                        action: "request_vote".to_string(),
                        target: self.name.clone(),
                        timeout: ttl,
                    })),
                }
            }
        };

        let reply = match res {
            Ok(x) => x,
            Err(err) => {
                debug!(
                    peer = display(&self.name),
                    error = display(&err),
                    "{}: no vote reply",
                    func_name!()
                );
                return;
            }
        };

        debug!(
            peer = display(&self.name),
            reply = display(&reply),
            "{}: received vote reply",
            func_name!()
        );

        let res = tx.send(VoteResult {
            voter: self.name.clone(),
            reply,
        });
        if res.is_err() {
            debug!(
                peer = display(&self.name),
                "{}: vote results receiver is closed",
                func_name!()
            );
        }
    }
}
