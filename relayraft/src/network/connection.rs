use openraft_macros::add_async_trait;

use crate::errors::RPCError;
use crate::rpc::AppendEntriesRequest;
use crate::rpc::AppendEntriesResponse;
use crate::rpc::RequestVote;
use crate::rpc::SnapshotRecoveryRequest;
use crate::rpc::SnapshotRecoveryResponse;
use crate::rpc::SnapshotRequest;
use crate::rpc::SnapshotResponse;
use crate::rpc::VoteReply;
use crate::TypeConfig;

/// A client sending requests to a single target node.
///
/// Every method returns `Err` when no response was received. A response that
/// rejects the request is returned as `Ok` with its `success` flag unset.
#[add_async_trait]
pub trait Connection<C>: Send + Sync + 'static
where C: TypeConfig
{
    /// Send an AppendEntries RPC to the target.
    async fn append_entries(
        &mut self,
        rpc: AppendEntriesRequest<C>,
    ) -> Result<AppendEntriesResponse, RPCError>;

    /// Offer a snapshot to the target.
    async fn snapshot(
        &mut self,
        rpc: SnapshotRequest,
    ) -> Result<SnapshotResponse, RPCError>;

    /// Send the snapshot data to the target after it accepted the offer.
    async fn snapshot_recovery(
        &mut self,
        rpc: SnapshotRecoveryRequest,
    ) -> Result<SnapshotRecoveryResponse, RPCError>;

    /// Send a RequestVote RPC to the target.
    async fn request_vote(
        &mut self,
        rpc: RequestVote,
    ) -> Result<VoteReply, RPCError>;
}
