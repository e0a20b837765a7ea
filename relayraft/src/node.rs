/// `NodeId` uniquely identifies a member of the cluster.
///
/// It is the `name` of a [`Peer`](crate::peer::Peer) on the leader side and
/// the `leader_id`/`candidate_id` carried in outgoing RPCs.
pub type NodeId = String;
