//! The transport interface the peers send requests through.

use openraft_macros::add_async_trait;

pub use crate::network::connection::Connection;
use crate::NodeId;
use crate::TypeConfig;

pub mod connection;

/// A factory of [`Connection`]s to cluster members.
///
/// Typically, the network implementation as such will be hidden behind a
/// `Box<T>` or `Arc<T>` and this interface implemented on the `Box<T>` or
/// `Arc<T>`.
#[add_async_trait]
pub trait Network<C>: Clone + Send + Sync + 'static
where C: TypeConfig
{
    /// Actual type of the network handling a single connection.
    type Connection: Connection<C>;

    /// Create a client sending requests to the target node at `address`.
    ///
    /// This function should **not** connect but rather build a client that
    /// will connect when required. It does not return an error: a client that
    /// can not reach its target just fails every request it sends, and the
    /// peer treats that as an absent response.
    async fn new_connection(
        &mut self,
        target: NodeId,
        address: &str,
    ) -> Self::Connection;
}
