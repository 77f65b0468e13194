//! The connection abstraction the pipeline consumes.
//!
//! This is the out-of-scope collaborator: the wire protocol, the socket,
//! and the connection pool all live elsewhere. The pipeline only needs to
//! send a command, learn about out-of-band invalidation pushes, and find
//! out when the connection is gone.

use crate::error::ConnectionError;
use csc_store::DatabaseKey;
use futures::future::BoxFuture;

/// A decoded, non-error reply to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A single value, e.g. the reply to `GET`.
    Bulk(Vec<u8>),
    /// Several values, e.g. the reply to `MGET` or `HGETALL`.
    Array(Vec<Vec<u8>>),
    /// No value, e.g. a missing key.
    Nil,
    /// A simple status reply, e.g. `OK` to `FLUSHALL`.
    Status(String),
}

/// An asynchronous, out-of-band push from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    /// The server is notifying the connection that the listed keys (or, if
    /// `None`, everything) changed since they were last read.
    Invalidate(Option<Vec<DatabaseKey>>),
}

/// The interface the invalidation pipeline needs from a live connection to
/// the database.
///
/// Implementations own the wire protocol, the socket, and RESP3 push-frame
/// recognition; the pipeline only calls these methods.
pub trait Connection: Send + Sync {
    /// Sends `cmd` with `args` and awaits its reply.
    fn send<'a>(&'a self, cmd: &'a str, args: &'a [Vec<u8>]) -> BoxFuture<'a, Result<Reply, ConnectionError>>;

    /// Drains any invalidation pushes that have already arrived, without
    /// blocking on a reply to any in-flight request.
    fn poll_invalidations(&self) -> BoxFuture<'_, Vec<PushMessage>>;

    /// Performs the "begin tracking" handshake: asks the server to push
    /// invalidation notifications for keys this connection reads.
    fn begin_tracking(&self) -> BoxFuture<'_, Result<(), ConnectionError>>;

    /// Whether the connection is still usable.
    fn is_connected(&self) -> bool;

    /// The negotiated wire protocol version (2 or 3).
    ///
    /// Push-type invalidation messages are only distinguishable from
    /// ordinary replies under protocol version 3; the pipeline refuses to
    /// start caching over an older connection.
    fn protocol_version(&self) -> u8;
}
