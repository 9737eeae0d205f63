//! Transport capability traits.
//!
//! The orchestration layer (`SubMaster`, `PubMaster`) is written against these
//! traits only. Each backend supplies one implementation of every primitive
//! and ties them together with a [`Transport`] marker type.
//!
//! ```text
//! Context ──creates──▶ SubSocket ──registered with──▶ Poller
//!    │                                                  │
//!    └────creates──▶ PubSocket                 poll() ─▶ ReadySet of SocketId
//! ```

use std::time::Duration;

use smallvec::SmallVec;

use crate::error::Result;
use crate::message::Message;
use crate::options::{SocketOptions, DEFAULT_ADDRESS};

/// Identity of a socket inside the [`Poller`] that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(pub usize);

/// Sockets with pending data after a poll.
///
/// Inline up to 16 ids without heap allocation.
pub type ReadySet = SmallVec<[SocketId; 16]>;

/// Process-wide transport handle.
///
/// Cloning shares the handle; the backing resources are released when the last
/// clone (sockets hold one each) is dropped.
pub trait Context: Clone + Send + Sync + 'static {
    /// Create a new context. Failure means no socket can ever be created.
    fn create() -> Result<Self>;
}

/// Subscriber side of a topic.
pub trait SubSocket: Sized {
    /// Context type this socket is created from.
    type Context: Context;

    /// Connect to `endpoint` published at `address` with explicit options.
    fn connect_with_options(
        context: &Self::Context,
        endpoint: &str,
        address: &str,
        options: SocketOptions,
    ) -> Result<Self>;

    /// Connect to `endpoint` published at `address`.
    ///
    /// With `conflate`, only the newest unread message is retained.
    fn connect(
        context: &Self::Context,
        endpoint: &str,
        address: &str,
        conflate: bool,
    ) -> Result<Self> {
        Self::connect_with_options(
            context,
            endpoint,
            address,
            SocketOptions::default().with_conflate(conflate),
        )
    }

    /// Connect to a local `endpoint` without conflation.
    fn create(context: &Self::Context, endpoint: &str) -> Result<Self> {
        Self::connect(context, endpoint, DEFAULT_ADDRESS, false)
    }

    /// Set the timeout used by blocking receives (`None` waits forever).
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Receive the next queued frame.
    ///
    /// Returns `Ok(None)` when nothing is queued (`non_blocking`) or the
    /// receive timeout elapsed. That is the normal steady state, not an error.
    fn receive(&mut self, non_blocking: bool) -> Result<Option<Message>>;

    /// Frames waiting in this socket's receive queue right now.
    ///
    /// Backends that cannot count their queue return its capacity. Used to
    /// bound a drain so a publisher that keeps sending cannot stall it.
    fn queued(&self) -> usize;

    /// Topic this socket is subscribed to.
    fn endpoint(&self) -> &str;
}

/// Publisher side of a topic.
pub trait PubSocket: Sized {
    /// Context type this socket is created from.
    type Context: Context;

    /// Open a publisher for `endpoint` with explicit options.
    fn connect_with_options(
        context: &Self::Context,
        endpoint: &str,
        options: SocketOptions,
    ) -> Result<Self>;

    /// Open a publisher for `endpoint`.
    fn connect(context: &Self::Context, endpoint: &str) -> Result<Self> {
        Self::connect_with_options(context, endpoint, SocketOptions::default())
    }

    /// Best-effort broadcast of `data` to every current subscriber.
    ///
    /// Having no subscribers is not an error; the frame is dropped. Returns
    /// the number of bytes handed to the transport.
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Broadcast a prepared frame.
    fn send_message(&mut self, message: &Message) -> Result<usize> {
        self.send(message.data())
    }

    /// Topic this socket publishes.
    fn endpoint(&self) -> &str;
}

/// Readiness multiplexer over a set of owned subscriber sockets.
pub trait Poller: Sized {
    /// Socket type this poller multiplexes.
    type Socket: SubSocket;

    /// Create an empty poller.
    fn new() -> Self;

    /// Take ownership of `socket` and return its identity.
    fn register_socket(&mut self, socket: Self::Socket) -> SocketId;

    /// Block for at most `timeout_ms` (forever when negative) or until at
    /// least one registered socket has data, and return those sockets.
    ///
    /// An empty set means the timeout elapsed.
    fn poll(&mut self, timeout_ms: i32) -> Result<ReadySet>;

    /// Access a registered socket.
    fn socket_mut(&mut self, id: SocketId) -> Option<&mut Self::Socket>;

    /// Number of registered sockets.
    fn len(&self) -> usize;

    /// Check if no sockets are registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a poller that owns `sockets`, returning their ids in order.
    fn with_sockets<I>(sockets: I) -> (Self, Vec<SocketId>)
    where
        I: IntoIterator<Item = Self::Socket>,
    {
        let mut poller = Self::new();
        let ids = sockets
            .into_iter()
            .map(|s| poller.register_socket(s))
            .collect();
        (poller, ids)
    }
}

/// Bundle of one backend's primitives.
pub trait Transport: 'static {
    /// Backend name for logs.
    const NAME: &'static str;

    /// Process-wide handle.
    type Context: Context;
    /// Subscriber socket.
    type SubSocket: SubSocket<Context = Self::Context>;
    /// Publisher socket.
    type PubSocket: PubSocket<Context = Self::Context>;
    /// Poller over this backend's subscriber sockets.
    type Poller: Poller<Socket = Self::SubSocket>;
}
