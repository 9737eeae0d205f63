//! libzmq backend for cadence.
//!
//! Each topic is a PUB/SUB pair on its own TCP port, derived from the topic
//! name with [`cadence_core::endpoint::port_for`] so publishers and subscribers
//! in different processes agree without a broker:
//!
//! - PUB binds `tcp://*:<port>`
//! - SUB connects `tcp://<address>:<port>` and subscribes to everything
//!
//! Sends use `ZMQ_DONTWAIT`: a publisher never blocks on slow subscribers, and
//! frames beyond the high water mark are dropped by libzmq.

mod context;
mod poller;
mod socket;

pub use context::ZmqContext;
pub use poller::ZmqPoller;
pub use socket::{ZmqPubSocket, ZmqSubSocket};

use cadence_core::transport::Transport;

/// The libzmq backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZmqTransport;

impl Transport for ZmqTransport {
    const NAME: &'static str = "zmq";

    type Context = ZmqContext;
    type SubSocket = ZmqSubSocket;
    type PubSocket = ZmqPubSocket;
    type Poller = ZmqPoller;
}

/// Saturating conversion for libzmq's `int` options.
pub(crate) fn as_zmq_int(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
