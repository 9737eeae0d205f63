//! ZMQ poller.

use cadence_core::error::{CadenceError, Result};
use cadence_core::transport::{Poller, ReadySet, SocketId};
use smallvec::SmallVec;
use tracing::trace;

use crate::socket::ZmqSubSocket;

/// `zmq_poll` over owned SUB sockets.
#[derive(Debug, Default)]
pub struct ZmqPoller {
    sockets: Vec<ZmqSubSocket>,
}

impl Poller for ZmqPoller {
    type Socket = ZmqSubSocket;

    fn new() -> Self {
        Self::default()
    }

    fn register_socket(&mut self, socket: ZmqSubSocket) -> SocketId {
        self.sockets.push(socket);
        SocketId(self.sockets.len() - 1)
    }

    fn poll(&mut self, timeout_ms: i32) -> Result<ReadySet> {
        let mut items: SmallVec<[zmq::PollItem<'_>; 16]> = self
            .sockets
            .iter()
            .map(|s| s.raw().as_poll_item(zmq::POLLIN))
            .collect();

        match zmq::poll(&mut items, i64::from(timeout_ms)) {
            Ok(0) | Err(zmq::Error::EINTR) => return Ok(ReadySet::new()),
            Ok(_) => {}
            Err(e) => return Err(CadenceError::Poll(e.to_string())),
        }

        let ready: ReadySet = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_readable())
            .map(|(i, _)| SocketId(i))
            .collect();
        trace!("[POLL] {} sockets ready", ready.len());
        Ok(ready)
    }

    fn socket_mut(&mut self, id: SocketId) -> Option<&mut ZmqSubSocket> {
        self.sockets.get_mut(id.0)
    }

    fn len(&self) -> usize {
        self.sockets.len()
    }
}
