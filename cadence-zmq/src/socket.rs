//! ZMQ SUB and PUB sockets.

use std::time::Duration;

use cadence_core::endpoint::{tcp_bind_uri, tcp_connect_uri, validate_endpoint, Address};
use cadence_core::error::{CadenceError, Result};
use cadence_core::message::Message;
use cadence_core::options::SocketOptions;
use cadence_core::transport::{PubSocket, SubSocket};
use tracing::{debug, trace};

use crate::as_zmq_int;
use crate::context::ZmqContext;

fn timeout_ms(timeout: Option<Duration>) -> i32 {
    timeout.map_or(-1, |t| i32::try_from(t.as_millis()).unwrap_or(i32::MAX))
}

/// SUB socket for one topic.
pub struct ZmqSubSocket {
    // Declared before `_context` so the socket closes before the context drops.
    socket: zmq::Socket,
    _context: ZmqContext,
    endpoint: String,
    // libzmq cannot count its queue; this is the most it holds.
    capacity: usize,
}

impl ZmqSubSocket {
    pub(crate) const fn raw(&self) -> &zmq::Socket {
        &self.socket
    }
}

impl SubSocket for ZmqSubSocket {
    type Context = ZmqContext;

    fn connect_with_options(
        context: &ZmqContext,
        endpoint: &str,
        address: &str,
        options: SocketOptions,
    ) -> Result<Self> {
        let endpoint = validate_endpoint(endpoint)?;
        let address = Address::parse(address)?;
        let uri = tcp_connect_uri(&address, endpoint);
        let fail = |e: zmq::Error| CadenceError::connect(endpoint, format!("{uri}: {e}"));

        let socket = context.raw().socket(zmq::SUB).map_err(fail)?;
        // ZMQ_CONFLATE must be set before connecting.
        if options.conflate {
            socket.set_conflate(true).map_err(fail)?;
        }
        socket.set_rcvhwm(as_zmq_int(options.recv_hwm)).map_err(fail)?;
        socket.set_rcvtimeo(timeout_ms(options.recv_timeout)).map_err(fail)?;
        socket.set_linger(timeout_ms(Some(options.linger))).map_err(fail)?;
        socket.set_subscribe(b"").map_err(fail)?;
        socket.connect(&uri).map_err(fail)?;

        debug!(
            "[SUB] Connected to '{}' at {} (conflate={})",
            endpoint, uri, options.conflate
        );
        Ok(Self {
            socket,
            _context: context.clone(),
            endpoint: endpoint.to_string(),
            // A receive HWM of 0 means unbounded to libzmq.
            capacity: match (options.conflate, options.recv_hwm) {
                (true, _) => 1,
                (false, 0) => usize::MAX,
                (false, hwm) => hwm,
            },
        })
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        if let Err(e) = self.socket.set_rcvtimeo(timeout_ms(timeout)) {
            debug!("[SUB] '{}' failed to set receive timeout: {}", self.endpoint, e);
        }
    }

    fn receive(&mut self, non_blocking: bool) -> Result<Option<Message>> {
        let flags = if non_blocking { zmq::DONTWAIT } else { 0 };
        match self.socket.recv_bytes(flags) {
            Ok(frame) => Ok(Some(Message::from(frame))),
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(zmq::Error::EINTR) => {
                trace!("[SUB] '{}' receive interrupted", self.endpoint);
                Ok(None)
            }
            Err(e) => Err(CadenceError::receive(&self.endpoint, e)),
        }
    }

    fn queued(&self) -> usize {
        self.capacity
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// PUB socket for one topic.
pub struct ZmqPubSocket {
    socket: zmq::Socket,
    _context: ZmqContext,
    endpoint: String,
}

impl PubSocket for ZmqPubSocket {
    type Context = ZmqContext;

    fn connect_with_options(
        context: &ZmqContext,
        endpoint: &str,
        options: SocketOptions,
    ) -> Result<Self> {
        let endpoint = validate_endpoint(endpoint)?;
        let uri = tcp_bind_uri(endpoint);
        let fail = |e: zmq::Error| CadenceError::connect(endpoint, format!("{uri}: {e}"));

        let socket = context.raw().socket(zmq::PUB).map_err(fail)?;
        socket.set_sndhwm(as_zmq_int(options.send_hwm)).map_err(fail)?;
        socket.set_linger(timeout_ms(Some(options.linger))).map_err(fail)?;
        socket.bind(&uri).map_err(fail)?;

        debug!("[PUB] Bound '{}' at {}", endpoint, uri);
        Ok(Self {
            socket,
            _context: context.clone(),
            endpoint: endpoint.to_string(),
        })
    }

    fn send(&mut self, data: &[u8]) -> Result<usize> {
        self.socket
            .send(data, zmq::DONTWAIT)
            .map_err(|e| CadenceError::send(&self.endpoint, e))?;
        Ok(data.len())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for ZmqSubSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqSubSocket")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ZmqPubSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqPubSocket")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
