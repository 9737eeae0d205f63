//! Inproc SUB and PUB sockets.

use std::time::Duration;

use bytes::Bytes;
use flume::{Receiver, RecvTimeoutError, TryRecvError};
use tracing::{debug, trace};

use super::context::{InprocContext, SlotId};
use crate::endpoint::{validate_endpoint, Address};
use crate::error::{CadenceError, Result};
use crate::message::Message;
use crate::options::SocketOptions;
use crate::transport::{PubSocket, SubSocket};

/// Subscriber for one inproc endpoint.
///
/// Dropping the socket detaches its queue from the context.
#[derive(Debug)]
pub struct InprocSubSocket {
    context: InprocContext,
    endpoint: String,
    slot: SlotId,
    rx: Receiver<Bytes>,
    options: SocketOptions,
}

impl InprocSubSocket {
    /// Check if at least one frame is queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Number of queued frames.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Options the socket was connected with.
    #[must_use]
    pub const fn options(&self) -> &SocketOptions {
        &self.options
    }

    pub(crate) const fn context(&self) -> &InprocContext {
        &self.context
    }

    fn try_receive(&self) -> Result<Option<Message>> {
        match self.rx.try_recv() {
            Ok(frame) => Ok(Some(Message::from_bytes(frame))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(CadenceError::SocketClosed),
        }
    }
}

impl SubSocket for InprocSubSocket {
    type Context = InprocContext;

    fn connect_with_options(
        context: &InprocContext,
        endpoint: &str,
        address: &str,
        options: SocketOptions,
    ) -> Result<Self> {
        let endpoint = validate_endpoint(endpoint)?;
        let address = Address::parse(address)?;
        if !address.is_loopback() {
            return Err(CadenceError::connect(
                endpoint,
                format!("inproc transport cannot reach remote address '{address}'"),
            ));
        }

        let (slot, rx) = context.attach(endpoint, &options);
        debug!(
            "[SUB] Connected to inproc '{}' (slot {}, conflate={})",
            endpoint, slot, options.conflate
        );
        Ok(Self {
            context: context.clone(),
            endpoint: endpoint.to_string(),
            slot,
            rx,
            options,
        })
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.options.recv_timeout = timeout;
    }

    fn receive(&mut self, non_blocking: bool) -> Result<Option<Message>> {
        if non_blocking {
            return self.try_receive();
        }
        match self.options.recv_timeout {
            Some(timeout) if timeout.is_zero() => self.try_receive(),
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(frame) => Ok(Some(Message::from_bytes(frame))),
                Err(RecvTimeoutError::Timeout) => {
                    trace!("[SUB] '{}' receive timed out", self.endpoint);
                    Ok(None)
                }
                Err(RecvTimeoutError::Disconnected) => Err(CadenceError::SocketClosed),
            },
            None => self
                .rx
                .recv()
                .map(|frame| Some(Message::from_bytes(frame)))
                .map_err(|_| CadenceError::SocketClosed),
        }
    }

    fn queued(&self) -> usize {
        self.pending()
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for InprocSubSocket {
    fn drop(&mut self) {
        trace!("[SUB] Detaching from inproc '{}'", self.endpoint);
        self.context.detach(&self.endpoint, self.slot);
    }
}

/// Publisher for one inproc endpoint.
///
/// Several publishers may share an endpoint; subscribers see the union.
#[derive(Debug)]
pub struct InprocPubSocket {
    context: InprocContext,
    endpoint: String,
}

impl InprocPubSocket {
    /// Number of subscribers the next send would reach.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.context.subscriber_count(&self.endpoint)
    }
}

impl PubSocket for InprocPubSocket {
    type Context = InprocContext;

    fn connect_with_options(
        context: &InprocContext,
        endpoint: &str,
        _options: SocketOptions,
    ) -> Result<Self> {
        let endpoint = validate_endpoint(endpoint)?;
        debug!("[PUB] Publishing inproc '{}'", endpoint);
        Ok(Self {
            context: context.clone(),
            endpoint: endpoint.to_string(),
        })
    }

    fn send(&mut self, data: &[u8]) -> Result<usize> {
        self.context
            .publish(&self.endpoint, &Bytes::copy_from_slice(data));
        Ok(data.len())
    }

    fn send_message(&mut self, message: &Message) -> Result<usize> {
        let frame = message.clone().into_bytes();
        self.context.publish(&self.endpoint, &frame);
        Ok(frame.len())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
