//! ZMQ context handle.

use cadence_core::error::Result;
use cadence_core::transport::Context;

/// Shared libzmq context.
///
/// `zmq::Context` is itself refcounted; the underlying `zmq_ctx` is terminated
/// when the last clone, including the ones held by sockets, is dropped.
#[derive(Clone)]
pub struct ZmqContext {
    inner: zmq::Context,
}

impl ZmqContext {
    /// Borrow the raw libzmq context.
    #[must_use]
    pub const fn raw(&self) -> &zmq::Context {
        &self.inner
    }
}

impl Context for ZmqContext {
    fn create() -> Result<Self> {
        Ok(Self {
            inner: zmq::Context::new(),
        })
    }
}

impl std::fmt::Debug for ZmqContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqContext").finish_non_exhaustive()
    }
}
