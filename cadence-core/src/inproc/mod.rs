//! In-process transport for pub/sub between components of one process.
//!
//! The inproc backend is the reference implementation of the transport traits.
//! Publishers and subscribers meet by endpoint name inside an
//! [`InprocContext`]; there is no process-global registry, so two contexts
//! never see each other's topics.
//!
//! # Features
//!
//! - **Zero-copy fan-out**: one `Bytes` handle per subscriber, not one copy
//! - **Late joiners miss earlier frames**: only current subscribers are served
//! - **Conflation**: a conflating subscriber keeps only the newest frame
//! - **High water mark**: a full queue drops new frames instead of blocking
//!
//! # Usage
//!
//! ```rust
//! use cadence_core::inproc::{InprocContext, InprocPoller, InprocPubSocket, InprocSubSocket};
//! use cadence_core::transport::{Context, Poller, PubSocket, SubSocket};
//!
//! # fn example() -> cadence_core::error::Result<()> {
//! let ctx = InprocContext::create()?;
//! let sub = InprocSubSocket::connect(&ctx, "carState", "127.0.0.1", true)?;
//! let mut publisher = InprocPubSocket::connect(&ctx, "carState")?;
//!
//! let mut poller = InprocPoller::new();
//! let id = poller.register_socket(sub);
//!
//! publisher.send(b"hello")?;
//! let ready = poller.poll(100)?;
//! assert_eq!(ready.as_slice(), &[id]);
//!
//! let frame = poller.socket_mut(id).unwrap().receive(true)?.unwrap();
//! assert_eq!(frame.data(), b"hello");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod context;
mod poller;
mod socket;

pub use context::InprocContext;
pub use poller::InprocPoller;
pub use socket::{InprocPubSocket, InprocSubSocket};

use crate::transport::Transport;

/// The in-process backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct InprocTransport;

impl Transport for InprocTransport {
    const NAME: &'static str = "inproc";

    type Context = InprocContext;
    type SubSocket = InprocSubSocket;
    type PubSocket = InprocPubSocket;
    type Poller = InprocPoller;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Context, Poller, PubSocket, SubSocket};
    use std::time::{Duration, Instant};

    #[test]
    fn test_remote_address_is_unreachable() {
        let ctx = InprocContext::create().unwrap();
        let err = InprocSubSocket::connect(&ctx, "carState", "10.0.0.7", false).unwrap_err();
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_invalid_endpoint() {
        let ctx = InprocContext::create().unwrap();
        assert!(InprocSubSocket::create(&ctx, "").is_err());
        assert!(InprocPubSocket::connect(&ctx, "bad name").is_err());
    }

    #[test]
    fn test_sockets_hold_context() {
        let ctx = InprocContext::create().unwrap();
        let sub = InprocSubSocket::create(&ctx, "a").unwrap();
        let publisher = InprocPubSocket::connect(&ctx, "a").unwrap();
        assert_eq!(ctx.handle_count(), 3);
        drop(sub);
        drop(publisher);
        assert_eq!(ctx.handle_count(), 1);
        assert_eq!(ctx.subscriber_count("a"), 0);
    }

    #[test]
    fn test_nonblocking_receive_on_empty() {
        let ctx = InprocContext::create().unwrap();
        let mut sub = InprocSubSocket::create(&ctx, "empty").unwrap();
        assert!(sub.receive(true).unwrap().is_none());
    }

    #[test]
    fn test_blocking_receive_honours_timeout() {
        let ctx = InprocContext::create().unwrap();
        let mut sub = InprocSubSocket::create(&ctx, "quiet").unwrap();
        sub.set_timeout(Some(Duration::from_millis(10)));
        let start = Instant::now();
        assert!(sub.receive(false).unwrap().is_none());
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_poll_timeout_returns_empty() {
        let ctx = InprocContext::create().unwrap();
        let (mut poller, _) =
            InprocPoller::with_sockets([InprocSubSocket::create(&ctx, "idle").unwrap()]);
        let start = Instant::now();
        assert!(poller.poll(20).unwrap().is_empty());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_poll_empty_poller() {
        let mut poller = InprocPoller::new();
        assert!(poller.poll(0).unwrap().is_empty());
        assert!(poller.poll(-1).is_err());
    }
}
