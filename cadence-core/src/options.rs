//! Socket configuration options
//!
//! Options shared by every backend. Names follow libzmq's socket options
//! where one exists.

use std::time::Duration;

/// Default receive high water mark in messages.
pub const DEFAULT_RECV_HWM: usize = 1000;

/// Default send high water mark in messages.
pub const DEFAULT_SEND_HWM: usize = 1000;

/// Upper bound on distinct peers sharing one topic buffer.
///
/// A sizing hint for transports, not a correctness limit.
pub const MSG_MULTIPLE_PUBLISHERS: usize = 100;

/// Address used when a subscriber is not told where its topic lives.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Socket configuration options.
///
/// # Examples
///
/// ```
/// use cadence_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_conflate(true)
///     .with_recv_timeout(Some(Duration::from_millis(100)));
/// assert!(opts.conflate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    /// Receive timeout (ZMQ_RCVTIMEO) for blocking receives.
    ///
    /// - `None`: Block indefinitely (default)
    /// - `Some(Duration::ZERO)`: Behave like a non-blocking receive
    /// - `Some(duration)`: Wait up to duration, then report no data
    pub recv_timeout: Option<Duration>,

    /// High water mark for receiving (ZMQ_RCVHWM)
    ///
    /// Messages arriving while this many are queued are dropped.
    pub recv_hwm: usize,

    /// High water mark for sending (ZMQ_SNDHWM)
    pub send_hwm: usize,

    /// Conflate messages (ZMQ_CONFLATE)
    ///
    /// - `false` (default): Queue all messages
    /// - `true`: Keep only the newest unread message
    pub conflate: bool,

    /// Linger timeout (ZMQ_LINGER) applied when a socket closes.
    ///
    /// Fire-and-forget pub/sub discards pending frames by default.
    pub linger: Duration,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            recv_timeout: None,
            recv_hwm: DEFAULT_RECV_HWM,
            send_hwm: DEFAULT_SEND_HWM,
            conflate: false,
            linger: Duration::ZERO,
        }
    }
}

impl SocketOptions {
    /// Set the blocking receive timeout.
    #[must_use]
    pub const fn with_recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Set the receive high water mark.
    #[must_use]
    pub const fn with_recv_hwm(mut self, hwm: usize) -> Self {
        self.recv_hwm = hwm;
        self
    }

    /// Set the send high water mark.
    #[must_use]
    pub const fn with_send_hwm(mut self, hwm: usize) -> Self {
        self.send_hwm = hwm;
        self
    }

    /// Keep only the newest unread message.
    #[must_use]
    pub const fn with_conflate(mut self, conflate: bool) -> Self {
        self.conflate = conflate;
        self
    }

    /// Set the linger period.
    #[must_use]
    pub const fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Effective queue depth for a subscriber built from these options.
    ///
    /// Conflating sockets hold a single slot; a zero HWM is treated as one.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        if self.conflate {
            1
        } else {
            self.recv_hwm.max(1)
        }
    }
}
