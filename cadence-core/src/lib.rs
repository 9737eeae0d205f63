//! Cadence Core
//!
//! This crate contains the transport-agnostic building blocks:
//! - Transport capability traits (`transport`)
//! - Raw frames (`message`)
//! - Socket options and sizing constants (`options`)
//! - Endpoint validation and topic-to-port mapping (`endpoint`)
//! - Monotonic boot clock (`clock`)
//! - In-process reference backend (`inproc`)
//! - Error types (`error`)

// The clock module needs libc access for CLOCK_BOOTTIME
#![cfg_attr(not(test), deny(unsafe_code))]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
pub mod clock;
pub mod endpoint;
pub mod error;
pub mod inproc;
pub mod message;
pub mod options;
pub mod transport;

pub use error::{CadenceError, Result};
pub use options::MSG_MULTIPLE_PUBLISHERS;

// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::clock::{BootClock, ManualClock, MonoClock};
    pub use crate::endpoint::Address;
    pub use crate::error::{CadenceError, Result};
    pub use crate::inproc::{InprocContext, InprocPoller, InprocPubSocket, InprocSubSocket, InprocTransport};
    pub use crate::message::Message;
    pub use crate::options::SocketOptions;
    pub use crate::transport::{Context, Poller, PubSocket, ReadySet, SocketId, SubSocket, Transport};
}
