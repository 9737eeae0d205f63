//! # Cadence
//!
//! Freshness- and liveness-aware publish/subscribe for real-time pipelines
//! made of many cooperating processes.
//!
//! ## Architecture
//!
//! - **`cadence-core`**: transport traits, `Message`, errors, boot clock and
//!   the in-process backend
//! - **Backend crates**: one per wire transport (`cadence-zmq`)
//! - **`cadence`**: framing, `SubMaster`, `PubMaster` (this crate)
//!
//! ## Backends (opt-in via features)
//!
//! The in-process backend is always available and is the default transport
//! parameter. The libzmq backend is gated behind a feature:
//!
//! ```toml
//! [dependencies]
//! cadence = { version = "0.1", features = ["zmq"] }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use cadence::prelude::*;
//! use cadence::services::ServiceTable;
//!
//! # fn main() -> cadence::Result<()> {
//! let ctx = InprocContext::create()?;
//! let config = SubMasterConfig::default()
//!     .with_ignore_alive(["controlsState"])
//!     .with_services(ServiceTable::new().with_service("cameraState", 20.0));
//! let mut sm: SubMaster =
//!     SubMaster::with_config(&ctx, ["cameraState", "controlsState"], config)?;
//! let mut pm: PubMaster = PubMaster::new(&ctx, ["cameraState"])?;
//! sm.drain()?;
//!
//! let mut msg = MessageBuilder::new();
//! msg.init_event(true).set_payload_bytes(1, &42u32.to_le_bytes())?;
//! pm.send("cameraState", &mut msg)?;
//!
//! sm.update(DEFAULT_UPDATE_TIMEOUT_MS)?;
//! assert!(sm.updated("cameraState")?);
//! assert!(sm.all_alive(&[])?);
//! assert!(!sm.all_valid(&[])?); // controlsState has not received yet
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Delivery is at-most-once and fire-and-forget; nothing is retried
//! - Envelopes are timestamped when built, not when sent
//! - Received frames are copied into aligned storage, and payload archives
//!   are validated there before they are read
//! - `unsafe` code is isolated to the boot clock and the aligned buffer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dev_tracing;
pub mod framing;
pub mod liveness;
pub mod pub_master;
pub mod services;
pub mod sub_master;

// Backend modules (opt-in via features)
#[cfg(feature = "zmq")]
pub mod zmq;

// Re-export core types
pub use bytes::Bytes;
pub use rkyv;
pub use cadence_core::{clock, endpoint, error, inproc, message, options, transport};
pub use cadence_core::{CadenceError, Result, MSG_MULTIPLE_PUBLISHERS};

pub use config::{SubMasterConfig, DEFAULT_UPDATE_TIMEOUT_MS};
pub use framing::{MessageBuilder, MessageReader};
pub use pub_master::PubMaster;
pub use sub_master::SubMaster;

/// Convenient imports for applications.
///
/// ```rust
/// use cadence::prelude::*;
///
/// // Now you have:
/// // - SubMaster, PubMaster, SubMasterConfig
/// // - MessageBuilder, MessageReader, Payload
/// // - InprocContext and the transport traits
/// ```
pub mod prelude {
    pub use crate::config::{SubMasterConfig, DEFAULT_UPDATE_TIMEOUT_MS};
    pub use crate::framing::{Event, MessageBuilder, MessageReader, Payload};
    pub use crate::liveness::{LivenessPolicy, MissedCycles, MissedPeriods};
    pub use crate::pub_master::PubMaster;
    pub use crate::sub_master::SubMaster;
    pub use cadence_core::clock::{BootClock, ManualClock, MonoClock};
    pub use cadence_core::error::{CadenceError, Result};
    pub use cadence_core::inproc::{InprocContext, InprocTransport};
    pub use cadence_core::message::Message;
    pub use cadence_core::transport::{Context, Poller, PubSocket, SubSocket, Transport};
    pub use bytes::Bytes;
}
