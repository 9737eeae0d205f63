//! libzmq backend.
//!
//! Enabled with the `zmq` feature. Use [`ZmqTransport`] as the transport
//! parameter of [`SubMaster`](crate::SubMaster) and [`PubMaster`](crate::PubMaster)
//! to exchange envelopes between processes:
//!
//! ```rust,no_run
//! use cadence::prelude::*;
//! use cadence::zmq::{ZmqContext, ZmqTransport};
//!
//! # fn main() -> cadence::Result<()> {
//! let ctx = ZmqContext::create()?;
//! let mut sm = SubMaster::<ZmqTransport>::new(&ctx, ["carState"])?;
//! sm.update(1000)?;
//! # Ok(())
//! # }
//! ```

pub use cadence_zmq::{ZmqContext, ZmqPoller, ZmqPubSocket, ZmqSubSocket, ZmqTransport};

/// `SubMaster` over libzmq.
pub type ZmqSubMaster = crate::SubMaster<ZmqTransport>;

/// `PubMaster` over libzmq.
pub type ZmqPubMaster = crate::PubMaster<ZmqTransport>;
