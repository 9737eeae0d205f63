//! Envelope framing.
//!
//! Every frame on the wire is one envelope: a boot-clock timestamp taken when
//! the envelope was built, a producer-asserted validity flag, and a payload
//! that is one variant of a schema-defined union.
//!
//! - [`MessageBuilder`] stages an envelope inline and flattens it for sending.
//! - [`MessageReader`] copies a received frame into aligned storage and
//!   exposes the root as an [`Event`].
//! - [`Payload`] is implemented by each payload variant, an rkyv archive
//!   validated in place on read.
//!
//! See [`layout`] for the exact byte layout.

mod aligned;
mod builder;
pub mod layout;
mod payload;
mod reader;

pub use aligned::AlignedBuffer;
pub use builder::{EventBuilder, MessageBuilder};
pub use layout::{HEADER_BYTES, SMALL_BUFFER_BYTES, SMALL_BUFFER_WORDS, WHICH_UNSET};
pub use payload::Payload;
pub use reader::{Event, MessageReader};
