//! Raw transport frames.
//!
//! A [`Message`] is one frame exactly as it travels through a socket. It knows
//! nothing about envelopes or schemas; framing lives one layer up.

use bytes::Bytes;

/// One raw frame, owned or borrowed, independent of the transport that carried it.
///
/// Backed by a refcounted [`Bytes`], so handing the same frame to many
/// subscribers clones a handle instead of the data.
///
/// # Examples
///
/// ```
/// use cadence_core::message::Message;
///
/// let msg = Message::copy_from_slice(b"frame");
/// assert_eq!(msg.len(), 5);
/// assert_eq!(msg.data(), b"frame");
/// msg.close();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    data: Bytes,
}

impl Message {
    /// Allocate a zero-filled frame of `size` bytes.
    #[must_use]
    pub fn zeroed(size: usize) -> Self {
        Self {
            data: Bytes::from(vec![0u8; size]),
        }
    }

    /// Copy `data` into a new owned frame.
    #[must_use]
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }

    /// Wrap an existing buffer without copying.
    ///
    /// A `Bytes::from_static` buffer gives a borrowed frame.
    #[must_use]
    pub const fn from_bytes(data: Bytes) -> Self {
        Self { data }
    }

    /// Size of the frame in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the frame carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the frame contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Release the frame.
    ///
    /// Dropping has the same effect; this exists so call sites can make the
    /// release point explicit.
    pub fn close(self) {}
}

impl From<Bytes> for Message {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
        }
    }
}

impl From<Message> for Bytes {
    fn from(msg: Message) -> Self {
        msg.data
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
