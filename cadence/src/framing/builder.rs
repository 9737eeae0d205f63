//! Envelope builder.

use smallvec::SmallVec;

use cadence_core::clock::nanos_since_boot;
use cadence_core::error::{CadenceError, Result};

use super::layout::{self, padded_len, HEADER_BYTES, SMALL_BUFFER_BYTES, WHICH_UNSET};
use super::payload::{self, Payload};

/// Stages one envelope and flattens it for the transport.
///
/// The staging buffer holds [`SMALL_BUFFER_BYTES`] inline, so building and
/// flattening a typical message never touches the heap. Larger payloads spill
/// to a heap allocation transparently.
///
/// # Examples
///
/// ```
/// use cadence::framing::{MessageBuilder, MessageReader};
///
/// # fn main() -> cadence::Result<()> {
/// let mut builder = MessageBuilder::new();
/// builder.init_event(true).set_payload_bytes(3, &7u32.to_le_bytes())?;
///
/// let reader = MessageReader::new(builder.to_bytes())?;
/// assert!(reader.event().valid());
/// assert_eq!(reader.event().which(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: SmallVec<[u8; SMALL_BUFFER_BYTES]>,
    payload_len: u32,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    /// Create a builder holding an unset envelope.
    #[must_use]
    pub fn new() -> Self {
        let mut buf = SmallVec::new();
        buf.resize(HEADER_BYTES, 0);
        Self {
            buf,
            payload_len: 0,
        }
    }

    /// Start a new envelope stamped with the current boot-clock time.
    ///
    /// Any payload written earlier is discarded. The returned handle fills in
    /// the topic-specific payload.
    pub fn init_event(&mut self, valid: bool) -> EventBuilder<'_> {
        self.buf.clear();
        self.buf.resize(HEADER_BYTES, 0);
        layout::write_event_fields(&mut self.buf, nanos_since_boot(), valid);
        self.payload_len = 0;
        self.event()
    }

    /// Reopen the current envelope without restamping it.
    pub fn event(&mut self) -> EventBuilder<'_> {
        EventBuilder {
            buf: &mut self.buf,
            payload_len: &mut self.payload_len,
        }
    }

    /// Flatten the envelope into one contiguous, word-padded frame.
    ///
    /// Calling it again re-flattens from the current state and yields the same
    /// bytes.
    pub fn to_bytes(&mut self) -> &[u8] {
        let payload_len = self.payload_len as usize;
        self.buf.truncate(HEADER_BYTES + payload_len);
        self.buf.resize(HEADER_BYTES + padded_len(payload_len), 0);
        layout::seal(&mut self.buf, self.payload_len);
        &self.buf
    }

    /// Check if the staged envelope still fits the inline buffer.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        !self.buf.spilled()
    }
}

/// Handle on the envelope being built.
pub struct EventBuilder<'a> {
    buf: &'a mut SmallVec<[u8; SMALL_BUFFER_BYTES]>,
    payload_len: &'a mut u32,
}

impl EventBuilder<'_> {
    /// Build-time timestamp in nanoseconds.
    #[must_use]
    pub fn log_mono_time(&self) -> u64 {
        layout::log_mono_time(&self.buf[..])
    }

    /// Override the build-time timestamp.
    pub fn set_log_mono_time(&mut self, log_mono_time: u64) -> &mut Self {
        layout::set_log_mono_time(&mut self.buf[..], log_mono_time);
        self
    }

    /// Producer-asserted validity.
    #[must_use]
    pub fn valid(&self) -> bool {
        layout::valid(&self.buf[..])
    }

    /// Change the validity flag.
    pub fn set_valid(&mut self, valid: bool) -> &mut Self {
        layout::set_valid(&mut self.buf[..], valid);
        self
    }

    /// Archive `payload` and make it the envelope's payload.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Codec`] if the value cannot be archived. The
    /// previous payload is kept in that case.
    pub fn set_payload<P: Payload>(&mut self, payload: &P) -> Result<&mut Self> {
        let archive = payload::encode(payload)?;
        self.set_payload_bytes(P::WHICH, &archive)
    }

    /// Select payload variant `which` and copy in an already encoded payload.
    ///
    /// Any previously written payload is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Codec`] if `data` does not fit the 32-bit
    /// payload length field.
    pub fn set_payload_bytes(&mut self, which: u16, data: &[u8]) -> Result<&mut Self> {
        debug_assert_ne!(which, WHICH_UNSET, "payload discriminant 0 means unset");
        let payload_len = u32::try_from(data.len()).map_err(|_| {
            CadenceError::codec(format!(
                "payload of {} bytes exceeds the 32-bit length field",
                data.len()
            ))
        })?;
        self.buf.truncate(HEADER_BYTES);
        layout::set_which(&mut self.buf[..], which);
        self.buf.extend_from_slice(data);
        *self.payload_len = payload_len;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::MessageReader;

    #[test]
    fn test_init_event_stamps_time() {
        let mut builder = MessageBuilder::new();
        let before = nanos_since_boot();
        let stamped = builder.init_event(true).log_mono_time();
        assert!(stamped >= before);
        assert!(stamped <= nanos_since_boot());
    }

    #[test]
    fn test_each_init_is_stamped_separately() {
        let mut builder = MessageBuilder::new();
        let first = builder.init_event(true).log_mono_time();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let second = builder.init_event(true).log_mono_time();
        assert!(second > first);
    }

    #[test]
    fn test_to_bytes_is_padded_and_idempotent() {
        let mut builder = MessageBuilder::new();
        builder.init_event(false).set_payload_bytes(9, &[1, 2, 3]).unwrap();
        let first = builder.to_bytes().to_vec();
        assert_eq!(first.len(), HEADER_BYTES + 8);
        assert_eq!(builder.to_bytes(), first.as_slice());

        let reader = MessageReader::new(&first).unwrap();
        assert_eq!(reader.event().payload_bytes(), &[1, 2, 3]);
        assert!(!reader.event().valid());
    }

    #[test]
    fn test_empty_envelope() {
        let mut builder = MessageBuilder::new();
        builder.init_event(true);
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        assert_eq!(reader.event().which(), WHICH_UNSET);
        assert!(reader.event().payload_bytes().is_empty());
        assert_eq!(reader.as_bytes().len(), HEADER_BYTES);
    }

    #[test]
    fn test_reopened_event_keeps_payload() {
        let mut builder = MessageBuilder::new();
        builder.init_event(true).set_payload_bytes(2, &11u64.to_le_bytes()).unwrap();
        builder.to_bytes();
        builder.event().set_valid(false).set_log_mono_time(5);
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        let event = reader.event();
        assert_eq!(event.log_mono_time(), 5);
        assert!(!event.valid());
        assert_eq!(event.payload_bytes(), &11u64.to_le_bytes());
    }

    #[test]
    fn test_rewrite_after_flatten() {
        let mut builder = MessageBuilder::new();
        builder.init_event(true).set_payload_bytes(4, &[1, 2, 3]).unwrap();
        builder.to_bytes();
        builder.event().set_payload_bytes(4, &[5; 8]).unwrap();
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        assert_eq!(reader.event().payload_bytes(), &[5; 8]);
    }

    #[test]
    fn test_large_payload_spills() {
        let mut builder = MessageBuilder::new();
        builder.init_event(true).set_payload_bytes(1, &[0u8; 100]).unwrap();
        assert!(builder.is_inline());
        builder
            .init_event(true)
            .set_payload_bytes(1, &vec![7u8; SMALL_BUFFER_BYTES])
            .unwrap();
        assert!(!builder.is_inline());
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        assert_eq!(reader.event().payload_bytes().len(), SMALL_BUFFER_BYTES);
    }

    #[test]
    fn test_shrinking_payload_after_flatten() {
        let mut builder = MessageBuilder::new();
        builder.init_event(true).set_payload_bytes(4, &[9u8; 20]).unwrap();
        assert_eq!(builder.to_bytes().len(), HEADER_BYTES + 24);
        builder.event().set_payload_bytes(4, &[1]).unwrap();
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        assert_eq!(reader.event().payload_bytes(), &[1]);
        assert_eq!(reader.as_bytes().len(), HEADER_BYTES + 8);
    }
}
