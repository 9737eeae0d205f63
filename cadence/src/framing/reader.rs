//! Envelope reader.

use rkyv::api::high::{HighDeserializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::{Archived, Deserialize};

use cadence_core::error::{CadenceError, Result};

use super::aligned::AlignedBuffer;
use super::layout::{self, Header, HEADER_BYTES};
use super::payload::{self, Payload};

/// Owned, word-aligned copy of one received envelope.
///
/// The frame is copied out of the transport's buffer on construction, so the
/// reader outlives the receive call that produced it. [`MessageReader::default`]
/// is the envelope of a topic that has not received anything yet:
/// `valid == false`, `log_mono_time == 0` and no payload.
#[derive(Debug, Clone, Default)]
pub struct MessageReader {
    buf: AlignedBuffer,
    header: Header,
}

impl MessageReader {
    /// Copy and validate a flat frame.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::InvalidFrame`] if `data` is not a well-formed
    /// single-segment envelope.
    pub fn new(data: &[u8]) -> Result<Self> {
        let mut reader = Self::default();
        reader.reset_from(data)?;
        Ok(reader)
    }

    /// Replace the held envelope with `data`, reusing the aligned allocation.
    ///
    /// On error the previously held envelope is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::InvalidFrame`] if `data` is malformed.
    pub fn reset_from(&mut self, data: &[u8]) -> Result<()> {
        let header = layout::parse_header(data)?;
        self.buf.align(data);
        self.header = header;
        Ok(())
    }

    /// Root of the held envelope.
    #[must_use]
    pub fn event(&self) -> Event<'_> {
        let payload = self
            .buf
            .as_bytes()
            .get(HEADER_BYTES..HEADER_BYTES + self.header.payload_len)
            .unwrap_or(&[]);
        Event {
            header: &self.header,
            payload,
        }
    }

    /// The aligned frame bytes (empty for the default envelope).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }
}

/// Read-only view of an envelope root.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    header: &'a Header,
    payload: &'a [u8],
}

impl<'a> Event<'a> {
    /// Build-time timestamp in boot-clock nanoseconds.
    #[must_use]
    pub fn log_mono_time(&self) -> u64 {
        self.header.log_mono_time
    }

    /// Producer-asserted validity.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.header.valid
    }

    /// Payload union discriminant (`WHICH_UNSET` when none was set).
    #[must_use]
    pub fn which(&self) -> u16 {
        self.header.which
    }

    /// Raw payload bytes without padding.
    #[must_use]
    pub fn payload_bytes(&self) -> &'a [u8] {
        self.payload
    }

    fn expect_variant<P: Payload>(&self) -> Result<()> {
        if self.header.which != P::WHICH {
            return Err(CadenceError::PayloadMismatch {
                expected: P::WHICH,
                actual: self.header.which,
            });
        }
        Ok(())
    }

    /// Validate the payload as variant `P` and borrow its archive in place.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::PayloadMismatch`] if the envelope carries a
    /// different variant, or [`CadenceError::InvalidFrame`] if the archive
    /// fails validation.
    pub fn archived<P>(&self) -> Result<&'a Archived<P>>
    where
        P: Payload,
        P::Archived: for<'v> CheckBytes<HighValidator<'v, Error>>,
    {
        self.expect_variant::<P>()?;
        payload::access::<P>(self.payload)
    }

    /// Validate the payload as variant `P` and deserialize an owned copy.
    ///
    /// # Errors
    ///
    /// Same as [`archived`](Self::archived).
    pub fn payload<P>(&self) -> Result<P>
    where
        P: Payload,
        P::Archived: for<'v> CheckBytes<HighValidator<'v, Error>> + Deserialize<P, HighDeserializer<Error>>,
    {
        self.expect_variant::<P>()?;
        payload::decode::<P>(self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{MessageBuilder, WHICH_UNSET};
    use rkyv::{Archive, Serialize};

    #[derive(Debug, PartialEq, Archive, Serialize, Deserialize)]
    struct Steering {
        angle_deg: f32,
        active: bool,
    }

    impl Payload for Steering {
        const WHICH: u16 = 5;
    }

    #[derive(Debug, PartialEq, Archive, Serialize, Deserialize)]
    struct Other {
        code: u8,
    }

    impl Payload for Other {
        const WHICH: u16 = 6;
    }

    #[test]
    fn test_default_envelope() {
        let reader = MessageReader::default();
        let event = reader.event();
        assert!(!event.valid());
        assert_eq!(event.log_mono_time(), 0);
        assert_eq!(event.which(), WHICH_UNSET);
        assert!(event.payload_bytes().is_empty());
        assert!(reader.as_bytes().is_empty());
    }

    #[test]
    fn test_typed_payload() {
        let mut builder = MessageBuilder::new();
        let value = Steering {
            angle_deg: -3.5,
            active: true,
        };
        builder.init_event(true).set_payload(&value).unwrap();
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        assert_eq!(reader.event().payload::<Steering>().unwrap(), value);

        let archived = reader.event().archived::<Steering>().unwrap();
        assert_eq!(archived.angle_deg.to_native(), -3.5);
        assert!(archived.active);
    }

    #[test]
    fn test_archive_is_read_from_aligned_copy() {
        let mut builder = MessageBuilder::new();
        builder
            .init_event(true)
            .set_payload(&Steering {
                angle_deg: 1.0,
                active: false,
            })
            .unwrap();
        // Shift the frame one byte so the source is misaligned.
        let mut raw = vec![0u8];
        raw.extend_from_slice(builder.to_bytes());
        let reader = MessageReader::new(&raw[1..]).unwrap();
        let payload = reader.event().payload_bytes();
        assert_eq!(payload.as_ptr() as usize % 8, 0);
        assert!(reader.event().archived::<Steering>().is_ok());
    }

    #[test]
    fn test_payload_mismatch() {
        let mut builder = MessageBuilder::new();
        builder.init_event(true).set_payload(&Other { code: 1 }).unwrap();
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        match reader.event().payload::<Steering>() {
            Err(CadenceError::PayloadMismatch { expected, actual }) => {
                assert_eq!(expected, 5);
                assert_eq!(actual, 6);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_payload_fails_validation() {
        let mut builder = MessageBuilder::new();
        builder
            .init_event(true)
            .set_payload_bytes(Steering::WHICH, &[0xff; 3])
            .unwrap();
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        assert!(matches!(
            reader.event().archived::<Steering>(),
            Err(CadenceError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_failed_reset_keeps_previous() {
        let mut builder = MessageBuilder::new();
        builder.init_event(true).set_payload_bytes(2, &77u16.to_le_bytes()).unwrap();
        let mut reader = MessageReader::new(builder.to_bytes()).unwrap();
        assert!(reader.reset_from(&[0u8; 13]).is_err());
        assert_eq!(reader.event().which(), 2);
        assert_eq!(reader.event().payload_bytes(), &77u16.to_le_bytes());
    }
}
