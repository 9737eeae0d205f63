//! Payload archives.
//!
//! The payload of an envelope is one variant of a schema-defined union. Each
//! variant is a Rust type archived with rkyv; its discriminant selects the
//! variant on the wire. Readers validate the archive in place over their
//! word-aligned copy of the frame, so a payload can be read without
//! deserializing it at all.
//!
//! Archives are placed at an 8-byte aligned offset. Variants whose archived
//! form needs stricter alignment (`u128` fields) fail validation on read.

use rkyv::api::high::{HighDeserializer, HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Archived, Deserialize, Serialize};

use cadence_core::error::{CadenceError, Result};

/// One variant of the envelope's payload union.
///
/// # Examples
///
/// ```
/// use cadence::framing::{MessageBuilder, MessageReader, Payload};
///
/// #[derive(Debug, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
/// struct Thermal {
///     cpu_temp_c: f32,
///     fan_rpm: u16,
/// }
///
/// impl Payload for Thermal {
///     const WHICH: u16 = 12;
/// }
///
/// # fn main() -> cadence::Result<()> {
/// let mut builder = MessageBuilder::new();
/// builder.init_event(true).set_payload(&Thermal { cpu_temp_c: 41.5, fan_rpm: 900 })?;
///
/// let reader = MessageReader::new(builder.to_bytes())?;
/// let archived = reader.event().archived::<Thermal>()?;
/// assert_eq!(archived.fan_rpm.to_native(), 900);
/// # Ok(())
/// # }
/// ```
pub trait Payload: Archive + for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>> {
    /// Union discriminant. Must not be `WHICH_UNSET` (0).
    const WHICH: u16;
}

/// Serialize `payload` into a standalone archive.
pub(crate) fn encode<P: Payload>(payload: &P) -> Result<AlignedVec> {
    rkyv::to_bytes::<Error>(payload).map_err(|e| {
        CadenceError::codec(format!("variant {} failed to serialize: {e}", P::WHICH))
    })
}

/// Validate `bytes` as an archived `P` and borrow it in place.
pub(crate) fn access<P>(bytes: &[u8]) -> Result<&Archived<P>>
where
    P: Payload,
    P::Archived: for<'a> CheckBytes<HighValidator<'a, Error>>,
{
    rkyv::access::<P::Archived, Error>(bytes).map_err(|e| {
        CadenceError::invalid_frame(format!("variant {} failed validation: {e}", P::WHICH))
    })
}

/// Validate `bytes` as an archived `P` and deserialize an owned copy.
pub(crate) fn decode<P>(bytes: &[u8]) -> Result<P>
where
    P: Payload,
    P::Archived: for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<P, HighDeserializer<Error>>,
{
    let archived = access::<P>(bytes)?;
    rkyv::deserialize::<P, Error>(archived).map_err(|e| {
        CadenceError::codec(format!("variant {} failed to deserialize: {e}", P::WHICH))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Archive, Serialize, Deserialize)]
    #[rkyv(derive(Debug))]
    struct Lane {
        id: u16,
        offsets_m: Vec<f64>,
        name: String,
    }

    impl Payload for Lane {
        const WHICH: u16 = 3;
    }

    fn lane() -> Lane {
        Lane {
            id: 2,
            offsets_m: vec![0.25, -1.5],
            name: "left".to_string(),
        }
    }

    #[test]
    fn test_encode_access_decode() {
        let bytes = encode(&lane()).unwrap();
        let archived = access::<Lane>(&bytes).unwrap();
        assert_eq!(archived.id.to_native(), 2);
        assert_eq!(archived.name.as_str(), "left");
        assert_eq!(archived.offsets_m.len(), 2);
        assert_eq!(decode::<Lane>(&bytes).unwrap(), lane());
    }

    #[test]
    fn test_truncated_archive_is_rejected() {
        let bytes = encode(&lane()).unwrap();
        let err = access::<Lane>(&bytes[..3]).unwrap_err();
        assert!(matches!(err, CadenceError::InvalidFrame(_)));
    }

    #[test]
    fn test_corrupt_relative_pointer_is_rejected() {
        let mut bytes = encode(&lane()).unwrap();
        // The root sits at the end; its vector pointer follows the id.
        let len = bytes.len();
        for b in &mut bytes[len - 16..len - 8] {
            *b = 0x7f;
        }
        assert!(decode::<Lane>(&bytes).is_err());
    }
}
