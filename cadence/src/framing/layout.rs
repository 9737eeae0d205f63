//! Envelope wire layout.
//!
//! ```text
//! word 0 │ u32 segments-1 (= 0) │ u32 segment length in words │
//! word 1 │ u64 logMonoTime (ns)                                 │
//! word 2 │ u8 flags │ u8 0 │ u16 which │ u32 payload length      │
//! word 3…│ payload bytes, zero padded to a word boundary        │
//! ```
//!
//! All integers are little-endian.

use cadence_core::error::{CadenceError, Result};

/// Bytes per machine word.
pub const WORD_BYTES: usize = 8;

/// Words a builder stages inline before spilling to the heap.
pub const SMALL_BUFFER_WORDS: usize = 1024;

/// Inline staging capacity in bytes.
pub const SMALL_BUFFER_BYTES: usize = SMALL_BUFFER_WORDS * WORD_BYTES;

/// Segment table plus root header.
pub const HEADER_BYTES: usize = 3 * WORD_BYTES;

/// Union discriminant of an envelope with no payload set.
pub const WHICH_UNSET: u16 = 0;

pub(crate) const FLAG_VALID: u8 = 0b0000_0001;

const SEGMENT_COUNT: std::ops::Range<usize> = 0..4;
const SEGMENT_WORDS: std::ops::Range<usize> = 4..8;
const LOG_MONO_TIME: std::ops::Range<usize> = 8..16;
const FLAGS: usize = 16;
const WHICH: std::ops::Range<usize> = 18..20;
const PAYLOAD_LEN: std::ops::Range<usize> = 20..24;

/// Round `len` up to a whole number of words.
#[must_use]
pub const fn padded_len(len: usize) -> usize {
    (len + WORD_BYTES - 1) & !(WORD_BYTES - 1)
}

/// Decoded root header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Header {
    pub log_mono_time: u64,
    pub valid: bool,
    pub which: u16,
    pub payload_len: usize,
}

fn read_u16(buf: &[u8], at: std::ops::Range<usize>) -> u16 {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(&buf[at]);
    u16::from_le_bytes(raw)
}

fn read_u32(buf: &[u8], at: std::ops::Range<usize>) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at]);
    u32::from_le_bytes(raw)
}

fn read_u64(buf: &[u8], at: std::ops::Range<usize>) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[at]);
    u64::from_le_bytes(raw)
}

/// Stamp time and validity into a header region.
pub(crate) fn write_event_fields(header: &mut [u8], log_mono_time: u64, valid: bool) {
    header[LOG_MONO_TIME].copy_from_slice(&log_mono_time.to_le_bytes());
    set_valid(header, valid);
}

pub(crate) fn set_valid(header: &mut [u8], valid: bool) {
    if valid {
        header[FLAGS] |= FLAG_VALID;
    } else {
        header[FLAGS] &= !FLAG_VALID;
    }
}

pub(crate) fn set_log_mono_time(header: &mut [u8], log_mono_time: u64) {
    header[LOG_MONO_TIME].copy_from_slice(&log_mono_time.to_le_bytes());
}

pub(crate) fn set_which(header: &mut [u8], which: u16) {
    header[WHICH].copy_from_slice(&which.to_le_bytes());
}

/// Words the segment carries for a payload of `payload_len` bytes.
///
/// Computed in `u32` so every length the header can express has a segment
/// size the segment table can express.
#[must_use]
pub const fn segment_words(payload_len: u32) -> u32 {
    // Root header words plus the padded payload.
    2 + payload_len.div_ceil(8)
}

/// Fill in the segment table and payload length of a padded frame.
pub(crate) fn seal(frame: &mut [u8], payload_len: u32) {
    debug_assert_eq!(
        frame.len(),
        WORD_BYTES + segment_words(payload_len) as usize * WORD_BYTES
    );
    frame[SEGMENT_COUNT].copy_from_slice(&0u32.to_le_bytes());
    frame[SEGMENT_WORDS].copy_from_slice(&segment_words(payload_len).to_le_bytes());
    frame[PAYLOAD_LEN].copy_from_slice(&payload_len.to_le_bytes());
}

pub(crate) fn log_mono_time(header: &[u8]) -> u64 {
    read_u64(header, LOG_MONO_TIME)
}

pub(crate) fn valid(header: &[u8]) -> bool {
    header[FLAGS] & FLAG_VALID != 0
}

/// Validate a flat frame and decode its root header.
pub(crate) fn parse_header(frame: &[u8]) -> Result<Header> {
    if frame.len() < HEADER_BYTES {
        return Err(CadenceError::invalid_frame(format!(
            "frame of {} bytes is shorter than the {HEADER_BYTES} byte envelope header",
            frame.len()
        )));
    }
    if frame.len() % WORD_BYTES != 0 {
        return Err(CadenceError::invalid_frame(format!(
            "frame of {} bytes is not a whole number of words",
            frame.len()
        )));
    }

    let extra_segments = read_u32(frame, SEGMENT_COUNT);
    if extra_segments != 0 {
        return Err(CadenceError::invalid_frame(format!(
            "{} segments declared, only single-segment frames are supported",
            u64::from(extra_segments) + 1
        )));
    }

    let segment_words = read_u32(frame, SEGMENT_WORDS) as usize;
    let carried_words = (frame.len() - WORD_BYTES) / WORD_BYTES;
    if segment_words != carried_words {
        return Err(CadenceError::invalid_frame(format!(
            "segment table declares {segment_words} words, frame carries {carried_words}"
        )));
    }

    let payload_len = read_u32(frame, PAYLOAD_LEN) as usize;
    if payload_len > frame.len() - HEADER_BYTES {
        return Err(CadenceError::invalid_frame(format!(
            "payload length {payload_len} exceeds the {} bytes available",
            frame.len() - HEADER_BYTES
        )));
    }

    Ok(Header {
        log_mono_time: read_u64(frame, LOG_MONO_TIME),
        valid: frame[FLAGS] & FLAG_VALID != 0,
        which: read_u16(frame, WHICH),
        payload_len,
    })
}
