//! Envelope framing round trips and malformed input

use cadence::framing::{MessageBuilder, MessageReader, Payload, HEADER_BYTES, SMALL_BUFFER_BYTES};
use cadence::CadenceError;
use rkyv::{Archive, Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
struct DeviceState {
    uptime_s: u64,
    free_space_pct: f32,
    network: String,
    started: bool,
}

impl Payload for DeviceState {
    const WHICH: u16 = 40;
}

#[derive(Debug, Archive, Serialize, Deserialize)]
struct Blob {
    data: Vec<u8>,
}

impl Payload for Blob {
    const WHICH: u16 = 9;
}

fn device_state() -> DeviceState {
    DeviceState {
        uptime_s: 86_400,
        free_space_pct: 41.5,
        network: "wifi".to_string(),
        started: true,
    }
}

#[test]
fn test_round_trip_preserves_envelope() {
    let mut builder = MessageBuilder::new();
    let mut event = builder.init_event(false);
    event.set_payload(&device_state()).unwrap();
    let built_at = event.log_mono_time();

    let reader = MessageReader::new(builder.to_bytes()).unwrap();
    let event = reader.event();
    assert!(!event.valid());
    assert_eq!(event.log_mono_time(), built_at);
    assert_eq!(event.which(), DeviceState::WHICH);
    assert_eq!(event.payload::<DeviceState>().unwrap(), device_state());
}

#[test]
fn test_frames_are_word_sized() {
    let mut builder = MessageBuilder::new();
    for n in 0..20 {
        builder.init_event(true).set_payload_bytes(1, &vec![0xAB; n]).unwrap();
        let len = builder.to_bytes().len();
        assert_eq!(len % 8, 0);
        assert!(len >= HEADER_BYTES + n);
        assert!(len < HEADER_BYTES + n + 8);
    }
}

#[test]
fn test_payload_larger_than_inline_buffer() {
    let blob = vec![0x5Au8; SMALL_BUFFER_BYTES * 2];
    let mut builder = MessageBuilder::new();
    builder
        .init_event(true)
        .set_payload(&Blob { data: blob.clone() })
        .unwrap();
    assert!(!builder.is_inline());

    let reader = MessageReader::new(builder.to_bytes()).unwrap();
    let archived = reader.event().archived::<Blob>().unwrap();
    assert_eq!(archived.data.as_slice(), blob.as_slice());
}

#[test]
fn test_reader_survives_source_buffer() {
    let mut builder = MessageBuilder::new();
    builder.init_event(true).set_payload(&device_state()).unwrap();
    let mut wire = builder.to_bytes().to_vec();
    let reader = MessageReader::new(&wire).unwrap();
    wire.iter_mut().for_each(|b| *b = 0);
    assert_eq!(reader.event().payload::<DeviceState>().unwrap(), device_state());
}

#[test]
fn test_reader_accepts_unaligned_input() {
    let mut builder = MessageBuilder::new();
    builder.init_event(true).set_payload(&device_state()).unwrap();
    let frame = builder.to_bytes().to_vec();

    let mut shifted = vec![0u8; frame.len() + 1];
    shifted[1..].copy_from_slice(&frame);
    let reader = MessageReader::new(&shifted[1..]).unwrap();
    assert_eq!(reader.as_bytes().as_ptr() as usize % 8, 0);
    assert_eq!(reader.event().payload::<DeviceState>().unwrap(), device_state());
}

#[test]
fn test_malformed_frames_are_rejected() {
    let mut builder = MessageBuilder::new();
    builder.init_event(true).set_payload(&device_state()).unwrap();
    let frame = builder.to_bytes().to_vec();

    let cases: Vec<Vec<u8>> = vec![
        Vec::new(),
        frame[..HEADER_BYTES - 8].to_vec(),
        frame[..frame.len() - 3].to_vec(),
        frame[..frame.len() - 8].to_vec(),
        {
            let mut multi = frame.clone();
            multi[0] = 2;
            multi
        },
    ];
    for case in cases {
        assert!(matches!(
            MessageReader::new(&case),
            Err(CadenceError::InvalidFrame(_))
        ));
    }
}

#[test]
fn test_zero_copy_access_matches_decode() {
    let mut builder = MessageBuilder::new();
    builder.init_event(true).set_payload(&device_state()).unwrap();
    let reader = MessageReader::new(builder.to_bytes()).unwrap();

    let archived = reader.event().archived::<DeviceState>().unwrap();
    assert_eq!(archived.uptime_s.to_native(), 86_400);
    assert_eq!(archived.free_space_pct.to_native(), 41.5);
    assert_eq!(archived.network.as_str(), "wifi");
    assert!(archived.started);
}

#[test]
fn test_truncated_payload_archive() {
    let mut builder = MessageBuilder::new();
    builder
        .init_event(true)
        .set_payload_bytes(DeviceState::WHICH, &1u64.to_le_bytes())
        .unwrap();
    let reader = MessageReader::new(builder.to_bytes()).unwrap();
    assert!(matches!(
        reader.event().payload::<DeviceState>(),
        Err(CadenceError::InvalidFrame(_))
    ));
}

#[test]
fn test_wrong_variant_is_not_validated() {
    let mut builder = MessageBuilder::new();
    builder.init_event(true).set_payload(&device_state()).unwrap();
    let reader = MessageReader::new(builder.to_bytes()).unwrap();
    assert!(matches!(
        reader.event().archived::<Blob>(),
        Err(CadenceError::PayloadMismatch {
            expected: 9,
            actual: 40
        })
    ));
}
