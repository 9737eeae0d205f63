#![no_main]

use cadence::framing::{MessageReader, Payload};
use libfuzzer_sys::fuzz_target;

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct Telemetry {
    id: u32,
    tags: Vec<String>,
    samples: Vec<f64>,
}

impl Payload for Telemetry {
    const WHICH: u16 = 1;
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either be rejected or yield an in-bounds payload.
    let Ok(reader) = MessageReader::new(data) else {
        return;
    };
    let event = reader.event();
    assert!(event.payload_bytes().len() <= data.len());

    // Archive validation must reject garbage without reading out of bounds.
    if event.which() == Telemetry::WHICH {
        if let Ok(archived) = event.archived::<Telemetry>() {
            let _ = archived.tags.iter().map(|t| t.len()).sum::<usize>();
        }
    }

    // Reusing the reader with the same bytes must agree with a fresh parse.
    let mut reused = MessageReader::default();
    if reused.reset_from(data).is_ok() {
        assert_eq!(reused.event().which(), event.which());
        assert_eq!(reused.event().log_mono_time(), event.log_mono_time());
    }
});
