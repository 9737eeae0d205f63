//! Framing benchmarks: build-and-flatten and copy-and-parse cost per envelope
//!
//! Sizes straddle the inline staging buffer to show the cost of spilling.

use cadence::framing::{MessageBuilder, MessageReader, Payload, SMALL_BUFFER_BYTES};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const PAYLOAD_SIZES: &[usize] = &[64, 1024, SMALL_BUFFER_BYTES - 64, SMALL_BUFFER_BYTES * 4];

fn build_and_flatten(c: &mut Criterion) {
    cadence::dev_tracing::init_tracing();
    let mut group = c.benchmark_group("framing/build");

    for &size in PAYLOAD_SIZES {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{size}B")), &size, |b, _| {
            let mut builder = MessageBuilder::new();
            b.iter(|| {
                builder
                    .init_event(true)
                    .set_payload_bytes(1, black_box(&payload))
                    .unwrap();
                black_box(builder.to_bytes().len());
            });
        });
    }
    group.finish();
}

fn copy_and_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing/read");

    for &size in PAYLOAD_SIZES {
        let mut builder = MessageBuilder::new();
        builder
            .init_event(true)
            .set_payload_bytes(1, &vec![0x5Au8; size])
            .unwrap();
        let frame = builder.to_bytes().to_vec();

        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::new("fresh", format!("{size}B")), &frame, |b, frame| {
            b.iter(|| {
                let reader = MessageReader::new(black_box(frame)).unwrap();
                black_box(reader.event().payload_bytes().len());
            });
        });
        group.bench_with_input(BenchmarkId::new("reused", format!("{size}B")), &frame, |b, frame| {
            let mut reader = MessageReader::default();
            b.iter(|| {
                reader.reset_from(black_box(frame)).unwrap();
                black_box(reader.event().payload_bytes().len());
            });
        });
    }
    group.finish();
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct RadarTrack {
    track_id: u32,
    range_m: f32,
    rel_speed_mps: f32,
    measured: bool,
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct RadarState {
    tracks: Vec<RadarTrack>,
}

impl Payload for RadarState {
    const WHICH: u16 = 21;
}

fn radar_state(tracks: u32) -> RadarState {
    RadarState {
        tracks: (0..tracks)
            .map(|i| RadarTrack {
                track_id: i,
                range_m: i as f32 * 1.5,
                rel_speed_mps: -0.5,
                measured: i % 2 == 0,
            })
            .collect(),
    }
}

fn archived_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing/payload");

    for tracks in [1u32, 16, 64] {
        let state = radar_state(tracks);
        let mut builder = MessageBuilder::new();
        group.bench_with_input(BenchmarkId::new("archive", tracks), &state, |b, state| {
            b.iter(|| {
                builder.init_event(true).set_payload(black_box(state)).unwrap();
                black_box(builder.to_bytes().len());
            });
        });

        builder.init_event(true).set_payload(&state).unwrap();
        let reader = MessageReader::new(builder.to_bytes()).unwrap();
        group.bench_with_input(BenchmarkId::new("access", tracks), &reader, |b, reader| {
            b.iter(|| {
                let archived = reader.event().archived::<RadarState>().unwrap();
                black_box(archived.tracks.len());
            });
        });
        group.bench_with_input(BenchmarkId::new("deserialize", tracks), &reader, |b, reader| {
            b.iter(|| {
                let owned = reader.event().payload::<RadarState>().unwrap();
                black_box(owned.tracks.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, build_and_flatten, copy_and_parse, archived_payload);
criterion_main!(benches);
