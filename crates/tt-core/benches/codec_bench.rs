//! Criterion benchmarks for the tt-core frame and envelope codecs.
//!
//! Run with:
//! ```bash
//! cargo bench --package tt-core --bench codec_bench
//! ```

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tt_core::{decode_envelope, encode_envelope, read_frame, write_frame, Envelope, StateId};

// ── Envelope fixtures ─────────────────────────────────────────────────────────

fn make_input() -> Envelope {
    Envelope::Input {
        state_id: StateId(1_234_567),
        name: "bench-client".to_string(),
        address: "192.168.1.50:53211".to_string(),
        content: "B".to_string(),
    }
}

fn make_update(len: usize) -> Envelope {
    Envelope::Update {
        state_id: StateId(1_234_567),
        content: "w".repeat(len),
    }
}

fn make_change_state() -> Envelope {
    Envelope::ChangeState {
        state_id: StateId(1_234_567),
        content: "ActivityFastRead".to_string(),
    }
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_envelopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let fixtures = [
        ("input", make_input()),
        ("change_state", make_change_state()),
        ("update_64", make_update(64)),
        ("update_4k", make_update(4096)),
    ];

    for (name, envelope) in &fixtures {
        group.bench_with_input(BenchmarkId::new("encode", name), envelope, |b, env| {
            b.iter(|| encode_envelope(black_box(env)).unwrap())
        });

        let bytes = encode_envelope(envelope).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", name), &bytes, |b, bytes| {
            b.iter(|| decode_envelope(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    for size in [0usize, 1, 1024, 65536] {
        let payload = vec![0x5Au8; size];

        group.bench_with_input(BenchmarkId::new("write", size), &payload, |b, payload| {
            let mut wire = Vec::with_capacity(size + 4);
            b.iter(|| {
                wire.clear();
                write_frame(&mut wire, black_box(payload)).unwrap();
            })
        });

        let mut wire = Vec::new();
        write_frame(&mut wire, &payload).unwrap();
        group.bench_with_input(BenchmarkId::new("read", size), &wire, |b, wire| {
            b.iter(|| read_frame(&mut Cursor::new(black_box(wire.as_slice())), None).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_envelopes, bench_frames);
criterion_main!(benches);
