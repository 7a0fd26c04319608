//! Decoding benchmark suite.
//!
//! Benchmarks the hot paths of both ingestion modes:
//! - Archived stream parsing at different block counts
//! - Deep merge of partial timing updates
//! - Compressed payload inflation
//! - Full reconciliation of a timing stream
//!
//! Run with: cargo bench --bench decode
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use livetiming::protocol::{deep_merge, try_inflate};
use livetiming::stream::{line_updates, parse_blocks};
use livetiming::timing::Reconciler;
use serde_json::{Map, Value, json};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BLOCK_COUNTS: &[usize] = &[100, 1_000, 10_000];
const CARS: usize = 20;

// ============================================================================
// Fixtures
// ============================================================================

fn timing_stream(blocks: usize) -> String {
    let mut raw = String::new();
    for i in 0..blocks {
        let car = i % CARS + 1;
        let block = json!({
            "Lines": {
                car.to_string(): {
                    "Position": (i % CARS + 1).to_string(),
                    "NumberOfLaps": i / CARS,
                    "LastLapTime": { "Value": "1:32.481", "PersonalFastest": i % 7 == 0 },
                    "GapToLeader": format!("+{}.{:03}", i % 30, i % 1000),
                    "IntervalToPositionAhead": { "Value": "+0.512" },
                }
            }
        });
        raw.push_str(&format!("00:{:02}:{:02}.{:03}", i / 3600 % 60, i / 60 % 60, i % 1000));
        raw.push_str(&block.to_string());
        raw.push_str("\r\n");
    }
    raw
}

fn partial(car: usize, lap: usize) -> Map<String, Value> {
    let value = json!({
        "Lines": {
            car.to_string(): {
                "NumberOfLaps": lap,
                "Sectors": { "1": { "Value": "28.114" } },
            }
        }
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn compressed(value: &Value) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(value.to_string().as_bytes()).unwrap();
    STANDARD.encode(encoder.finish().unwrap())
}

// ============================================================================
// Benchmark: Stream Parsing
// ============================================================================

fn bench_parse_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_blocks");

    for &count in BLOCK_COUNTS {
        let raw = timing_stream(count);
        group.bench_with_input(BenchmarkId::new("blocks", count), &raw, |b, raw| {
            b.iter(|| parse_blocks(black_box(raw)).count());
        });
        group.bench_with_input(BenchmarkId::new("line_updates", count), &raw, |b, raw| {
            b.iter(|| line_updates(black_box(raw)).count());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Deep Merge
// ============================================================================

fn bench_deep_merge(c: &mut Criterion) {
    let mut base = Map::new();
    for car in 1..=CARS {
        deep_merge(&mut base, partial(car, 0));
    }

    c.bench_function("deep_merge", |b| {
        b.iter(|| {
            let mut target = base.clone();
            for car in 1..=CARS {
                deep_merge(&mut target, black_box(partial(car, 12)));
            }
            target
        });
    });
}

// ============================================================================
// Benchmark: Inflation
// ============================================================================

fn bench_inflate(c: &mut Criterion) {
    let entries: Map<String, Value> = (1..=CARS)
        .map(|car| {
            (
                car.to_string(),
                json!({ "Status": "OnTrack", "X": car * 100, "Y": -(car as i64) * 40, "Z": 7 }),
            )
        })
        .collect();
    let payload = compressed(&json!({
        "Position": [{ "Timestamp": "2024-03-02T15:04:05.123Z", "Entries": entries }]
    }));

    c.bench_function("try_inflate", |b| {
        b.iter(|| try_inflate(black_box(&payload)));
    });
}

// ============================================================================
// Benchmark: Reconciliation
// ============================================================================

fn bench_reconcile(c: &mut Criterion) {
    let raw = timing_stream(1_000);

    c.bench_function("reconcile_stream", |b| {
        b.iter(|| {
            let mut reconciler = Reconciler::new();
            reconciler.apply_all(line_updates(black_box(&raw)));
            reconciler.standings()
        });
    });
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(
    benches,
    bench_parse_blocks,
    bench_deep_merge,
    bench_inflate,
    bench_reconcile
);
criterion_main!(benches);
