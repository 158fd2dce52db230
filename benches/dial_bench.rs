//! Benchmarks for rotary dial decoding and admin code matching.
//!
//! Decoding runs once per dialed number, so these numbers matter mostly as a
//! regression guard for the accumulator and the code matcher.
//!
//! ```sh
//! cargo bench --bench dial_bench
//! cargo bench --bench dial_bench -- match_digits
//! ```

use autophon_controller::DialAccumulator;
use autophon_core::{AdminCodes, DialCode};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// Pulse trains for numbers of increasing length.
fn pulse_trains() -> Vec<(&'static str, Vec<u32>)> {
    vec![
        ("cancel_code", vec![4, 3]),
        ("open_code", vec![4, 2, 3]),
        ("long_number", vec![7, 10, 7, 9, 1, 2, 3, 4, 5, 6, 10, 8]),
        ("max_digits", vec![1; 16]),
    ]
}

/// Benchmark accumulating pulse counts into digits.
fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");

    for (name, pulses) in pulse_trains() {
        group.throughput(Throughput::Elements(pulses.len() as u64));
        group.bench_with_input(BenchmarkId::new("push_pulses", name), &pulses, |b, pulses| {
            b.iter(|| {
                let mut acc = DialAccumulator::new();
                for p in pulses {
                    let _ = acc.push_pulses(black_box(*p));
                }
                black_box(acc)
            });
        });
    }

    group.finish();
}

/// Benchmark matching finished numbers against the admin codes.
fn bench_match_digits(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_digits");
    group.throughput(Throughput::Elements(1));

    let default_codes = AdminCodes::default();
    let long_codes = match (
        DialCode::new(vec![9, 8, 7, 6, 5, 4]),
        DialCode::new(vec![9, 8, 7, 6, 5, 3, 2]),
    ) {
        (Ok(open), Ok(cancel)) => AdminCodes::new(open, cancel).ok(),
        _ => None,
    };

    let cases: [(&str, &[u8]); 4] = [
        ("open", &[4, 2, 3][..]),
        ("cancel", &[4, 3][..]),
        ("prefix_only", &[4, 2][..]),
        ("unknown", &[1, 2, 3, 4, 5, 6, 7, 8][..]),
    ];

    for (name, digits) in cases {
        group.bench_function(BenchmarkId::new("default_codes", name), |b| {
            b.iter(|| black_box(default_codes.match_digits(black_box(digits))));
        });
    }

    if let Some(codes) = long_codes {
        group.bench_function("long_codes/open", |b| {
            b.iter(|| black_box(codes.match_digits(black_box(&[9u8, 8, 7, 6, 5, 4, 1][..]))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_accumulate, bench_match_digits);
criterion_main!(benches);
