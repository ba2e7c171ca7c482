use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use crtv_core::dsp::filter::{apply_fir_filter, make_fir_filter};

fn benchmark_filter_synthesis(c: &mut Criterion) {
    c.bench_function("make_fir_filter_256taps", |b| {
        b.iter(|| make_fir_filter(black_box(44_100.0 * 10.0), black_box(256), black_box(2e6), black_box(1e6), black_box(5.0)))
    });
}

fn benchmark_filter_application_sizes(c: &mut Criterion) {
    let fir = make_fir_filter(44_100.0 * 10.0, 256, 2e6, 1e6, 5.0).expect("kernel synthesis");

    let mut group = c.benchmark_group("apply_fir_filter");
    for size in [1_000usize, 10_000, 100_000, 1_000_000].iter() {
        let signal: Vec<f64> = (0..*size).map(|i| (i as f64 * 0.001).sin()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| apply_fir_filter(black_box(&signal), black_box(&fir)))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_filter_synthesis, benchmark_filter_application_sizes);
criterion_main!(benches);
