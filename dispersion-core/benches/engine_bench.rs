//! Criterion benchmarks for the dispersion hot paths.
//!
//! Benchmarks:
//! 1. compute_series over growing histories
//! 2. scan_many over a synthetic universe, serial vs parallel

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dispersion_core::data::SyntheticFeed;
use dispersion_core::{compute_series, scan_many, FetchWindow, PriceSeries, ScanParams};

fn make_series(n: usize) -> PriceSeries {
    let base_date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    PriceSeries::from_closes(
        "BENCH",
        (0..n).map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            (base_date + chrono::Duration::days(i as i64), close)
        }),
    )
    .unwrap()
}

fn bench_compute_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_series");
    for n in [60usize, 500, 5_000] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| compute_series(black_box(s), 29).unwrap().count())
        });
    }
    group.finish();
}

fn bench_scan_many(c: &mut Criterion) {
    let feed = SyntheticFeed::new();
    let symbols: Vec<String> = (0..200).map(|i| format!("SYM{i:03}")).collect();
    let window = FetchWindow::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    );

    let mut group = c.benchmark_group("scan_many");
    for parallel in [false, true] {
        let params = ScanParams::default().with_parallelism(parallel);
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "parallel" } else { "serial" }),
            &params,
            |b, p| b.iter(|| scan_many(&feed, black_box(&symbols), window, p)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_compute_series, bench_scan_many);
criterion_main!(benches);
