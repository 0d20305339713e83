//! Benchmarks for the cycle statistics engine
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use cycletrack::analysis::{cycle_gaps, history, CycleAnalysis, CycleParams};
use cycletrack::calendar::{parse, RecordedDate};

/// `count` dates spaced 26..=31 days apart
fn create_test_dates(count: usize) -> Vec<RecordedDate> {
    let mut date = parse("1990-01-01").unwrap();
    (0..count)
        .map(|i| {
            let current = date;
            date = date.add_days(26 + (i % 6) as i64);
            current
        })
        .collect()
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    let params = CycleParams::default();

    for size in [12, 120, 1200] {
        let dates = create_test_dates(size);
        let today = dates.last().copied().unwrap().add_days(10);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("gaps_{}", size), |b| {
            b.iter(|| cycle_gaps(black_box(&dates), &params))
        });

        group.bench_function(format!("history_{}", size), |b| {
            b.iter(|| history(black_box(&dates)))
        });

        group.bench_function(format!("full_{}", size), |b| {
            b.iter(|| CycleAnalysis::compute(black_box(dates.clone()), today, &params))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analysis);
criterion_main!(benches);
