//! Statistics engine benchmark
//!
//! Measures the per-measure cost of the two expensive steps of a run:
//!
//! 1. `bootstrap_mean_ci` - seeded percentile bootstrap of one column
//! 2. `analyze_measure` - Friedman + all pairwise Wilcoxon/sign tests
//!
//! A full objective run performs roughly one bootstrap per condition per
//! measure and one `analyze_measure` per tested measure.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench statistics_overhead
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feedback_stats::bootstrap::{bootstrap_mean_ci, BootstrapConfig};
use feedback_stats::condition::Condition;
use feedback_stats::hypothesis::{analyze_measure, TestConfig};
use feedback_stats::wide::{Observation, WideMatrix};

/// Deterministic pseudo-rates in [0, 1] with sixths, like six-trial blocks
fn rate(participant: usize, condition: usize) -> f64 {
    ((participant * 5 + condition * 3) % 7) as f64 / 6.0
}

fn bench_matrix(participants: usize) -> WideMatrix {
    let mut obs = Vec::with_capacity(participants * Condition::ALL.len());
    for p in 0..participants {
        for (c, condition) in Condition::ALL.iter().enumerate() {
            // Every 9th cell missing
            let value = if (p + c) % 9 == 8 { None } else { Some(rate(p, c)) };
            obs.push(Observation::new(format!("P{}", p + 1), *condition, value));
        }
    }
    WideMatrix::from_observations(&obs, &Condition::ALL).expect("unique keys")
}

/// Benchmark: bootstrap CI for one condition column
fn bench_bootstrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap_mean_ci");

    for resamples in [1_000usize, 5_000, 20_000] {
        let config = BootstrapConfig {
            resamples,
            ..BootstrapConfig::default()
        };
        let column = bench_matrix(24).column_values(0);

        group.bench_with_input(BenchmarkId::from_parameter(resamples), &resamples, |b, _| {
            b.iter(|| {
                black_box(bootstrap_mean_ci(black_box(&column), &config).expect("valid config"));
            });
        });
    }

    group.finish();
}

/// Benchmark: omnibus + pairwise tests for one measure
fn bench_analyze_measure(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_measure");
    let config = TestConfig::default();

    // 60 participants crosses the exact/normal threshold for large pairs
    for participants in [12usize, 24, 60] {
        let wide = bench_matrix(participants);
        group.bench_with_input(
            BenchmarkId::from_parameter(participants),
            &participants,
            |b, _| {
                b.iter(|| {
                    black_box(analyze_measure(black_box(&wide), &config).expect("valid config"));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_bootstrap, bench_analyze_measure);
criterion_main!(benches);
