//! Benchmarks for averaging and model fitting

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;

use hcp_wm_core::types::{Event, RunEvents};
use hcp_wm_native::ml::logistic::{LogisticModel, SolverConfig};
use hcp_wm_native::processing::SelectiveAverager;

const TR: f64 = 0.72;

/// Synthetic regions × frames run (sinusoids with a per-region phase)
fn generate_run(n_regions: usize, n_frames: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_regions, n_frames), |(r, t)| {
        let phase = r as f64 * 0.37;
        (t as f64 * 0.11 + phase).sin() + (t as f64 * 0.023).cos() * 0.2
    })
}

/// Eight 27.5 s blocks spread over a run
fn generate_events() -> RunEvents {
    RunEvents::from_events((0..8).map(|i| Event::new(8.0 + i as f64 * 36.0, 27.5, 1.0)).collect())
}

fn bench_selective_average(c: &mut Criterion) {
    let mut group = c.benchmark_group("selective_average");
    let averager = SelectiveAverager::new(TR, 0);
    let evs = vec![generate_events(), generate_events()];

    for n_regions in [90, 360] {
        let series = vec![generate_run(n_regions, 405), generate_run(n_regions, 405)];
        group.bench_with_input(BenchmarkId::from_parameter(n_regions), &n_regions, |b, _| {
            b.iter(|| black_box(averager.average(black_box(&series), &evs)));
        });
    }

    group.finish();
}

fn bench_l1_logistic_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("l1_logistic_fit");
    group.sample_size(20);

    for n_regions in [60, 360] {
        let n = 200;
        let labels: Vec<usize> = (0..n).map(|i| i % 2).collect();
        let x = Array2::from_shape_fn((n, n_regions), |(i, j)| {
            let signal = if j < 5 && labels[i] == 1 { 0.8 } else { 0.0 };
            signal + ((i * 31 + j * 17) % 23) as f64 / 23.0 - 0.5
        });

        group.bench_with_input(BenchmarkId::from_parameter(n_regions), &n_regions, |b, _| {
            b.iter(|| black_box(LogisticModel::fit(x.view(), &labels, 1.0, &SolverConfig::default())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_selective_average, bench_l1_logistic_fit);

criterion_main!(benches);
