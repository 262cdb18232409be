use core::hint::black_box;
use core::time::Duration;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fibreg::{Algorithm, Dispatcher, DispatcherConfig, Precision, SequenceId};
use tokio::runtime::Builder;

// Inputs shared by every algorithm. All of them sit inside the fixed-precision
// envelope of the closed form, so the three produce identical values.
const INPUTS: [u64; 4] = [13, 94, 150, 300];

// Number of submissions per dispatcher benchmark iteration.
const TOTAL_SUBMISSIONS: usize = 256;

/// Evaluates each algorithm directly, outside the dispatcher.
fn bench_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("algorithm");
    for n in INPUTS {
        for algorithm in Algorithm::ALL {
            group.bench_with_input(BenchmarkId::new(algorithm.name(), n), &n, |b, &n| {
                b.iter(|| black_box(algorithm.compute(black_box(n), Precision::default())));
            });
        }
    }
    group.finish();
}

/// Compares fixed against adaptive precision for the closed form.
fn bench_closed_form_precision(c: &mut Criterion) {
    let mut group = c.benchmark_group("closed_form/precision");
    for n in [300_u64, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("fixed-256", n), &n, |b, &n| {
            b.iter(|| black_box(Algorithm::ClosedForm.compute(n, Precision::Fixed(256))));
        });
        group.bench_with_input(BenchmarkId::new("adaptive", n), &n, |b, &n| {
            b.iter(|| black_box(Algorithm::ClosedForm.compute(n, Precision::Adaptive)));
        });
    }
    group.finish();
}

/// Submits a burst of small computations and drains them.
fn bench_dispatcher(c: &mut Criterion) {
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let mut group = c.benchmark_group("dispatcher");
    group.throughput(Throughput::Elements(TOTAL_SUBMISSIONS as u64));
    group.sample_size(20);

    for algorithm in Algorithm::ALL {
        group.bench_function(
            format!("{}/submit_and_drain/elems/{TOTAL_SUBMISSIONS}", algorithm.name()),
            |b| {
                b.to_async(&rt).iter(|| async move {
                    let dispatcher = Dispatcher::new(DispatcherConfig::default());
                    let ids: Vec<SequenceId> = (0..TOTAL_SUBMISSIONS as u64)
                        .map(|n| dispatcher.submit(algorithm, n % 100).unwrap())
                        .collect();
                    let report = dispatcher.shutdown(Duration::from_secs(60)).await;
                    assert!(report.is_drained());
                    black_box(ids);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_algorithms,
    bench_closed_form_precision,
    bench_dispatcher
);
criterion_main!(benches);
