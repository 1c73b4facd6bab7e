//! Ground-truth throughput vs block size.
//!
//! Block size trades peak memory (one `block_size x N` grid) against the
//! per-block overhead of allocating that grid.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use verity::benchmark::clustered_dataset;
use verity::ground_truth::{compute_true_knn, GroundTruthConfig};

fn bench_block_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("ground_truth_block_size");
    group.sample_size(10);

    let ds = clustered_dataset(5000, 512, 64, 32, 0.05, 42);
    group.throughput(Throughput::Elements(512));

    for block_size in [16, 64, 128, 512].iter() {
        let config = GroundTruthConfig {
            k: 100,
            block_size: *block_size,
            progress_every: 0,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(block_size), block_size, |bench, _| {
            bench.iter(|| compute_true_knn(black_box(&ds.base), black_box(&ds.queries), &config).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_block_size);
criterion_main!(benches);
