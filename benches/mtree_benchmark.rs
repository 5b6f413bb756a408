//! Criterion benchmarks for the M-tree

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtree::{MTree, MTreeConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_points(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(0.0..100.0)).collect())
        .collect()
}

fn build_tree(points: &[Vec<f32>], max_entries: usize) -> MTree {
    let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(max_entries), 1)
        .expect("valid config");
    for (i, p) in points.iter().enumerate() {
        tree.insert(p.clone(), i.to_string()).expect("insert");
    }
    tree
}

fn benchmark_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [100, 1000, 5000].iter() {
        let points = random_points(*size, 16, 3);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| build_tree(black_box(&points), 10));
        });
    }

    group.finish();
}

fn benchmark_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn");

    let points = random_points(10_000, 16, 5);
    let tree = build_tree(&points, 10);
    let query = random_points(1, 16, 99).remove(0);

    for k in [1, 10, 50].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, k| {
            b.iter(|| tree.knn_search(black_box(&query), *k));
        });
    }

    group.finish();
}

fn benchmark_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("range");

    let points = random_points(10_000, 16, 5);
    let tree = build_tree(&points, 10);
    let query = random_points(1, 16, 99).remove(0);

    for radius in [10.0f32, 40.0, 80.0].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(radius), radius, |b, r| {
            b.iter(|| tree.range_search(black_box(&query), *r));
        });
    }

    group.finish();
}

fn benchmark_node_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_by_capacity");

    let points = random_points(5_000, 16, 8);
    let query = random_points(1, 16, 42).remove(0);

    for max_entries in [4, 10, 32].iter() {
        let tree = build_tree(&points, *max_entries);
        group.bench_with_input(
            BenchmarkId::from_parameter(max_entries),
            max_entries,
            |b, _| {
                b.iter(|| tree.knn_search(black_box(&query), 10));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_knn,
    benchmark_range,
    benchmark_node_capacity
);
criterion_main!(benches);
