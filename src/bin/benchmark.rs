//! M-tree Benchmark Suite
//!
//! Measures:
//! - Insertion throughput with 2-means splits
//! - kNN and range query latency
//! - Fraction of distance computations saved by pruning
//! - Recall@k against a linear scan (should always be 100%)
//!
//! Run with: cargo run --release --bin benchmark

use std::collections::HashSet;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing_subscriber::EnvFilter;

use mtree::{Euclidean, MTree, MTreeConfig, Metric, SearchStats};

/// Benchmark configuration
struct BenchmarkConfig {
    /// Number of vectors to insert
    num_vectors: usize,

    /// Vector dimensionality
    dimension: usize,

    /// Number of queries to run
    num_queries: usize,

    /// k for k-NN queries
    k: usize,

    /// Radius for range queries
    range: f32,

    /// Node capacity
    max_entries: usize,

    seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            num_vectors: 10_000,
            dimension: 16,
            num_queries: 500,
            k: 10,
            range: 4.0,
            max_entries: 16,
            seed: 7,
        }
    }
}

/// Benchmark results
#[derive(Debug)]
struct BenchmarkResults {
    // Insertion metrics
    insert_time_total_ms: f64,
    insert_time_per_vector_us: f64,

    // kNN metrics
    knn_time_per_query_us: f64,
    queries_per_second: f64,
    recall_at_k: f64,

    // Range metrics
    range_time_per_query_us: f64,
    avg_range_hits: f64,

    // Tree statistics
    tree_height: u32,
    node_count: usize,
    tree_memory_mb: f64,

    // Pruning
    avg_knn_distance_computations: f64,
    avg_range_distance_computations: f64,
    avg_nodes_visited: f64,
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?,
    );
    Ok(pb)
}

/// Generate random vectors clustered in groups
fn generate_clustered_vectors(
    rng: &mut ChaCha8Rng,
    num_vectors: usize,
    dim: usize,
    num_clusters: usize,
) -> Result<Vec<Vec<f32>>> {
    let normal = Normal::new(0.0, 1.0)?;

    let centers: Vec<Vec<f32>> = (0..num_clusters)
        .map(|_| (0..dim).map(|_| normal.sample(rng) as f32 * 10.0).collect())
        .collect();

    Ok((0..num_vectors)
        .map(|i| {
            centers[i % num_clusters]
                .iter()
                .map(|c| c + normal.sample(rng) as f32)
                .collect()
        })
        .collect())
}

/// Ground truth k-NN ids using a linear scan, plus the kth distance
fn brute_force_knn(vectors: &[Vec<f32>], query: &[f32], k: usize) -> (Vec<String>, f32) {
    let mut distances: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (i, Euclidean.distance(query, v)))
        .collect();

    distances.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    distances.truncate(k);
    let kth = distances.last().map_or(0.0, |(_, d)| *d);
    (distances.iter().map(|(i, _)| i.to_string()).collect(), kth)
}

/// Recall@k, counting a miss only when the tree's hit is farther than the
/// true kth neighbour (ties at the boundary are interchangeable)
fn compute_recall(
    tree_ids: &[String],
    ground_truth: &[String],
    tree_kth: f32,
    true_kth: f32,
    k: usize,
) -> f64 {
    if tree_kth <= true_kth {
        return 1.0;
    }
    let tree_set: HashSet<_> = tree_ids.iter().collect();
    let gt_set: HashSet<_> = ground_truth.iter().take(k).collect();
    tree_set.intersection(&gt_set).count() as f64 / k as f64
}

fn accumulate(total: &mut SearchStats, stats: &SearchStats) {
    total.nodes_visited += stats.nodes_visited;
    total.distance_computations += stats.distance_computations;
    total.parent_distance_pruned += stats.parent_distance_pruned;
}

fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkResults> {
    println!("\n========================================");
    println!("  M-tree Benchmark Suite");
    println!("========================================\n");

    println!("Configuration:");
    println!("  Vectors: {}", config.num_vectors);
    println!("  Dimension: {}", config.dimension);
    println!("  Queries: {}", config.num_queries);
    println!("  k: {}", config.k);
    println!("  Range: {}", config.range);
    println!("  Max entries: {}", config.max_entries);
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    println!("Generating {} clustered vectors...", config.num_vectors);
    let vectors = generate_clustered_vectors(&mut rng, config.num_vectors, config.dimension, 20)?;

    let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(config.max_entries), config.seed)?;

    // Insertion
    println!("\n--- Insertion Benchmark ---");
    let pb = progress_bar(config.num_vectors)?;
    let insert_start = Instant::now();
    for (i, v) in vectors.iter().enumerate() {
        tree.insert(v.clone(), i.to_string())?;
        pb.inc(1);
    }
    let insert_time = insert_start.elapsed();
    pb.finish_with_message("Done");

    let insert_time_total_ms = insert_time.as_secs_f64() * 1000.0;
    let insert_time_per_vector_us = insert_time.as_micros() as f64 / config.num_vectors as f64;
    println!("  Total time: {:.2} ms", insert_time_total_ms);
    println!("  Per vector: {:.2} µs", insert_time_per_vector_us);

    tree.check_invariants()?;
    let stats = tree.stats();
    println!("\nTree Statistics:");
    println!("  Height: {}", stats.height);
    println!("  Nodes: {} ({} leaves)", stats.node_count, stats.leaf_count);
    println!("  Fill factor: {:.2}", stats.fill_factor);
    println!("  Memory: {:.2} MB", stats.memory_bytes as f64 / 1_000_000.0);

    let query_indices: Vec<usize> = (0..config.num_queries)
        .map(|_| rng.gen_range(0..config.num_vectors))
        .collect();

    // kNN
    println!("\n--- kNN Benchmark ---");
    let pb = progress_bar(config.num_queries)?;
    let mut total_recall = 0.0;
    let mut knn_totals = SearchStats::default();
    let mut knn_time = std::time::Duration::ZERO;
    for &idx in &query_indices {
        let query = &vectors[idx];
        let start = Instant::now();
        let (hits, query_stats) = tree.knn_search_with_stats(query, config.k)?;
        knn_time += start.elapsed();
        accumulate(&mut knn_totals, &query_stats);

        let (ground_truth, true_kth) = brute_force_knn(&vectors, query, config.k);
        let tree_kth = hits.last().map_or(f32::INFINITY, |h| h.distance);
        let ids: Vec<String> = hits.into_iter().map(|h| h.id).collect();
        total_recall += compute_recall(&ids, &ground_truth, tree_kth, true_kth, config.k);
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let knn_time_per_query_us = knn_time.as_micros() as f64 / config.num_queries as f64;
    let queries_per_second = config.num_queries as f64 / knn_time.as_secs_f64();
    let recall_at_k = total_recall / config.num_queries as f64;
    println!("  Per query: {:.2} µs", knn_time_per_query_us);
    println!("  Queries/sec: {:.0}", queries_per_second);
    println!("  Recall@{}: {:.2}%", config.k, recall_at_k * 100.0);
    if recall_at_k < 1.0 {
        bail!("kNN search missed true neighbours (recall {:.4})", recall_at_k);
    }

    // Range
    println!("\n--- Range Benchmark ---");
    let mut range_totals = SearchStats::default();
    let mut total_hits = 0usize;
    let range_start = Instant::now();
    for &idx in &query_indices {
        let (hits, query_stats) = tree.range_search_with_stats(&vectors[idx], config.range)?;
        total_hits += hits.len();
        accumulate(&mut range_totals, &query_stats);
    }
    let range_time = range_start.elapsed();
    let range_time_per_query_us = range_time.as_micros() as f64 / config.num_queries as f64;
    let avg_range_hits = total_hits as f64 / config.num_queries as f64;
    println!("  Per query: {:.2} µs", range_time_per_query_us);
    println!("  Avg hits: {:.1}", avg_range_hits);

    // Batch kNN
    println!("\n--- Parallel Batch kNN ---");
    let batch: Vec<Vec<f32>> = query_indices.iter().map(|&i| vectors[i].clone()).collect();
    let batch_start = Instant::now();
    let batch_results = tree.knn_search_batch(&batch, config.k)?;
    let batch_time = batch_start.elapsed();
    println!(
        "  {} queries in {:.2} ms ({:.0} queries/sec)",
        batch_results.len(),
        batch_time.as_secs_f64() * 1000.0,
        batch_results.len() as f64 / batch_time.as_secs_f64()
    );

    let n = config.num_queries as f64;
    let avg_knn_distance_computations = knn_totals.distance_computations as f64 / n;
    let avg_range_distance_computations = range_totals.distance_computations as f64 / n;
    let avg_nodes_visited = knn_totals.nodes_visited as f64 / n;

    println!("\n--- Pruning Statistics ---");
    println!(
        "  kNN distance computations: {:.1} ({:.1}% of linear scan)",
        avg_knn_distance_computations,
        100.0 * avg_knn_distance_computations / config.num_vectors as f64
    );
    println!(
        "  Range distance computations: {:.1} ({:.1}% of linear scan)",
        avg_range_distance_computations,
        100.0 * avg_range_distance_computations / config.num_vectors as f64
    );
    println!("  Avg nodes visited (kNN): {:.1}", avg_nodes_visited);
    println!(
        "  Avg parent-distance prunes (kNN): {:.1}",
        knn_totals.parent_distance_pruned as f64 / n
    );

    Ok(BenchmarkResults {
        insert_time_total_ms,
        insert_time_per_vector_us,
        knn_time_per_query_us,
        queries_per_second,
        recall_at_k,
        range_time_per_query_us,
        avg_range_hits,
        tree_height: stats.height,
        node_count: stats.node_count,
        tree_memory_mb: stats.memory_bytes as f64 / 1_000_000.0,
        avg_knn_distance_computations,
        avg_range_distance_computations,
        avg_nodes_visited,
    })
}

fn run_scaling_benchmark() -> Result<()> {
    println!("\n========================================");
    println!("  Scaling Benchmark");
    println!("========================================\n");

    let sizes = [1_000, 5_000, 10_000, 25_000];
    let mut rows = Vec::new();
    for n in sizes {
        let config = BenchmarkConfig {
            num_vectors: n,
            num_queries: 100,
            ..BenchmarkConfig::default()
        };
        rows.push((n, run_benchmark(config)?));
    }

    println!(
        "\n{:>10} {:>12} {:>12} {:>8} {:>10} {:>10}",
        "N", "kNN µs", "Dist comps", "Height", "Nodes", "Memory MB"
    );
    println!("{:-<68}", "");
    for (n, results) in rows {
        println!(
            "{:>10} {:>12.1} {:>12.1} {:>8} {:>10} {:>10.2}",
            n,
            results.knn_time_per_query_us,
            results.avg_knn_distance_computations,
            results.tree_height,
            results.node_count,
            results.tree_memory_mb
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║              M-tree Metric Index Benchmarks                ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let results = run_benchmark(BenchmarkConfig::default())?;

    println!("\n========================================");
    println!("  Summary");
    println!("========================================");
    println!();
    println!("Performance:");
    println!(
        "  Insert throughput: {:.0} vectors/sec",
        1_000_000.0 / results.insert_time_per_vector_us
    );
    println!("  Insert total:      {:.1} ms", results.insert_time_total_ms);
    println!("  kNN throughput:    {:.0} queries/sec", results.queries_per_second);
    println!("  Range latency:     {:.1} µs", results.range_time_per_query_us);
    println!("  Range hits:        {:.1}", results.avg_range_hits);
    println!();
    println!("Accuracy:");
    println!("  Recall@10: {:.1}%", results.recall_at_k * 100.0);
    println!();
    println!("Pruning:");
    println!(
        "  kNN / range distance computations: {:.1} / {:.1}",
        results.avg_knn_distance_computations, results.avg_range_distance_computations
    );
    println!("  Nodes visited per kNN query: {:.1}", results.avg_nodes_visited);

    println!("\nRunning scaling benchmark...");
    run_scaling_benchmark()?;

    println!("\n✓ Benchmarks complete!");
    Ok(())
}
