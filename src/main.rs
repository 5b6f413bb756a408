//! M-tree demo
//!
//! Builds a tree over random points, runs one range query and one kNN query
//! around a stored point, and checks both against a linear scan.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mtree::{MTree, MTreeConfig, Metric, SearchHit};

#[derive(Parser, Debug)]
#[command(name = "mtree")]
#[command(about = "Build an M-tree over random points and query it", long_about = None)]
struct Cli {
    /// Number of points to insert
    #[arg(long, default_value_t = 1000)]
    points: usize,

    /// Point dimensionality
    #[arg(long, default_value_t = 3)]
    dim: usize,

    /// Node capacity (ignored when --config is given)
    #[arg(long, default_value_t = 10)]
    max_entries: usize,

    /// Seed for point generation and node splits
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Range query radius
    #[arg(long, default_value_t = 30.0)]
    range: f32,

    /// Neighbours to fetch
    #[arg(long, default_value_t = 5)]
    k: usize,

    /// JSON file with an MTreeConfig
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the tree structure as JSON to this path
    #[arg(long)]
    export: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<MTreeConfig> {
    match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            MTreeConfig::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(MTreeConfig::with_max_entries(cli.max_entries)),
    }
}

fn brute_force<M: Metric>(
    metric: &M,
    points: &[Vec<f32>],
    query: &[f32],
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = points
        .iter()
        .enumerate()
        .map(|(i, p)| SearchHit {
            id: i.to_string(),
            distance: metric.distance(query, p),
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
    hits
}

fn sorted_ids(hits: &[SearchHit]) -> Vec<&str> {
    let mut ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    ids.sort_unstable();
    ids
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.points == 0 {
        bail!("--points must be at least 1");
    }
    let config = load_config(&cli)?;

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let points: Vec<Vec<f32>> = (0..cli.points)
        .map(|_| (0..cli.dim).map(|_| rng.gen_range(0.0..100.0)).collect())
        .collect();

    let mut tree = MTree::with_seed(config, cli.seed)?;
    for (i, p) in points.iter().enumerate() {
        tree.insert(p.clone(), i.to_string())
            .with_context(|| format!("inserting point {}", i))?;
    }
    tree.check_invariants().context("tree invariants after build")?;

    let stats = tree.stats();
    info!(
        objects = stats.object_count,
        nodes = stats.node_count,
        height = stats.height,
        "tree built"
    );
    println!("Tree Statistics:");
    println!("  Max entries: {}", tree.config().max_entries);
    println!("  Objects: {}", stats.object_count);
    println!("  Nodes: {} ({} leaves)", stats.node_count, stats.leaf_count);
    println!("  Height: {}", stats.height);
    println!("  Fill factor: {:.2}", stats.fill_factor);
    println!("  Memory: {:.2} KB", stats.memory_bytes as f64 / 1024.0);

    let query = &points[cli.points / 2];
    let truth = brute_force(tree.metric(), &points, query);
    println!("\nQuery point #{}: {:?}", cli.points / 2, query);

    let (in_range, range_stats) = tree.range_search_with_stats(query, cli.range)?;
    let expected: Vec<SearchHit> = truth
        .iter()
        .filter(|h| h.distance <= cli.range)
        .cloned()
        .collect();
    println!("\nRange search (r = {}):", cli.range);
    println!("  Hits: {}", in_range.len());
    println!(
        "  Distance computations: {} of {}",
        range_stats.distance_computations, cli.points
    );
    println!("  Nodes visited: {}", range_stats.nodes_visited);
    if sorted_ids(&in_range) != sorted_ids(&expected) {
        bail!("range search disagrees with linear scan");
    }
    println!("  Matches linear scan ✓");

    let k = cli.k.min(cli.points);
    let (nearest, knn_stats) = tree.knn_search_with_stats(query, k)?;
    println!("\nkNN search (k = {}):", k);
    for hit in &nearest {
        println!("  {:>6}  {:.4}", hit.id, hit.distance);
    }
    println!(
        "  Distance computations: {} of {}",
        knn_stats.distance_computations, cli.points
    );
    let kth = truth[k - 1].distance;
    if nearest.len() != k || nearest.iter().any(|h| h.distance > kth) {
        bail!("kNN search disagrees with linear scan");
    }
    println!("  Matches linear scan ✓");

    if let Some(path) = &cli.export {
        fs::write(path, tree.to_json_pretty()?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("\nTree exported to {}", path.display());
    }

    Ok(())
}
