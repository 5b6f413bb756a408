//! Binary partitioning of an overflowing node.
//!
//! A constrained 2-means used purely as a split heuristic:
//!
//! 1. seed: first centroid uniform at random, second drawn with probability
//!    proportional to its distance (not squared) from the first
//! 2. assign every point to its nearest centroid, ties to cluster 0
//! 3. move each centroid to the mean of its members (empty clusters keep
//!    their centroid)
//! 4. stop when cluster sizes settle within `tolerance`, or after
//!    `max_iterations`
//!
//! Exact convergence is not a goal. A bounded iteration count keeps split
//! cost predictable, and the result only needs to be a reasonably balanced
//! partition with small cover radii.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::{MTreeConfig, CLUSTER_COUNT};
use crate::metric::Metric;
use crate::vector::{mean, FeatureVector};

/// Outcome of one partitioning run.
#[derive(Clone, Debug)]
pub struct Partition {
    /// Final centroid of each cluster; these become routing objects.
    pub centroids: [FeatureVector; CLUSTER_COUNT],

    /// Cluster index of every input point, in input order.
    pub assignment: Vec<usize>,

    /// Assignment passes actually run.
    pub iterations: usize,
}

impl Partition {
    /// Number of points assigned to each cluster.
    pub fn cluster_sizes(&self) -> [usize; CLUSTER_COUNT] {
        cluster_sizes(&self.assignment)
    }
}

/// Splits a point set into two clusters.
#[derive(Clone, Copy, Debug)]
pub struct Partitioner {
    tolerance: usize,
    max_iterations: usize,
}

impl Partitioner {
    pub fn new(tolerance: usize, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    pub fn from_config(config: &MTreeConfig) -> Self {
        Self::new(config.tolerance, config.max_iterations)
    }

    /// Partition `points` (all of one dimension) into two clusters.
    ///
    /// With two or more points neither cluster comes back empty: a
    /// degenerate run hands the outlier of the occupied cluster to the empty
    /// one.
    pub fn partition<M, R>(&self, points: &[&[f32]], metric: &M, rng: &mut R) -> Partition
    where
        M: Metric + ?Sized,
        R: Rng,
    {
        if points.is_empty() {
            return Partition {
                centroids: [Vec::new(), Vec::new()],
                assignment: Vec::new(),
                iterations: 0,
            };
        }

        let dim = points[0].len();
        let mut centroids = seed_centroids(points, metric, rng);
        let mut assignment = vec![0usize; points.len()];
        let mut previous_sizes: Option<[usize; CLUSTER_COUNT]> = None;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            let sizes = assign(points, &centroids, metric, &mut assignment);
            for (cluster, centroid) in centroids.iter_mut().enumerate() {
                if let Some(m) = mean(members_of(points, &assignment, cluster), dim) {
                    *centroid = m;
                }
            }

            let converged = previous_sizes.map_or(false, |prev| {
                prev.iter()
                    .zip(sizes.iter())
                    .all(|(a, b)| a.abs_diff(*b) < self.tolerance)
            });
            previous_sizes = Some(sizes);
            if converged {
                break;
            }
        }

        rebalance(points, &mut centroids, &mut assignment, metric);

        Partition {
            centroids,
            assignment,
            iterations,
        }
    }
}

/// k-means++ style seeding with distance (not distance²) weights.
fn seed_centroids<M, R>(points: &[&[f32]], metric: &M, rng: &mut R) -> [FeatureVector; CLUSTER_COUNT]
where
    M: Metric + ?Sized,
    R: Rng,
{
    let first = rng.gen_range(0..points.len());
    let weights: Vec<f32> = points
        .iter()
        .map(|p| metric.distance(p, points[first]))
        .collect();

    // Uniform draw when every point coincides with the first centroid, or
    // when a custom metric produced a non-finite distance.
    let weighted = if weights.iter().all(|w| w.is_finite()) {
        WeightedIndex::new(&weights).ok()
    } else {
        None
    };
    let second = match weighted {
        Some(categorical) => categorical.sample(rng),
        None => rng.gen_range(0..points.len()),
    };

    [points[first].to_vec(), points[second].to_vec()]
}

/// Nearest-centroid assignment. Returns the resulting cluster sizes.
fn assign<M>(
    points: &[&[f32]],
    centroids: &[FeatureVector; CLUSTER_COUNT],
    metric: &M,
    assignment: &mut [usize],
) -> [usize; CLUSTER_COUNT]
where
    M: Metric + ?Sized,
{
    let mut sizes = [0usize; CLUSTER_COUNT];
    for (point, slot) in points.iter().zip(assignment.iter_mut()) {
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (cluster, centroid) in centroids.iter().enumerate() {
            let d = metric.distance(point, centroid);
            if d < best_distance {
                best = cluster;
                best_distance = d;
            }
        }
        *slot = best;
        sizes[best] += 1;
    }
    sizes
}

fn members_of<'a>(
    points: &'a [&'a [f32]],
    assignment: &'a [usize],
    cluster: usize,
) -> impl Iterator<Item = &'a [f32]> + 'a {
    points
        .iter()
        .zip(assignment.iter())
        .filter(move |&(_, &c)| c == cluster)
        .map(|(p, _)| *p)
}

fn cluster_sizes(assignment: &[usize]) -> [usize; CLUSTER_COUNT] {
    let mut sizes = [0usize; CLUSTER_COUNT];
    for &c in assignment {
        sizes[c] += 1;
    }
    sizes
}

/// Refill an empty cluster with the farthest member of the other one.
fn rebalance<M>(
    points: &[&[f32]],
    centroids: &mut [FeatureVector; CLUSTER_COUNT],
    assignment: &mut [usize],
    metric: &M,
) where
    M: Metric + ?Sized,
{
    if points.len() < CLUSTER_COUNT {
        return;
    }
    let sizes = cluster_sizes(assignment);
    let Some(empty) = sizes.iter().position(|&s| s == 0) else {
        return;
    };
    let occupied = 1 - empty;

    let outlier = assignment
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == occupied)
        .map(|(i, _)| (i, metric.distance(points[i], &centroids[occupied])))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i);

    if let Some(idx) = outlier {
        assignment[idx] = empty;
        centroids[empty] = points[idx].to_vec();
        let dim = points[idx].len();
        if let Some(m) = mean(members_of(points, assignment, occupied), dim) {
            centroids[occupied] = m;
        }
        tracing::trace!(moved = idx, "partitioner refilled an empty cluster");
    }
}
