//! Range and k-nearest-neighbor search
//!
//! Both searches prune with the triangle inequality. For a node owned by
//! routing object `p`, with `d(q, p)` already known, an entry `o` caching
//! `d(o, p)` satisfies
//!
//! ```text
//! |d(q, p) - d(o, p)| <= d(q, o)
//! ```
//!
//! so the cached parent distance rules an entry out before its own distance
//! is computed. A routing entry with cover radius `r` is ruled out when even
//! `d(q, o) - r` exceeds the search radius.
//!
//! kNN is a best-first branch-and-bound: subtrees wait in a min-queue keyed
//! by `dmin = max(d(q, o) - r, 0)`, and every improvement of the current
//! k-th distance `dk` drops queued subtrees with `dmin > dk`.
//!
//! Bounds are compared with a small relative slack so that rounding in
//! cached distances can only keep extra candidates, never drop a true
//! result. Emitted hits are still decided by their exact distance.
//!
//! All scratch state (queue, result buffer, `dk`, statistics) lives on the
//! stack of each call.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::node::{Entry, EntryKind, NodeId};
use crate::stats::SearchStats;
use crate::tree::MTree;
use crate::vector::FeatureVector;

/// Relative slack on pruning bounds.
const PRUNE_SLACK: f32 = 1e-5;

/// Whether a lower bound rules a candidate out against `limit`.
#[inline]
fn exceeds(lower_bound: f32, limit: f32) -> bool {
    lower_bound > limit + PRUNE_SLACK * limit.abs().max(1.0)
}

/// One search result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub distance: f32,
}

impl SearchHit {
    fn new(id: &str, distance: f32) -> Self {
        Self {
            id: id.to_string(),
            distance,
        }
    }
}

/// Ascending distance, ties by id
fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Subtree waiting to be expanded
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    /// Lower bound on the distance from the query to anything in the subtree
    dmin: OrderedFloat<f32>,
    node: NodeId,
    /// Distance from the query to the subtree's routing object
    d_owner: OrderedFloat<f32>,
}

/// Best `k` hits seen so far, sorted ascending
struct NearestNeighbors {
    k: usize,
    hits: Vec<SearchHit>,
}

impl NearestNeighbors {
    fn new(k: usize) -> Self {
        Self {
            k,
            hits: Vec::with_capacity(k + 1),
        }
    }

    /// Current k-th distance; infinite until `k` hits are held.
    fn bound(&self) -> f32 {
        if self.hits.len() < self.k {
            f32::INFINITY
        } else {
            self.hits[self.k - 1].distance
        }
    }

    fn is_full(&self) -> bool {
        self.hits.len() >= self.k
    }

    /// Insert a hit that beats the current k-th by (distance, id). Returns
    /// whether it was kept.
    fn offer(&mut self, id: &str, distance: f32) -> bool {
        if let Some(kth) = self.hits.get(self.k - 1) {
            if (distance, id) >= (kth.distance, kth.id.as_str()) {
                return false;
            }
        }
        let pos = self
            .hits
            .partition_point(|h| (h.distance, h.id.as_str()) < (distance, id));
        self.hits.insert(pos, SearchHit::new(id, distance));
        self.hits.truncate(self.k);
        true
    }

    fn into_hits(self) -> Vec<SearchHit> {
        let mut hits = self.hits;
        sort_hits(&mut hits);
        hits
    }
}

fn parent_distance(entry: &Entry, node_id: NodeId) -> Result<f32> {
    entry.parent_distance.ok_or_else(|| {
        Error::InvariantViolation(format!(
            "entry in non-root node {} has no parent distance",
            node_id
        ))
    })
}

impl<M: Metric, R> MTree<M, R> {
    /// All objects within `range` of `query` (inclusive), ascending by
    /// distance.
    pub fn range_search(&self, query: &[f32], range: f32) -> Result<Vec<SearchHit>> {
        let (hits, _) = self.range_search_with_stats(query, range)?;
        Ok(hits)
    }

    /// Range search with detailed statistics
    pub fn range_search_with_stats(
        &self,
        query: &[f32],
        range: f32,
    ) -> Result<(Vec<SearchHit>, SearchStats)> {
        self.check_query(query)?;
        if !range.is_finite() || range < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "range must be finite and non-negative, got {}",
                range
            )));
        }

        let mut stats = SearchStats::default();
        let mut hits = Vec::new();

        // Root entries have no parent distance to prune with.
        let root = self.node_ref(self.root)?;
        stats.nodes_visited += 1;
        for entry in &root.entries {
            let d = self.metric.distance(query, &entry.object);
            stats.distance_computations += 1;
            match &entry.kind {
                EntryKind::Routing {
                    subtree,
                    cover_radius,
                } => {
                    if !exceeds(d, range + cover_radius) {
                        self.range_node(*subtree, query, range, d, &mut hits, &mut stats)?;
                    }
                }
                EntryKind::Data { id } => {
                    if d <= range {
                        hits.push(SearchHit::new(id, d));
                    }
                }
            }
        }

        sort_hits(&mut hits);
        Ok((hits, stats))
    }

    /// Scan a non-root node whose routing object is `d_owner` from the query.
    fn range_node(
        &self,
        node_id: NodeId,
        query: &[f32],
        range: f32,
        d_owner: f32,
        hits: &mut Vec<SearchHit>,
        stats: &mut SearchStats,
    ) -> Result<()> {
        let node = self.node_ref(node_id)?;
        stats.nodes_visited += 1;

        for entry in &node.entries {
            let pd = parent_distance(entry, node_id)?;
            match &entry.kind {
                EntryKind::Data { id } => {
                    if exceeds((d_owner - pd).abs(), range) {
                        stats.parent_distance_pruned += 1;
                        continue;
                    }
                    let d = self.metric.distance(query, &entry.object);
                    stats.distance_computations += 1;
                    if d <= range {
                        hits.push(SearchHit::new(id, d));
                    }
                }
                EntryKind::Routing {
                    subtree,
                    cover_radius,
                } => {
                    if exceeds((d_owner - pd).abs(), range + cover_radius) {
                        stats.parent_distance_pruned += 1;
                        continue;
                    }
                    let d = self.metric.distance(query, &entry.object);
                    stats.distance_computations += 1;
                    if !exceeds(d, range + cover_radius) {
                        self.range_node(*subtree, query, range, d, hits, stats)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The `k` objects closest to `query`, ascending by distance.
    ///
    /// Fails with [`Error::InsufficientObjects`] when `k` exceeds the number
    /// of indexed objects.
    pub fn knn_search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let (hits, _) = self.knn_search_with_stats(query, k)?;
        Ok(hits)
    }

    /// kNN search with detailed statistics
    pub fn knn_search_with_stats(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<(Vec<SearchHit>, SearchStats)> {
        self.check_query(query)?;
        if k == 0 {
            return Err(Error::InvalidParameter("k must be at least 1".to_string()));
        }
        if k > self.object_count {
            return Err(Error::InsufficientObjects {
                requested: k,
                available: self.object_count,
            });
        }

        let mut stats = SearchStats::default();
        let root = self.node_ref(self.root)?;
        stats.nodes_visited += 1;

        if root.is_leaf() {
            let mut hits = Vec::with_capacity(root.len());
            for entry in &root.entries {
                let id = entry.id().ok_or_else(|| {
                    Error::InvariantViolation("routing entry in leaf root".to_string())
                })?;
                hits.push(SearchHit::new(id, self.metric.distance(query, &entry.object)));
                stats.distance_computations += 1;
            }
            sort_hits(&mut hits);
            hits.truncate(k);
            return Ok((hits, stats));
        }

        let mut nearest = NearestNeighbors::new(k);
        let mut queue: BinaryHeap<Reverse<Pending>> = BinaryHeap::new();

        for entry in &root.entries {
            let EntryKind::Routing {
                subtree,
                cover_radius,
            } = entry.kind
            else {
                return Err(Error::InvariantViolation(
                    "data entry in internal root".to_string(),
                ));
            };
            let d = self.metric.distance(query, &entry.object);
            stats.distance_computations += 1;
            queue.push(Reverse(Pending {
                dmin: OrderedFloat((d - cover_radius).max(0.0)),
                node: subtree,
                d_owner: OrderedFloat(d),
            }));
        }

        while let Some(Reverse(pending)) = queue.pop() {
            let node = self.node_ref(pending.node)?;
            let d_owner = pending.d_owner.0;
            stats.nodes_visited += 1;

            for entry in &node.entries {
                let pd = parent_distance(entry, pending.node)?;
                let dk = nearest.bound();

                match &entry.kind {
                    EntryKind::Data { id } => {
                        if exceeds((d_owner - pd).abs(), dk) {
                            stats.parent_distance_pruned += 1;
                            continue;
                        }
                        let d = self.metric.distance(query, &entry.object);
                        stats.distance_computations += 1;
                        if nearest.offer(id, d) && nearest.is_full() {
                            let dk = nearest.bound();
                            queue.retain(|Reverse(p)| !exceeds(p.dmin.0, dk));
                        }
                    }
                    EntryKind::Routing {
                        subtree,
                        cover_radius,
                    } => {
                        if exceeds((d_owner - pd).abs(), dk + cover_radius) {
                            stats.parent_distance_pruned += 1;
                            continue;
                        }
                        let d = self.metric.distance(query, &entry.object);
                        stats.distance_computations += 1;
                        let dmin = (d - cover_radius).max(0.0);
                        if !exceeds(dmin, dk) {
                            queue.push(Reverse(Pending {
                                dmin: OrderedFloat(dmin),
                                node: *subtree,
                                d_owner: OrderedFloat(d),
                            }));
                        }
                    }
                }
            }
        }

        Ok((nearest.into_hits(), stats))
    }

    /// Answer many kNN queries in parallel against the shared tree.
    pub fn knn_search_batch(
        &self,
        queries: &[FeatureVector],
        k: usize,
    ) -> Result<Vec<Vec<SearchHit>>>
    where
        M: Sync,
        R: Sync,
    {
        queries
            .par_iter()
            .map(|query| self.knn_search(query, k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MTreeConfig;
    use crate::metric::Euclidean;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn build(n: usize, dim: usize, max_entries: usize, seed: u64) -> (MTree, Vec<Vec<f32>>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points: Vec<Vec<f32>> = (0..n)
            .map(|_| (0..dim).map(|_| rng.gen_range(0.0..100.0)).collect())
            .collect();
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(max_entries), seed).unwrap();
        for (i, p) in points.iter().enumerate() {
            tree.insert(p.clone(), i.to_string()).unwrap();
        }
        (tree, points)
    }

    fn brute_force(points: &[Vec<f32>], query: &[f32]) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = points
            .iter()
            .enumerate()
            .map(|(i, p)| SearchHit::new(&i.to_string(), Euclidean.distance(query, p)))
            .collect();
        sort_hits(&mut hits);
        hits
    }

    #[test]
    fn test_range_matches_linear_scan() {
        let (tree, points) = build(300, 4, 6, 21);
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        for _ in 0..20 {
            let query: Vec<f32> = (0..4).map(|_| rng.gen_range(0.0..100.0)).collect();
            let range = rng.gen_range(5.0..40.0);
            let expected: Vec<SearchHit> = brute_force(&points, &query)
                .into_iter()
                .filter(|h| h.distance <= range)
                .collect();
            let hits = tree.range_search(&query, range).unwrap();
            let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
            let expected_ids: Vec<&str> = expected.iter().map(|h| h.id.as_str()).collect();
            assert_eq!(ids, expected_ids);
        }
    }

    #[test]
    fn test_range_zero_finds_exact_match() {
        let (tree, points) = build(200, 3, 5, 8);
        let hits = tree.range_search(&points[42], 0.0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "42");
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn test_knn_matches_linear_scan() {
        let (tree, points) = build(500, 3, 8, 31);
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        for k in [1, 3, 10, 50] {
            let query: Vec<f32> = (0..3).map(|_| rng.gen_range(0.0..100.0)).collect();
            let expected: Vec<String> = brute_force(&points, &query)
                .into_iter()
                .take(k)
                .map(|h| h.id)
                .collect();
            let hits = tree.knn_search(&query, k).unwrap();
            assert_eq!(hits.len(), k);
            let ids: Vec<String> = hits.iter().map(|h| h.id.clone()).collect();
            assert_eq!(ids, expected, "k = {}", k);
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn test_knn_on_leaf_root() {
        let (tree, points) = build(6, 2, 10, 4);
        assert_eq!(tree.height(), 1);
        let hits = tree.knn_search(&points[0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "0");
    }

    #[test]
    fn test_knn_prunes() {
        let (tree, _) = build(2000, 2, 10, 12);
        let (hits, stats) = tree.knn_search_with_stats(&[50.0, 50.0], 5).unwrap();
        assert_eq!(hits.len(), 5);
        assert!(
            stats.distance_computations < 2000,
            "computed {} distances",
            stats.distance_computations
        );
        assert!(stats.nodes_visited < tree.stats().node_count);
    }

    #[test]
    fn test_search_errors() {
        let empty = MTree::new(4).unwrap();
        assert!(matches!(empty.range_search(&[0.0], 1.0), Err(Error::EmptyTree)));
        assert!(matches!(empty.knn_search(&[0.0], 1), Err(Error::EmptyTree)));

        let (tree, _) = build(20, 3, 4, 1);
        assert!(matches!(
            tree.knn_search(&[0.0, 0.0, 0.0], 21),
            Err(Error::InsufficientObjects {
                requested: 21,
                available: 20
            })
        ));
        assert!(matches!(
            tree.knn_search(&[0.0, 0.0, 0.0], 0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            tree.range_search(&[0.0, 0.0], 1.0),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            tree.range_search(&[0.0, 0.0, 0.0], -1.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            tree.range_search(&[0.0, 0.0, 0.0], f32::NAN),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_batch_matches_sequential() {
        let (tree, points) = build(400, 3, 7, 17);
        let queries: Vec<Vec<f32>> = points.iter().step_by(40).cloned().collect();
        let batch = tree.knn_search_batch(&queries, 4).unwrap();
        assert_eq!(batch.len(), queries.len());
        for (query, hits) in queries.iter().zip(&batch) {
            assert_eq!(hits, &tree.knn_search(query, 4).unwrap());
        }
    }

    #[test]
    fn test_neighbor_buffer_keeps_best_k() {
        let mut nn = NearestNeighbors::new(2);
        assert_eq!(nn.bound(), f32::INFINITY);
        assert!(nn.offer("a", 5.0));
        assert!(!nn.is_full());
        assert!(nn.offer("b", 3.0));
        assert_eq!(nn.bound(), 5.0);
        assert!(!nn.offer("c", 6.0));
        assert!(nn.offer("d", 1.0));
        assert_eq!(nn.bound(), 3.0);
        let ids: Vec<String> = nn.into_hits().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["d", "b"]);
    }
}
