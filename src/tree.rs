//! M-tree: insertion and node splitting
//!
//! ## Algorithm Overview
//!
//! ### Insert
//! 1. Start at root
//! 2. At an internal node, prefer the entry that already covers the object
//!    with the smallest distance; otherwise take the entry needing the
//!    smallest cover radius enlargement and enlarge it
//! 3. At a leaf, append the data entry if there is room
//! 4. Otherwise split: partition the overflowing entries with 2-means,
//!    move one cluster into a sibling, rewrite the owning routing entry and
//!    promote a routing entry for the sibling into the parent
//! 5. Promotion into a full parent splits the parent; a root split grows a
//!    new root
//!
//! Every structural change re-derives cover radii from cached parent
//! distances and rewrites the cached distances of moved entries, so the
//! bounds used for pruning at search time stay sound.
//!
//! Searches live in [`crate::search`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::config::MTreeConfig;
use crate::error::{Error, Result};
use crate::metric::{Euclidean, Metric};
use crate::node::{Entry, EntryKind, EntryRef, Node, NodeId};
use crate::partition::Partitioner;
use crate::stats::TreeStats;
use crate::vector::{check_components, FeatureVector};

/// Relative slack allowed when verifying cached floating-point distances.
const VERIFY_EPSILON: f32 = 1e-4;

/// The M-tree index
///
/// `M` is the metric; `R` is the random source used by node splits.
/// Searches take `&self` and keep all scratch state local, so a tree can be
/// searched from several threads at once. Inserts need `&mut self`.
#[derive(Debug)]
pub struct MTree<M = Euclidean, R = ChaCha8Rng> {
    pub(crate) config: MTreeConfig,
    pub(crate) partitioner: Partitioner,
    pub(crate) metric: M,
    pub(crate) rng: R,
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) dimension: Option<usize>,
    pub(crate) object_count: usize,
}

impl MTree {
    /// Euclidean tree with `max_entries` per node, seeded from OS entropy.
    pub fn new(max_entries: usize) -> Result<Self> {
        Self::with_config(MTreeConfig::with_max_entries(max_entries))
    }

    pub fn with_config(config: MTreeConfig) -> Result<Self> {
        Self::with_metric_and_rng(config, Euclidean, ChaCha8Rng::from_entropy())
    }

    /// Euclidean tree whose splits are reproducible for a given seed.
    pub fn with_seed(config: MTreeConfig, seed: u64) -> Result<Self> {
        Self::with_metric_and_rng(config, Euclidean, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl Default for MTree {
    fn default() -> Self {
        Self::build(
            MTreeConfig::default(),
            Euclidean,
            ChaCha8Rng::from_entropy(),
        )
    }
}

impl<M: Metric> MTree<M, ChaCha8Rng> {
    pub fn with_metric(config: MTreeConfig, metric: M, seed: u64) -> Result<Self> {
        Self::with_metric_and_rng(config, metric, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<M, R> MTree<M, R> {
    pub fn with_metric_and_rng(config: MTreeConfig, metric: M, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, metric, rng))
    }

    fn build(config: MTreeConfig, metric: M, rng: R) -> Self {
        Self {
            partitioner: Partitioner::from_config(&config),
            config,
            metric,
            rng,
            nodes: vec![Node::new_leaf()],
            root: 0,
            dimension: None,
            object_count: 0,
        }
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.object_count
    }

    pub fn is_empty(&self) -> bool {
        self.object_count == 0
    }

    /// Dimension fixed by the first insert
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn config(&self) -> &MTreeConfig {
        &self.config
    }

    pub fn max_entries(&self) -> usize {
        self.config.max_entries
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Number of levels, counting the leaf level
    pub fn height(&self) -> u32 {
        self.nodes[self.root].level + 1
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get tree statistics
    pub fn stats(&self) -> TreeStats {
        let node_count = self.nodes.len();
        let entry_count: usize = self.nodes.iter().map(Node::len).sum();
        TreeStats {
            object_count: self.object_count,
            node_count,
            leaf_count: self.nodes.iter().filter(|n| n.is_leaf()).count(),
            height: self.height(),
            dimension: self.dimension,
            fill_factor: entry_count as f64 / node_count as f64,
            memory_bytes: self.memory_size(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.nodes.iter().map(Node::memory_size).sum()
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::InvariantViolation(format!("dangling node id {}", id)))
    }

    pub(crate) fn entry(&self, at: EntryRef) -> Result<&Entry> {
        self.node_ref(at.node)?.entries.get(at.slot).ok_or_else(|| {
            Error::InvariantViolation(format!("dangling entry {}:{}", at.node, at.slot))
        })
    }

    fn entry_mut(&mut self, at: EntryRef) -> Result<&mut Entry> {
        self.nodes
            .get_mut(at.node)
            .and_then(|n| n.entries.get_mut(at.slot))
            .ok_or_else(|| {
                Error::InvariantViolation(format!("dangling entry {}:{}", at.node, at.slot))
            })
    }

    /// Validate a vector against the tree's established dimension.
    pub(crate) fn check_vector(&self, v: &[f32]) -> Result<()> {
        check_components(v)?;
        match self.dimension {
            Some(expected) if expected != v.len() => Err(Error::DimensionMismatch {
                expected,
                actual: v.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Common preconditions of every search.
    pub(crate) fn check_query(&self, query: &[f32]) -> Result<()> {
        if self.is_empty() {
            return Err(Error::EmptyTree);
        }
        self.check_vector(query)
    }

    fn alloc_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Append `entry` to `node_id`, pointing the entry's subtree back at it.
    fn store(&mut self, node_id: NodeId, entry: Entry) {
        let subtree = entry.subtree();
        let node = &mut self.nodes[node_id];
        node.entries.push(entry);
        let slot = node.entries.len() - 1;
        if let Some(child) = subtree {
            self.nodes[child].owner = Some(EntryRef {
                node: node_id,
                slot,
            });
        }
    }

    /// Re-point every child of `node_id` at its current slot.
    fn relink_children(&mut self, node_id: NodeId) {
        let children: Vec<(usize, NodeId)> = self.nodes[node_id]
            .entries
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| e.subtree().map(|child| (slot, child)))
            .collect();

        for (slot, child) in children {
            self.nodes[child].owner = Some(EntryRef {
                node: node_id,
                slot,
            });
        }
    }
}

impl<M: Metric, R: Rng> MTree<M, R> {
    /// Insert an object under `id`.
    ///
    /// Fails with [`Error::DimensionMismatch`] when `object`'s length differs
    /// from the vectors already indexed.
    pub fn insert(&mut self, object: FeatureVector, id: impl Into<String>) -> Result<()> {
        self.check_vector(&object)?;
        let dim = object.len();

        self.insert_recursive(self.root, object, id.into(), None)?;

        self.dimension = Some(dim);
        self.object_count += 1;
        Ok(())
    }

    fn insert_recursive(
        &mut self,
        node_id: NodeId,
        object: FeatureVector,
        id: String,
        parent_distance: Option<f32>,
    ) -> Result<()> {
        if self.node_ref(node_id)?.is_leaf() {
            let entry = Entry::data(object, id, parent_distance);
            if self.nodes[node_id].len() >= self.config.max_entries {
                return self.split(node_id, entry);
            }
            self.store(node_id, entry);
            return Ok(());
        }

        let (child_id, distance) = self.choose_subtree(node_id, &object)?;
        self.insert_recursive(child_id, object, id, Some(distance))
    }

    /// Pick the routing entry of `node_id` to descend into, enlarging its
    /// cover radius when no entry covers `object` yet.
    ///
    /// Returns the child node and the distance from `object` to the chosen
    /// routing object.
    fn choose_subtree(&mut self, node_id: NodeId, object: &[f32]) -> Result<(NodeId, f32)> {
        let metric = &self.metric;
        let node = &mut self.nodes[node_id];

        // (slot, distance) of the closest covering entry
        let mut covering: Option<(usize, f32)> = None;
        // (slot, distance, enlargement) of the cheapest entry to grow
        let mut cheapest: Option<(usize, f32, f32)> = None;

        for (slot, entry) in node.entries.iter().enumerate() {
            let EntryKind::Routing { cover_radius, .. } = entry.kind else {
                return Err(Error::InvariantViolation(format!(
                    "data entry at internal node {} slot {}",
                    node_id, slot
                )));
            };
            let distance = metric.distance(object, &entry.object);
            let enlargement = distance - cover_radius;

            if enlargement <= 0.0 {
                if covering.map_or(true, |(_, best)| distance < best) {
                    covering = Some((slot, distance));
                }
            } else if cheapest.map_or(true, |(_, _, best)| enlargement < best) {
                cheapest = Some((slot, distance, enlargement));
            }
        }

        let (slot, distance) = match (covering, cheapest) {
            (Some((slot, distance)), _) => (slot, distance),
            (None, Some((slot, distance, enlargement))) => {
                if let EntryKind::Routing { cover_radius, .. } = &mut node.entries[slot].kind {
                    *cover_radius = distance;
                }
                trace!(node = node_id, slot, enlargement, "enlarged cover radius");
                (slot, distance)
            }
            (None, None) => {
                return Err(Error::InvariantViolation(format!(
                    "internal node {} has no entries",
                    node_id
                )))
            }
        };

        let child = node.entries[slot].subtree().ok_or_else(|| {
            Error::InvariantViolation(format!("routing entry {}:{} lost its subtree", node_id, slot))
        })?;
        Ok((child, distance))
    }

    /// Split `node_id`, which is full, after adding `overflow` to it.
    fn split(&mut self, node_id: NodeId, overflow: Entry) -> Result<()> {
        self.store(node_id, overflow);

        let partition = {
            let objects: Vec<&[f32]> = self.nodes[node_id]
                .entries
                .iter()
                .map(|e| e.object.as_slice())
                .collect();
            self.partitioner
                .partition(&objects, &self.metric, &mut self.rng)
        };
        let iterations = partition.iterations;
        let [left_len, right_len] = partition.cluster_sizes();
        let [left_object, right_object] = partition.centroids;

        // Re-home every entry under its cluster's routing object.
        let entries = std::mem::take(&mut self.nodes[node_id].entries);
        let mut left = Vec::with_capacity(entries.len());
        let mut right = Vec::with_capacity(entries.len());
        for (mut entry, &cluster) in entries.into_iter().zip(partition.assignment.iter()) {
            if cluster == 0 {
                entry.parent_distance = Some(self.metric.distance(&entry.object, &left_object));
                left.push(entry);
            } else {
                entry.parent_distance = Some(self.metric.distance(&entry.object, &right_object));
                right.push(entry);
            }
        }

        let level = self.nodes[node_id].level;
        self.nodes[node_id].entries = left;
        let sibling_id = self.alloc_node(Node::with_entries(level, right));
        self.relink_children(node_id);
        self.relink_children(sibling_id);

        let left_radius = self.nodes[node_id].covering_radius();
        let right_radius = self.nodes[sibling_id].covering_radius();

        debug!(
            node = node_id,
            sibling = sibling_id,
            level,
            left = left_len,
            right = right_len,
            iterations,
            "split node"
        );

        match self.nodes[node_id].owner {
            Some(owner) => {
                // Both routing objects now live in the owner's node; cache
                // their distances to that node's own routing object.
                let (left_pd, right_pd) = match self.nodes[owner.node].owner {
                    Some(grand) => {
                        let grand_object = &self.entry(grand)?.object;
                        (
                            Some(self.metric.distance(&left_object, grand_object)),
                            Some(self.metric.distance(&right_object, grand_object)),
                        )
                    }
                    None => (None, None),
                };

                let owner_entry = self.entry_mut(owner)?;
                owner_entry.object = left_object;
                owner_entry.parent_distance = left_pd;
                owner_entry.kind = EntryKind::Routing {
                    subtree: node_id,
                    cover_radius: left_radius,
                };

                let promoted = Entry::routing(right_object, sibling_id, right_radius, right_pd);
                if self.nodes[owner.node].len() >= self.config.max_entries {
                    self.split(owner.node, promoted)
                } else {
                    self.store(owner.node, promoted);
                    Ok(())
                }
            }
            None => {
                let new_root = self.alloc_node(Node::new_internal(level + 1));
                self.store(new_root, Entry::routing(left_object, node_id, left_radius, None));
                self.store(new_root, Entry::routing(right_object, sibling_id, right_radius, None));
                self.root = new_root;
                debug!(root = new_root, height = level + 2, "grew new root");
                Ok(())
            }
        }
    }
}

impl<M: Metric, R> MTree<M, R> {
    /// Walk the whole tree and verify every structural and distance-bound
    /// invariant:
    /// - node sizes within `max_entries`, no empty node below the root
    /// - leaves at level 0 holding data entries, internal nodes holding
    ///   routing entries whose subtrees sit one level down
    /// - owner back-references match the entries that own each node
    /// - cached parent distances equal the true distances
    /// - every object lies within the cover radius of each routing entry
    ///   above it
    pub fn check_invariants(&self) -> Result<()> {
        let root = self.node_ref(self.root)?;
        if root.owner.is_some() {
            return Err(Error::InvariantViolation("root has an owner".to_string()));
        }

        let mut reached = 0usize;
        let objects = self.check_node(self.root, None, &mut reached)?;

        if objects.len() != self.object_count {
            return Err(Error::InvariantViolation(format!(
                "tree holds {} objects but counts {}",
                objects.len(),
                self.object_count
            )));
        }
        if reached != self.nodes.len() {
            return Err(Error::InvariantViolation(format!(
                "{} of {} nodes reachable from the root",
                reached,
                self.nodes.len()
            )));
        }
        Ok(())
    }

    /// Returns every object stored below `node_id`.
    fn check_node(
        &self,
        node_id: NodeId,
        owner_object: Option<&[f32]>,
        reached: &mut usize,
    ) -> Result<Vec<&[f32]>> {
        let node = self.node_ref(node_id)?;
        *reached += 1;

        if node.len() > self.config.max_entries {
            return Err(Error::InvariantViolation(format!(
                "node {} holds {} entries, capacity is {}",
                node_id,
                node.len(),
                self.config.max_entries
            )));
        }
        if node.is_empty() && node_id != self.root {
            return Err(Error::InvariantViolation(format!("node {} is empty", node_id)));
        }

        let mut objects = Vec::new();
        for (slot, entry) in node.entries.iter().enumerate() {
            match (owner_object, entry.parent_distance) {
                (None, None) => {}
                (Some(owner), Some(cached)) => {
                    let actual = self.metric.distance(&entry.object, owner);
                    if (cached - actual).abs() > VERIFY_EPSILON * actual.max(1.0) {
                        return Err(Error::InvariantViolation(format!(
                            "entry {}:{} caches parent distance {} but is {} away",
                            node_id, slot, cached, actual
                        )));
                    }
                }
                (None, Some(_)) => {
                    return Err(Error::InvariantViolation(format!(
                        "root entry {} caches a parent distance",
                        slot
                    )))
                }
                (Some(_), None) => {
                    return Err(Error::InvariantViolation(format!(
                        "entry {}:{} has no parent distance",
                        node_id, slot
                    )))
                }
            }

            match (&entry.kind, node.is_leaf()) {
                (EntryKind::Data { .. }, true) => objects.push(entry.object.as_slice()),
                (EntryKind::Routing { subtree, cover_radius }, false) => {
                    let child = self.node_ref(*subtree)?;
                    let expected = EntryRef { node: node_id, slot };
                    if child.owner != Some(expected) {
                        return Err(Error::InvariantViolation(format!(
                            "node {} points at owner {:?}, expected {:?}",
                            subtree, child.owner, expected
                        )));
                    }
                    if child.level + 1 != node.level {
                        return Err(Error::InvariantViolation(format!(
                            "node {} at level {} under level {}",
                            subtree, child.level, node.level
                        )));
                    }

                    let below = self.check_node(*subtree, Some(entry.object.as_slice()), reached)?;
                    for object in &below {
                        let d = self.metric.distance(&entry.object, object);
                        if d > cover_radius + VERIFY_EPSILON * cover_radius.max(1.0) {
                            return Err(Error::InvariantViolation(format!(
                                "object at distance {} escapes cover radius {} of {}:{}",
                                d, cover_radius, node_id, slot
                            )));
                        }
                    }
                    objects.extend(below);
                }
                (EntryKind::Data { .. }, false) => {
                    return Err(Error::InvariantViolation(format!(
                        "data entry at internal node {} slot {}",
                        node_id, slot
                    )))
                }
                (EntryKind::Routing { .. }, true) => {
                    return Err(Error::InvariantViolation(format!(
                        "routing entry at leaf {} slot {}",
                        node_id, slot
                    )))
                }
            }
        }
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Manhattan;

    fn random_points(rng: &mut ChaCha8Rng, n: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|_| (0..dim).map(|_| rng.gen_range(0.0..100.0)).collect())
            .collect()
    }

    #[test]
    fn test_rejects_small_capacity() {
        assert!(matches!(MTree::new(1), Err(Error::InvalidParameter(_))));
        assert!(MTree::new(2).is_ok());
    }

    #[test]
    fn test_root_stays_leaf_until_full() {
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(4), 1).unwrap();
        for i in 0..4 {
            tree.insert(vec![i as f32, 0.0], i.to_string()).unwrap();
        }
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.len(), 4);
        let root = tree.node(tree.root_id()).unwrap();
        assert!(root.entries.iter().all(|e| e.parent_distance.is_none()));

        tree.insert(vec![50.0, 50.0], "overflow").unwrap();
        assert_eq!(tree.height(), 2);
        let root = tree.node(tree.root_id()).unwrap();
        assert_eq!(root.len(), 2);
        assert!(root.entries.iter().all(Entry::is_routing));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_root_split_keeps_both_halves_populated() {
        for seed in 0..25 {
            let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(2), seed).unwrap();
            for (i, p) in [[0.0f32, 0.0]; 3].iter().enumerate() {
                tree.insert(p.to_vec(), i.to_string()).unwrap();
            }
            let root = tree.node(tree.root_id()).unwrap();
            for entry in &root.entries {
                let child = tree.node(entry.subtree().unwrap()).unwrap();
                assert!(!child.is_empty(), "seed {}", seed);
            }
            tree.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_invariants_hold_through_cascading_splits() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for max_entries in [2, 3, 5, 10] {
            let config = MTreeConfig::with_max_entries(max_entries);
            let mut tree = MTree::with_seed(config, 5).unwrap();
            for (i, p) in random_points(&mut rng, 400, 3).into_iter().enumerate() {
                tree.insert(p, format!("p{}", i)).unwrap();
                if i % 50 == 0 {
                    tree.check_invariants().unwrap();
                }
            }
            tree.check_invariants().unwrap();
            assert_eq!(tree.len(), 400);
            assert!(tree.height() > 2, "max_entries {} never cascaded", max_entries);
        }
    }

    #[test]
    fn test_dimension_is_fixed_by_first_insert() {
        let mut tree = MTree::new(4).unwrap();
        assert_eq!(tree.dimension(), None);
        tree.insert(vec![1.0, 2.0, 3.0], "a").unwrap();
        assert_eq!(tree.dimension(), Some(3));

        let err = tree.insert(vec![1.0, 2.0], "b").unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_rejects_non_finite_objects() {
        let mut tree = MTree::new(4).unwrap();
        assert!(matches!(
            tree.insert(vec![f32::NAN], "nan"),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            tree.insert(Vec::new(), "empty"),
            Err(Error::InvalidParameter(_))
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_rejects_components_that_overflow_distances() {
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(4), 1).unwrap();
        for i in 0..6 {
            let x = if i % 2 == 0 { 2.0e19 } else { -2.0e19 };
            assert!(matches!(
                tree.insert(vec![x, 0.0], i.to_string()),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert!(tree.is_empty());

        // The largest accepted magnitude still splits cleanly.
        let limit = crate::vector::component_limit(2);
        for i in 0..6 {
            let x = if i % 2 == 0 { limit } else { -limit };
            tree.insert(vec![x, i as f32], i.to_string()).unwrap();
        }
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.height(), 2);
        tree.check_invariants().unwrap();
        let hits = tree.knn_search(&[limit, 0.0], 3).unwrap();
        assert!(hits.iter().all(|h| h.distance.is_finite()));
    }

    #[test]
    fn test_custom_metric() {
        let mut tree = MTree::with_metric(MTreeConfig::with_max_entries(3), Manhattan, 9).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for (i, p) in random_points(&mut rng, 100, 2).into_iter().enumerate() {
            tree.insert(p, i.to_string()).unwrap();
        }
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_stats() {
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(4), 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for (i, p) in random_points(&mut rng, 64, 2).into_iter().enumerate() {
            tree.insert(p, i.to_string()).unwrap();
        }
        let stats = tree.stats();
        assert_eq!(stats.object_count, 64);
        assert_eq!(stats.dimension, Some(2));
        assert_eq!(stats.height, tree.height());
        assert!(stats.leaf_count >= 16);
        assert!(stats.node_count > stats.leaf_count);
        assert!(stats.fill_factor <= 4.0);
        assert!(stats.memory_bytes > 0);
    }

    #[test]
    fn test_detects_corrupted_cover_radius() {
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(3), 4).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for (i, p) in random_points(&mut rng, 30, 2).into_iter().enumerate() {
            tree.insert(p, i.to_string()).unwrap();
        }
        let root = tree.root;
        if let EntryKind::Routing { cover_radius, .. } = &mut tree.nodes[root].entries[0].kind {
            *cover_radius = 0.0;
        }
        assert!(matches!(
            tree.check_invariants(),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_detects_stale_parent_distance() {
        let mut tree = MTree::with_seed(MTreeConfig::with_max_entries(3), 4).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for (i, p) in random_points(&mut rng, 30, 2).into_iter().enumerate() {
            tree.insert(p, i.to_string()).unwrap();
        }
        let leaf = tree.nodes.iter().position(|n| n.is_leaf()).unwrap();
        tree.nodes[leaf].entries[0].parent_distance = Some(1.0e6);
        assert!(tree.check_invariants().is_err());
    }
}
