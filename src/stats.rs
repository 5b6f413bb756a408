//! Tree and query statistics

use serde::{Deserialize, Serialize};

/// Shape of the tree at a point in time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStats {
    pub object_count: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    pub height: u32,
    pub dimension: Option<usize>,
    /// Mean entries per node
    pub fill_factor: f64,
    pub memory_bytes: usize,
}

/// Work done by one search
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes whose entry lists were scanned
    pub nodes_visited: usize,

    /// Calls into the metric
    pub distance_computations: usize,

    /// Entries skipped by the cached parent distance bound alone
    pub parent_distance_pruned: usize,
}
