//! # M-tree
//!
//! A balanced index over a metric space for similarity search over feature
//! vectors, using nothing but a distance function that satisfies the metric
//! axioms.
//!
//! ## Key Properties
//! - Binary node splits driven by a constrained 2-means partitioner
//! - Cached parent distances and cover radii prune subtrees through the
//!   triangle inequality
//! - Range search and best-first branch-and-bound kNN search
//! - Searches borrow the tree immutably and can run in parallel
//!
//! ## Example
//! ```
//! use mtree::MTree;
//!
//! let mut tree = MTree::new(10).unwrap();
//! tree.insert(vec![0.0, 0.0], "origin").unwrap();
//! tree.insert(vec![3.0, 4.0], "far").unwrap();
//!
//! let hits = tree.knn_search(&[1.0, 1.0], 1).unwrap();
//! assert_eq!(hits[0].id, "origin");
//! ```
//!
//! Based on Ciaccia, Patella, Rabitti, Zezula: "Indexing Metric Spaces with
//! M-tree" (SEBD 1997).

pub mod config;
pub mod error;
pub mod export;
pub mod metric;
pub mod node;
pub mod partition;
pub mod search;
pub mod stats;
pub mod tree;
pub mod vector;

pub use config::MTreeConfig;
pub use error::{Error, Result};
pub use export::{EntrySnapshot, NodeSnapshot, TreeSnapshot};
pub use metric::{Euclidean, Manhattan, Metric};
pub use node::{Entry, EntryKind, EntryRef, Node, NodeId};
pub use partition::{Partition, Partitioner};
pub use search::SearchHit;
pub use stats::{SearchStats, TreeStats};
pub use tree::MTree;
pub use vector::FeatureVector;
