//! Error types for the M-tree.

use thiserror::Error;

/// Top-level error type for M-tree operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A vector's length disagrees with the dimension fixed by the first insert.
    #[error("dimension mismatch: tree holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A search was issued against a tree with no indexed objects.
    #[error("search on an empty tree")]
    EmptyTree,

    /// kNN search asked for more neighbors than the tree holds.
    #[error("requested {requested} neighbors but only {available} objects are indexed")]
    InsufficientObjects { requested: usize, available: usize },

    /// Cover radius, cached parent distance or tree shape found inconsistent.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Argument or configuration value outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// JSON export or config (de)serialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for M-tree operations.
pub type Result<T> = std::result::Result<T, Error>;
