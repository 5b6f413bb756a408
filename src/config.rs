//! Configuration for node fan-out and the split partitioner.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of clusters a node split produces. Splits are always binary.
pub const CLUSTER_COUNT: usize = 2;

/// Convergence tolerance on per-cluster assignment counts.
pub const CONVERGENCE_TOLERANCE: usize = 1;

/// Upper bound on partitioner iterations per split.
pub const MAX_ITERATIONS: usize = 5;

/// Default node capacity.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Configuration for the M-tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MTreeConfig {
    /// Maximum entries per node before it splits
    pub max_entries: usize,

    /// Partitioner stops once every cluster's size changed by less than this
    pub tolerance: usize,

    /// Hard cap on partitioner iterations
    pub max_iterations: usize,
}

impl Default for MTreeConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            tolerance: CONVERGENCE_TOLERANCE,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl MTreeConfig {
    /// Default policy with a custom node capacity.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    /// Wide nodes: shallower tree, more distance computations per node.
    pub fn wide() -> Self {
        Self::with_max_entries(32)
    }

    /// Narrow nodes: deeper tree, tighter cover radii.
    pub fn narrow() -> Self {
        Self::with_max_entries(4)
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries < 2 {
            return Err(Error::InvalidParameter(format!(
                "max_entries must be at least 2, got {}",
                self.max_entries
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = MTreeConfig::default();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.tolerance, 1);
        assert_eq!(config.max_iterations, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_tiny_nodes() {
        assert!(matches!(
            MTreeConfig::with_max_entries(1).validate(),
            Err(Error::InvalidParameter(_))
        ));
        assert!(MTreeConfig::with_max_entries(2).validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = MTreeConfig::from_json(r#"{"max_entries": 16}"#).unwrap();
        assert_eq!(config.max_entries, 16);
        assert_eq!(config.max_iterations, MAX_ITERATIONS);

        assert!(MTreeConfig::from_json(r#"{"max_entries": 0}"#).is_err());
        assert!(matches!(
            MTreeConfig::from_json("not json"),
            Err(Error::Serde(_))
        ));
    }
}
