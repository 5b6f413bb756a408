//! Distance functions over feature vectors.

use crate::vector::{manhattan_distance, squared_distance};

/// A distance function the tree can index with.
///
/// Implementations must be a true metric over equal-length vectors:
/// - Non-negative: d(x, y) >= 0
/// - Symmetric:    d(x, y) = d(y, x)
/// - Identity:     d(x, y) = 0 iff x = y
/// - Triangle:     d(x, z) <= d(x, y) + d(y, z)
///
/// Range and kNN pruning rely on the triangle inequality. A non-metric
/// "distance" silently drops results.
pub trait Metric {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

/// Euclidean (L2) distance. The default metric.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        squared_distance(a, b).sqrt()
    }
}

/// Manhattan (L1) distance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Manhattan;

impl Metric for Manhattan {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        manhattan_distance(a, b)
    }
}

impl<F> Metric for F
where
    F: Fn(&[f32], &[f32]) -> f32,
{
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self(a, b)
    }
}
