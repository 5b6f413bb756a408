//! Feature vector representation and the arithmetic the partitioner needs

use crate::error::{Error, Result};

/// A feature vector. Every vector in one tree shares the same dimension.
pub type FeatureVector = Vec<f32>;

/// Largest component magnitude for which a squared distance between two
/// `dim`-dimensional vectors stays finite in f32.
pub fn component_limit(dim: usize) -> f32 {
    (f32::MAX / dim.max(1) as f32).sqrt() / 4.0
}

/// Reject empty vectors, non-finite components, and components large
/// enough to overflow a distance.
pub fn check_components(v: &[f32]) -> Result<()> {
    if v.is_empty() {
        return Err(Error::InvalidParameter(
            "feature vector must have at least one component".to_string(),
        ));
    }
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "component {} is not finite ({})",
            pos, v[pos]
        )));
    }
    let limit = component_limit(v.len());
    if let Some(pos) = v.iter().position(|x| x.abs() > limit) {
        return Err(Error::InvalidParameter(format!(
            "component {} ({}) exceeds magnitude {}",
            pos, v[pos], limit
        )));
    }
    Ok(())
}

/// Component-wise `acc += v`.
pub fn add_assign(acc: &mut [f32], v: &[f32]) {
    for (a, b) in acc.iter_mut().zip(v) {
        *a += b;
    }
}

/// Component-wise mean of `vectors`, or `None` for an empty set.
pub fn mean<'a, I>(vectors: I, dim: usize) -> Option<FeatureVector>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut gather = vec![0.0f32; dim];
    let mut count = 0usize;
    for v in vectors {
        add_assign(&mut gather, v);
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = count as f32;
    for val in &mut gather {
        *val /= n;
    }
    Some(gather)
}

/// Squared Euclidean distance (no sqrt)
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

/// Sum of absolute component differences
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        let a = vec![1.0, 2.0];
        let b = vec![3.0, 6.0];
        let m = mean([a.as_slice(), b.as_slice()], 2).unwrap();
        assert_eq!(m, vec![2.0, 4.0]);
        assert!(mean(std::iter::empty(), 2).is_none());
    }

    #[test]
    fn test_squared_distance() {
        assert_eq!(squared_distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(manhattan_distance(&[0.0, 0.0], &[3.0, -4.0]), 7.0);
    }

    #[test]
    fn test_check_components() {
        assert!(check_components(&[1.0, 2.0]).is_ok());
        assert!(check_components(&[]).is_err());
        assert!(check_components(&[1.0, f32::NAN]).is_err());
        assert!(check_components(&[f32::INFINITY]).is_err());
        assert!(check_components(&[2.0e19, 0.0]).is_err());
        assert!(check_components(&[-2.0e19]).is_err());
    }

    #[test]
    fn test_component_limit_keeps_distances_finite() {
        for dim in [1, 2, 3, 128, 4096] {
            let limit = component_limit(dim);
            let a = vec![limit; dim];
            let b = vec![-limit; dim];
            assert!(check_components(&a).is_ok());
            assert!(squared_distance(&a, &b).is_finite(), "dim {}", dim);
        }
    }
}
