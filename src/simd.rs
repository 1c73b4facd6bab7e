//! Portable vector kernels.
//!
//! Written as simple iterator folds so that LLVM auto-vectorizes them. Every
//! distance in the crate funnels through these, which keeps results
//! bit-identical no matter which higher-level path computed them.
//!
//! ```rust
//! use verity::simd::{dot, l2_distance_squared, norm_squared};
//!
//! let a = [1.0_f32, 2.0];
//! let b = [4.0_f32, 6.0];
//! assert_eq!(dot(&a, &b), 16.0);
//! assert_eq!(norm_squared(&a), 5.0);
//! assert_eq!(l2_distance_squared(&a, &b), 25.0);
//! ```

/// Dot product of two vectors.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Squared L2 norm.
#[inline]
#[must_use]
pub fn norm_squared(v: &[f32]) -> f32 {
    dot(v, v)
}

/// L2 distance squared (faster when only comparing distances).
#[inline]
#[must_use]
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// L1 (Manhattan) distance.
#[inline]
#[must_use]
pub fn l1_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_basic() {
        let a = [1.0_f32, 2.0, 3.0];
        let b = [4.0_f32, 5.0, 6.0];
        assert!((dot(&a, &b) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_norm_squared() {
        assert!((norm_squared(&[3.0_f32, 4.0]) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_distance_squared() {
        let a = [0.0_f32, 0.0];
        let b = [3.0_f32, 4.0];
        assert!((l2_distance_squared(&a, &b) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_l1_distance() {
        let a = [1.0_f32, -1.0];
        let b = [-2.0_f32, 3.0];
        assert!((l1_distance(&a, &b) - 7.0).abs() < 1e-6);
    }
}
