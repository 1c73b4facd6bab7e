//! Distance metrics for dense vectors.
//!
//! Two shapes of API live here:
//!
//! - one-to-many: [`squared_euclidean`], [`l1`], [`hamming_dists`] measure one
//!   query against every row of a matrix;
//! - many-to-many: [`pairwise_squared`] builds the full distance grid with the
//!   `‖x‖² + ‖q‖² − 2·x·q` expansion, optionally reusing precomputed norms.
//!
//! ## Important nuance
//!
//! The expansion used by [`pairwise_squared`] is not bit-identical to the
//! direct sum of squared differences in [`squared_euclidean`]; cancellation
//! can even produce tiny negative values, which are clamped to zero. Compare
//! results from the two paths with a tolerance, never with `==`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::matrix::{Matrix, MatrixView};
use crate::select::{top_k, Order, TopK};
use crate::simd;

/// Default size above which a pairwise matrix triggers a warning (1 GB).
pub const DEFAULT_MATRIX_BYTES_LIMIT: usize = 1_000_000_000;

/// What to do when a pairwise distance matrix would be too large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryLimit {
    /// Log a warning above `bytes`, then allocate anyway.
    Advisory { bytes: usize },
    /// Refuse to allocate above `bytes`.
    Hard { bytes: usize },
}

impl Default for MemoryLimit {
    fn default() -> Self {
        MemoryLimit::Advisory {
            bytes: DEFAULT_MATRIX_BYTES_LIMIT,
        }
    }
}

impl MemoryLimit {
    fn check(self, rows: usize, cols: usize) -> Result<()> {
        let bytes = rows
            .saturating_mul(cols)
            .saturating_mul(std::mem::size_of::<f32>());
        match self {
            MemoryLimit::Advisory { bytes: limit } if bytes > limit => {
                tracing::warn!(
                    rows,
                    cols,
                    bytes,
                    limit,
                    "pairwise_squared: allocating an oversized distance matrix"
                );
                Ok(())
            }
            MemoryLimit::Hard { bytes: limit } if bytes > limit => {
                Err(VerityError::MatrixTooLarge { bytes, limit })
            }
            _ => Ok(()),
        }
    }
}

/// Distance metric for one-to-many exact search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    /// Squared Euclidean distance.
    #[default]
    SquaredL2,
    /// Manhattan distance.
    L1,
}

impl Metric {
    /// Distance between two vectors of equal length.
    #[inline]
    #[must_use]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::SquaredL2 => simd::l2_distance_squared(a, b),
            Metric::L1 => simd::l1_distance(a, b),
        }
    }

    /// Distance from `q` to every row of `x`.
    pub fn distances<'a>(self, x: impl Into<MatrixView<'a>>, q: &[f32]) -> Result<Vec<f32>> {
        let x = x.into();
        check_dim(x.ncols(), q.len())?;
        Ok(x.rows_iter().map(|row| self.distance(row, q)).collect())
    }
}

fn check_dim(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(VerityError::shape(
            format!("dimension {expected}"),
            format!("dimension {actual}"),
        ));
    }
    Ok(())
}

/// Squared Euclidean distance from `q` to each row of `x`.
pub fn squared_euclidean<'a>(x: impl Into<MatrixView<'a>>, q: &[f32]) -> Result<Vec<f32>> {
    Metric::SquaredL2.distances(x, q)
}

/// L1 distance from `q` to each row of `x`.
pub fn l1<'a>(x: impl Into<MatrixView<'a>>, q: &[f32]) -> Result<Vec<f32>> {
    Metric::L1.distances(x, q)
}

/// Squared norm of every row.
pub fn row_norms<'a>(x: impl Into<MatrixView<'a>>) -> Vec<f32> {
    x.into().rows_iter().map(simd::norm_squared).collect()
}

/// All squared distances between the rows of `x` and the rows of `queries`.
///
/// Returns an `x.nrows() x queries.nrows()` matrix. `row_norms` and
/// `query_norms`, when given, must hold the squared norms of the rows of `x`
/// and `queries` respectively (see [`row_norms`]); passing them avoids
/// recomputing norms when the same set is reused across calls.
///
/// # Errors
///
/// - [`VerityError::InputShape`] if the dimensions or norm lengths disagree.
/// - [`VerityError::MatrixTooLarge`] if `limit` is [`MemoryLimit::Hard`] and
///   the result would exceed it.
pub fn pairwise_squared<'a, 'b>(
    x: impl Into<MatrixView<'a>>,
    queries: impl Into<MatrixView<'b>>,
    row_norms: Option<&[f32]>,
    query_norms: Option<&[f32]>,
    limit: MemoryLimit,
) -> Result<Matrix> {
    let x = x.into();
    let queries = queries.into();
    if x.nrows() > 0 && queries.nrows() > 0 {
        check_dim(x.ncols(), queries.ncols())?;
    }
    limit.check(x.nrows(), queries.nrows())?;

    let computed_rows;
    let rn = match row_norms {
        Some(n) => {
            check_dim(x.nrows(), n.len())?;
            n
        }
        None => {
            computed_rows = self::row_norms(x);
            &computed_rows
        }
    };
    let computed_queries;
    let qn = match query_norms {
        Some(n) => {
            check_dim(queries.nrows(), n.len())?;
            n
        }
        None => {
            computed_queries = self::row_norms(queries);
            &computed_queries
        }
    };

    let mut out = Matrix::zeros(x.nrows(), queries.nrows());
    for (i, xi) in x.rows_iter().enumerate() {
        let out_row = out.row_mut(i);
        for (j, qj) in queries.rows_iter().enumerate() {
            let mut d = rn[i] + qn[j] - 2.0 * simd::dot(xi, qj);
            if !d.is_finite() {
                // Overflowed norms give inf - inf; NaN inputs stay NaN.
                d = simd::l2_distance_squared(xi, qj);
            }
            // NaN must survive to rank worst in selection.
            out_row[j] = if d < 0.0 { 0.0 } else { d };
        }
    }
    Ok(out)
}

/// Number of positions at which two sequences differ.
pub fn hamming<T: PartialEq>(v1: &[T], v2: &[T]) -> Result<usize> {
    check_dim(v1.len(), v2.len())?;
    Ok(v1.iter().zip(v2.iter()).filter(|(a, b)| a != b).count())
}

/// Hamming distance from `q` to each row of `x`.
pub fn hamming_dists<T: PartialEq, R: AsRef<[T]>>(x: &[R], q: &[T]) -> Result<Vec<usize>> {
    x.iter().map(|row| hamming(row.as_ref(), q)).collect()
}

/// Exact k nearest rows of `x` to a single query, nearest first.
pub fn knn<'a>(x: impl Into<MatrixView<'a>>, q: &[f32], k: usize, metric: Metric) -> Result<TopK> {
    let dists = metric.distances(x, q)?;
    top_k(&dists, k, Order::SmallerBetter)
}
