//! Exact k-nearest-neighbor ground truth.
//!
//! [`compute_true_knn`] finds, for every query, the `k` reference rows with
//! the smallest squared Euclidean distance, nearest first. These lists are the
//! baseline approximate indexes are scored against (see
//! [`crate::benchmark::metrics`]).
//!
//! # Blocking
//!
//! The full `M x N` distance grid can be far larger than memory, so queries
//! are processed in consecutive blocks of `block_size`; each block only needs
//! a `block_size x N` grid. Reference norms are computed once and shared by
//! every block, and each distance depends only on its own query row, so the
//! result is identical for every block size.
//!
//! # Sentinel check
//!
//! The output starts filled with [`SENTINEL`]. After the last block every
//! slot must hold a real reference index; a surviving sentinel means a block
//! was skipped and is reported as [`VerityError::IncompleteComputation`]
//! rather than returned.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, Memo};
use crate::distance::{pairwise_squared, row_norms, MemoryLimit};
use crate::error::{Result, VerityError};
use crate::matrix::{Matrix, MatrixView};
use crate::select::{top_k, Order};

/// Placeholder for a neighbor slot that has not been computed yet.
pub const SENTINEL: u32 = u32::MAX;

/// Ground-truth computation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundTruthConfig {
    /// Neighbors per query (default: 1000).
    pub k: usize,
    /// Queries per distance block; bounds peak memory (default: 128).
    pub block_size: usize,
    /// Log progress every this many blocks; 0 disables it (default: 5).
    pub progress_every: usize,
    /// Size policy for each block's distance grid.
    pub memory_limit: MemoryLimit,
}

impl Default for GroundTruthConfig {
    fn default() -> Self {
        Self {
            k: 1000,
            block_size: 128,
            progress_every: 5,
            memory_limit: MemoryLimit::default(),
        }
    }
}

impl GroundTruthConfig {
    /// Default configuration with the given `k`.
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}

/// Exact neighbors for a query batch, one row per query, nearest first.
///
/// Row layout is checked on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGroundTruth")]
pub struct GroundTruth {
    k: usize,
    indices: Vec<u32>,
    distances: Vec<f32>,
}

#[derive(Deserialize)]
struct RawGroundTruth {
    k: usize,
    indices: Vec<u32>,
    distances: Vec<f32>,
}

impl TryFrom<RawGroundTruth> for GroundTruth {
    type Error = VerityError;

    fn try_from(raw: RawGroundTruth) -> Result<Self> {
        let whole_rows = if raw.k == 0 {
            raw.indices.is_empty()
        } else {
            raw.indices.len() % raw.k == 0
        };
        if !whole_rows || raw.distances.len() != raw.indices.len() {
            return Err(VerityError::shape(
                format!("whole rows of {} neighbors and distances", raw.k),
                format!("{} indices and {} distances", raw.indices.len(), raw.distances.len()),
            ));
        }
        Ok(Self {
            k: raw.k,
            indices: raw.indices,
            distances: raw.distances,
        })
    }
}

impl GroundTruth {
    fn filled(nqueries: usize, k: usize) -> Self {
        Self {
            k,
            indices: vec![SENTINEL; nqueries * k],
            distances: vec![f32::INFINITY; nqueries * k],
        }
    }

    pub fn nqueries(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.indices.len() / self.k
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Neighbor indices of query `i`.
    pub fn neighbors(&self, i: usize) -> &[u32] {
        &self.indices[i * self.k..(i + 1) * self.k]
    }

    /// Squared distances aligned with [`neighbors`](Self::neighbors).
    pub fn distances(&self, i: usize) -> &[f32] {
        &self.distances[i * self.k..(i + 1) * self.k]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.nqueries()).map(move |i| self.neighbors(i))
    }

    /// Copy out as one `Vec` per query.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.rows().map(<[u32]>::to_vec).collect()
    }

    /// Fail if any slot still holds the sentinel.
    pub(crate) fn verify_complete(&self) -> Result<()> {
        match self.indices.iter().position(|&idx| idx == SENTINEL) {
            Some(pos) => Err(VerityError::IncompleteComputation {
                query: pos / self.k,
                slot: pos % self.k,
            }),
            None => Ok(()),
        }
    }
}

struct BlockSearch<'a> {
    base: MatrixView<'a>,
    base_norms: &'a [f32],
    k: usize,
    block_size: usize,
    progress_every: usize,
    memory_limit: MemoryLimit,
}

impl BlockSearch<'_> {
    /// Fill `indices`/`distances` (`queries.nrows() * k` slots each).
    fn fill(&self, queries: MatrixView<'_>, indices: &mut [u32], distances: &mut [f32]) -> Result<()> {
        let nqueries = queries.nrows();
        if nqueries <= self.block_size {
            return self.fill_block(queries, indices, distances);
        }

        let nblocks = nqueries.div_ceil(self.block_size);
        let slots = self.block_size * self.k;
        let chunks = indices.chunks_mut(slots).zip(distances.chunks_mut(slots));
        for (b, (idx_chunk, dist_chunk)) in chunks.enumerate() {
            let start = b * self.block_size;
            let end = (start + self.block_size).min(nqueries);
            self.fill(queries.slice_rows(start, end), idx_chunk, dist_chunk)?;

            if self.progress_every > 0 && b % self.progress_every == 0 {
                tracing::info!(
                    block = b,
                    nblocks,
                    start,
                    end,
                    "computed top k for query block"
                );
            }
        }
        Ok(())
    }

    fn fill_block(&self, queries: MatrixView<'_>, indices: &mut [u32], distances: &mut [f32]) -> Result<()> {
        // Rows are queries, columns are reference items.
        let dists = pairwise_squared(
            queries,
            self.base,
            None,
            Some(self.base_norms),
            self.memory_limit,
        )?;

        let rows = indices.chunks_mut(self.k).zip(distances.chunks_mut(self.k));
        for (i, (idx_row, dist_row)) in rows.enumerate() {
            let nearest = top_k(dists.row(i), self.k, Order::SmallerBetter)?;
            for (slot, (&idx, &d)) in nearest.indices.iter().zip(&nearest.values).enumerate() {
                idx_row[slot] = idx as u32;
                dist_row[slot] = d;
            }
        }
        Ok(())
    }
}

/// Exact k nearest rows of `base` for every row of `queries`.
///
/// Row `i` of the result belongs to query `i`, sorted nearest first; ties
/// resolve to the lower reference index.
///
/// # Errors
///
/// - [`VerityError::InvalidK`] if `k == 0` or `k > base.nrows()`.
/// - [`VerityError::InvalidParameter`] if `block_size == 0` or the reference
///   set has more rows than fit in a `u32` index.
/// - [`VerityError::InputShape`] if the dimensions differ.
/// - [`VerityError::MatrixTooLarge`] if a block's grid exceeds a hard limit.
/// - [`VerityError::IncompleteComputation`] if a slot was never filled.
pub fn compute_true_knn(base: &Matrix, queries: &Matrix, config: &GroundTruthConfig) -> Result<GroundTruth> {
    let n = base.nrows();
    let k = config.k;
    if k == 0 || k > n {
        return Err(VerityError::InvalidK { k, available: n });
    }
    if config.block_size == 0 {
        return Err(VerityError::InvalidParameter("block_size must be positive".into()));
    }
    if n > u32::MAX as usize {
        return Err(VerityError::InvalidParameter(format!(
            "reference set of {n} rows does not fit u32 indices"
        )));
    }

    let m = queries.nrows();
    if m == 0 {
        return Ok(GroundTruth::filled(0, k));
    }
    if base.ncols() != queries.ncols() {
        return Err(VerityError::shape(
            format!("query dimension {}", base.ncols()),
            format!("query dimension {}", queries.ncols()),
        ));
    }

    let base_norms = row_norms(base);
    let search = BlockSearch {
        base: base.view(),
        base_norms: &base_norms,
        k,
        block_size: config.block_size,
        progress_every: config.progress_every,
        memory_limit: config.memory_limit,
    };

    let mut truth = GroundTruth::filled(m, k);
    search.fill(queries.view(), &mut truth.indices, &mut truth.distances)?;
    truth.verify_complete()?;

    tracing::debug!(nqueries = m, nbase = n, k, "ground truth complete");
    Ok(truth)
}

/// [`compute_true_knn`] memoized in `memo`.
///
/// The key covers the contents of `base` and `queries` and the neighbor
/// count; `block_size` and the progress settings do not change the result
/// and are left out.
pub fn compute_true_knn_cached<S: CacheStore>(
    memo: &mut Memo<S>,
    base: &Matrix,
    queries: &Matrix,
    config: &GroundTruthConfig,
) -> Result<GroundTruth> {
    memo.get_or_compute("compute_true_knn", &(config.k, base, queries), || {
        compute_true_knn(base, queries, config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(values: &[f32]) -> Matrix {
        Matrix::column(values)
    }

    #[test]
    fn nearest_points_on_a_line() {
        let base = line(&[0.0, 1.0, 2.0, 3.0, 10.0]);
        let queries = line(&[0.0]);
        let gt = compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(2)).unwrap();
        assert_eq!(gt.neighbors(0), &[0, 1]);
        assert_eq!(gt.distances(0), &[0.0, 1.0]);
    }

    #[test]
    fn rows_follow_query_order_across_blocks() {
        let base = line(&[0.0, 10.0, 20.0, 30.0]);
        let queries = line(&[29.0, 1.0, 21.0, 9.0, 11.0]);
        let config = GroundTruthConfig::with_k(1).block_size(2);
        let gt = compute_true_knn(&base, &queries, &config).unwrap();
        assert_eq!(gt.to_rows(), vec![vec![3], vec![0], vec![2], vec![1], vec![1]]);
    }

    #[test]
    fn block_size_does_not_change_results() {
        let base = Matrix::from_rows(&[
            [0.0_f32, 0.0],
            [1.0, 0.5],
            [-2.0, 1.0],
            [3.0, -1.0],
            [0.5, 0.5],
            [1.0, 1.0],
        ])
        .unwrap();
        let queries = Matrix::from_rows(&[
            [0.1_f32, 0.2],
            [2.0, 2.0],
            [-1.0, 0.0],
            [0.9, 0.9],
            [3.0, 0.0],
            [0.0, -3.0],
            [0.4, 0.6],
        ])
        .unwrap();

        let unblocked = compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(3).block_size(64)).unwrap();
        for bs in 1..=7 {
            let blocked = compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(3).block_size(bs)).unwrap();
            assert_eq!(blocked, unblocked, "block_size = {bs}");
        }
    }

    #[test]
    fn invalid_k() {
        let base = line(&[0.0, 1.0]);
        let queries = line(&[0.5]);
        assert_eq!(
            compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(3)),
            Err(VerityError::InvalidK { k: 3, available: 2 })
        );
        assert!(compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(0)).is_err());

        let empty = Matrix::zeros(0, 1);
        assert_eq!(
            compute_true_knn(&empty, &queries, &GroundTruthConfig::with_k(1)),
            Err(VerityError::InvalidK { k: 1, available: 0 })
        );
    }

    #[test]
    fn empty_query_batch_is_not_an_error() {
        let base = line(&[0.0, 1.0]);
        let gt = compute_true_knn(&base, &Matrix::zeros(0, 1), &GroundTruthConfig::with_k(1)).unwrap();
        assert!(gt.is_empty());
        assert_eq!(gt.nqueries(), 0);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let base = line(&[0.0]);
        let config = GroundTruthConfig::with_k(1).block_size(0);
        assert!(matches!(
            compute_true_knn(&base, &base, &config),
            Err(VerityError::InvalidParameter(_))
        ));
    }

    #[test]
    fn dimension_mismatch() {
        let base = Matrix::from_rows(&[[0.0_f32, 0.0]]).unwrap();
        let queries = line(&[0.0]);
        assert!(matches!(
            compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(1)),
            Err(VerityError::InputShape { .. })
        ));
    }

    #[test]
    fn surviving_sentinel_is_reported() {
        let mut gt = GroundTruth::filled(2, 2);
        gt.indices[..3].copy_from_slice(&[0, 1, 1]);
        assert_eq!(
            gt.verify_complete(),
            Err(VerityError::IncompleteComputation { query: 1, slot: 1 })
        );
    }

    #[test]
    fn cached_result_matches_and_is_reused() {
        let base = line(&[0.0, 1.0, 2.0]);
        let queries = line(&[1.9, 0.2]);
        let config = GroundTruthConfig::with_k(2);
        let mut memo = Memo::in_memory();

        let first = compute_true_knn_cached(&mut memo, &base, &queries, &config).unwrap();
        let second = compute_true_knn_cached(&mut memo, &base, &queries, &config.clone().block_size(1)).unwrap();
        assert_eq!(first, compute_true_knn(&base, &queries, &config).unwrap());
        assert_eq!(first, second);
        assert_eq!(memo.stats().hits, 1);
    }

    #[test]
    fn nan_reference_rows_rank_last() {
        let base = line(&[f32::NAN, 1.0, 5.0]);
        let queries = line(&[1.0]);
        let nearest = compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(1)).unwrap();
        assert_eq!(nearest.neighbors(0), &[1]);
        assert_eq!(nearest.distances(0), &[0.0]);

        let all = compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(3)).unwrap();
        assert_eq!(all.neighbors(0), &[1, 2, 0]);
        assert!(all.distances(0)[2].is_nan());
    }

    #[test]
    fn ragged_payload_is_rejected() {
        let ragged = r#"{"k":2,"indices":[0,1,2],"distances":[0.0,1.0,2.0]}"#;
        assert!(serde_json::from_str::<GroundTruth>(ragged).is_err());
        let misaligned = r#"{"k":2,"indices":[0,1],"distances":[0.0]}"#;
        assert!(serde_json::from_str::<GroundTruth>(misaligned).is_err());

        let gt = compute_true_knn(&line(&[0.0, 1.0]), &line(&[0.2, 0.9]), &GroundTruthConfig::with_k(2)).unwrap();
        let json = serde_json::to_string(&gt).unwrap();
        assert_eq!(serde_json::from_str::<GroundTruth>(&json).unwrap(), gt);
    }

    #[test]
    fn config_loads_from_json_with_defaults() {
        let config: GroundTruthConfig = serde_json::from_str(r#"{"k": 10}"#).unwrap();
        assert_eq!(config.k, 10);
        assert_eq!(config.block_size, 128);
    }
}
