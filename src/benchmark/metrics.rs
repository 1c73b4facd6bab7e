//! Retrieval quality against exact ground truth.
//!
//! - Recall@k: fraction of true neighbors retrieved
//! - Precision@k: fraction of retrieved items that are true neighbors
//! - MRR: reciprocal rank of the first true neighbor

use std::collections::HashSet;

use crate::error::{Result, VerityError};
use crate::ground_truth::GroundTruth;

/// Compute recall@k: fraction of true k-nearest neighbors that were retrieved.
///
/// recall@k = |retrieved ∩ ground_truth| / k
///
/// # Arguments
///
/// * `ground_truth` - True k-nearest neighbor IDs, nearest first
/// * `retrieved` - Retrieved neighbor IDs (may be more or fewer than k)
/// * `k` - Number of neighbors we're evaluating
///
/// # Returns
///
/// Recall value in [0.0, 1.0]
pub fn recall_at_k(ground_truth: &[u32], retrieved: &[u32], k: usize) -> f32 {
    if k == 0 || ground_truth.is_empty() {
        return 0.0;
    }

    let gt_set: HashSet<u32> = ground_truth.iter().take(k).copied().collect();
    let retrieved_set: HashSet<u32> = retrieved.iter().take(k).copied().collect();

    let intersection = gt_set.intersection(&retrieved_set).count();
    intersection as f32 / k as f32
}

/// Compute precision@k: fraction of retrieved items that are true neighbors.
///
/// precision@k = |retrieved ∩ ground_truth| / |retrieved|
pub fn precision_at_k(ground_truth: &[u32], retrieved: &[u32], k: usize) -> f32 {
    if k == 0 || retrieved.is_empty() {
        return 0.0;
    }

    let gt_set: HashSet<u32> = ground_truth.iter().take(k).copied().collect();
    let retrieved_k: Vec<u32> = retrieved.iter().take(k).copied().collect();

    let hits = retrieved_k.iter().filter(|id| gt_set.contains(id)).count();
    hits as f32 / retrieved_k.len() as f32
}

/// Mean reciprocal rank for a single query.
///
/// MRR = 1 / (rank of first relevant result)
pub fn mrr(ground_truth: &[u32], retrieved: &[u32]) -> f32 {
    let true_set: HashSet<u32> = ground_truth.iter().copied().collect();
    retrieved
        .iter()
        .position(|id| true_set.contains(id))
        .map_or(0.0, |rank| 1.0 / (rank + 1) as f32)
}

/// Compute recall at multiple k values.
pub fn recall_curve(ground_truth: &[u32], retrieved: &[u32], k_values: &[usize]) -> Vec<(usize, f32)> {
    k_values
        .iter()
        .map(|&k| (k, recall_at_k(ground_truth, retrieved, k)))
        .collect()
}

/// Recall statistics over a query batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallSummary {
    pub n_queries: usize,
    pub k: usize,
    pub mean: f32,
    pub min: f32,
    pub max: f32,
    pub std: f32,
}

/// Score approximate results against ground truth, one list per query.
///
/// # Errors
///
/// [`VerityError::InputShape`] if the number of result lists differs from
/// the number of queries; [`VerityError::InvalidK`] if `k` exceeds the
/// ground-truth depth.
pub fn evaluate_recall(truth: &GroundTruth, retrieved: &[Vec<u32>], k: usize) -> Result<RecallSummary> {
    if retrieved.len() != truth.nqueries() {
        return Err(VerityError::shape(
            format!("{} result lists", truth.nqueries()),
            format!("{} result lists", retrieved.len()),
        ));
    }
    if k == 0 || k > truth.k() {
        return Err(VerityError::InvalidK {
            k,
            available: truth.k(),
        });
    }

    let recalls: Vec<f32> = truth
        .rows()
        .zip(retrieved)
        .map(|(gt, ret)| recall_at_k(gt, ret, k))
        .collect();

    let n = recalls.len();
    if n == 0 {
        return Ok(RecallSummary {
            n_queries: 0,
            k,
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            std: 0.0,
        });
    }

    let mean = recalls.iter().sum::<f32>() / n as f32;
    let min = recalls.iter().copied().fold(f32::INFINITY, f32::min);
    let max = recalls.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let variance = recalls.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / n as f32;

    Ok(RecallSummary {
        n_queries: n,
        k,
        mean,
        min,
        max,
        std: variance.sqrt(),
    })
}
