//! Synthetic datasets for exercising ground truth and scoring approximate search.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::ground_truth::{compute_true_knn, GroundTruth, GroundTruthConfig};
use crate::matrix::Matrix;

/// A reference set and a query batch of the same dimensionality.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Reference vectors (the candidate pool)
    pub base: Matrix,
    /// Query vectors
    pub queries: Matrix,
}

impl Dataset {
    pub fn dimension(&self) -> usize {
        self.base.ncols()
    }

    /// Total memory footprint of raw vectors in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.base.memory_bytes() + self.queries.memory_bytes()
    }

    /// Exact neighbors of every query.
    pub fn ground_truth(&self, config: &GroundTruthConfig) -> Result<GroundTruth> {
        compute_true_knn(&self.base, &self.queries, config)
    }
}

fn uniform_matrix(rng: &mut StdRng, rows: usize, dimension: usize) -> Matrix {
    let mut m = Matrix::zeros(rows, dimension);
    for i in 0..rows {
        for v in m.row_mut(i) {
            *v = rng.random::<f32>();
        }
    }
    m
}

/// Vectors uniformly distributed in [0, 1]^d.
///
/// This is a baseline dataset; real data usually has more structure.
pub fn uniform_dataset(n_base: usize, n_queries: usize, dimension: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = uniform_matrix(&mut rng, n_base, dimension);
    let queries = uniform_matrix(&mut rng, n_queries, dimension);
    Dataset { base, queries }
}

/// Gaussian blobs around `n_clusters` uniform centers, clamped to [0, 1].
pub fn clustered_dataset(
    n_base: usize,
    n_queries: usize,
    dimension: usize,
    n_clusters: usize,
    cluster_std: f32,
    seed: u64,
) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers = uniform_matrix(&mut rng, n_clusters.max(1), dimension);

    let sample = |rng: &mut StdRng, rows: usize| {
        let mut m = Matrix::zeros(rows, dimension);
        for i in 0..rows {
            let center = centers.row(rng.random_range(0..centers.nrows()));
            for (v, &c) in m.row_mut(i).iter_mut().zip(center) {
                *v = (c + standard_normal(rng) * cluster_std).clamp(0.0, 1.0);
            }
        }
        m
    };

    let base = sample(&mut rng, n_base);
    let queries = sample(&mut rng, n_queries);
    Dataset { base, queries }
}

/// Box-Muller sample from N(0, 1).
pub(crate) fn standard_normal(rng: &mut StdRng) -> f32 {
    // Avoid ln(0).
    let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
