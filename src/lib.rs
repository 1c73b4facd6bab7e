//! verity: exact baselines for approximate search.
//!
//! Approximate nearest-neighbor indexes are only as trustworthy as the
//! baseline they are measured against. This crate provides that baseline and
//! the tools to check it:
//!
//! - [`distance`]: squared-Euclidean, L1 and Hamming distances, plus a
//!   pairwise distance grid with reusable norms
//! - [`select`]: partial top-k selection with a guaranteed final order
//! - [`ground_truth`]: exact kNN for a query batch, computed block by block
//!   under a memory ceiling
//! - [`compare`]: tolerant equality for numeric and text sequences with
//!   missing-value alignment and failing-index diagnostics
//! - [`benchmark`]: recall@k and friends, synthetic datasets
//!
//! # Example
//!
//! ```rust
//! use verity::ground_truth::{compute_true_knn, GroundTruthConfig};
//! use verity::matrix::Matrix;
//!
//! let base = Matrix::column(&[0.0, 1.0, 2.0, 3.0, 10.0]);
//! let queries = Matrix::column(&[0.0]);
//! let truth = compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(2)).unwrap();
//! assert_eq!(truth.neighbors(0), &[0, 1]);
//! ```
//!
//! # Exactness
//!
//! Everything here is brute force. Blocking exists only to bound the size of
//! the intermediate distance grid; it never changes a result.

pub mod benchmark;
pub mod cache;
pub mod compare;
pub mod distance;
pub mod error;
pub mod ground_truth;
pub mod input;
pub mod linalg;
pub mod matrix;
pub mod select;
pub mod sequence;
pub mod simd;
pub mod store;

// Re-exports
pub use compare::{allclose, array_equal, compare, Comparison, Tolerance};
pub use distance::{hamming, hamming_dists, l1, pairwise_squared, squared_euclidean, MemoryLimit, Metric};
pub use error::{Result, VerityError};
pub use ground_truth::{compute_true_knn, GroundTruth, GroundTruthConfig};
pub use matrix::{Matrix, MatrixView};
pub use select::{top_k, top_k_idxs, Order, TopK};
pub use sequence::{DType, Sequence};
