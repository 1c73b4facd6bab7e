//! Benchmark utilities for scoring approximate search against exact results.
//!
//! - **Datasets**: seeded uniform and clustered synthetic data
//! - **Metrics**: recall@k, precision@k, MRR, per-batch recall summaries
//!
//! Reference: <https://ann-benchmarks.com/>

pub mod datasets;
pub mod metrics;

pub use datasets::{clustered_dataset, uniform_dataset, Dataset};
pub use metrics::{evaluate_recall, mrr, precision_at_k, recall_at_k, recall_curve, RecallSummary};
