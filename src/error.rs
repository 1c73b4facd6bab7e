//! Error types for verity.

use thiserror::Error;

/// Errors that can occur during selection, search, and input validation.
///
/// Comparator mismatches are not errors: [`crate::compare::compare`] reports
/// them as an ordinary `Comparison` value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerityError {
    /// Dimension or length mismatch between inputs that must agree.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    InputShape { expected: String, actual: String },

    /// Mixed numeric/non-numeric input, or a value that is not a scalar sequence.
    #[error("type error: {0}")]
    InputType(String),

    /// `k` is zero or exceeds the number of available candidates.
    #[error("invalid k: requested {k}, but only {available} candidates are available")]
    InvalidK { k: usize, available: usize },

    /// A sentinel survived ground-truth computation. Always an internal bug.
    #[error("incomplete computation: query {query} slot {slot} was never filled")]
    IncompleteComputation { query: usize, slot: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A distance matrix would exceed the hard memory limit.
    #[error("distance matrix of {bytes} bytes exceeds limit of {limit} bytes")]
    MatrixTooLarge { bytes: usize, limit: usize },

    /// Cache payload could not be encoded or decoded.
    #[error("cache error: {0}")]
    Cache(String),

    /// Requested record or column does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl VerityError {
    pub(crate) fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        Self::InputShape {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<postcard::Error> for VerityError {
    fn from(e: postcard::Error) -> Self {
        Self::Cache(format!("postcard error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, VerityError>;
