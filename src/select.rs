//! Partial top-k selection.
//!
//! Selection runs in two steps:
//!
//! 1. `select_nth_unstable_by` partitions the candidates so the k best sit in
//!    front (expected O(n)). This only fixes the k-vs-rest boundary.
//! 2. The k selected candidates are sorted, which gives the final
//!    best-first order consumers rely on.
//!
//! Ties are broken by ascending index, and NaN always ranks worst, so the
//! output is fully determined by the input.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::matrix::Matrix;

/// Which end of the value range counts as "best".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Order {
    /// Select the smallest values, returned ascending.
    #[default]
    SmallerBetter,
    /// Select the largest values, returned descending.
    LargerBetter,
}

impl Order {
    /// Compare two values so that the better one sorts first.
    #[inline]
    fn compare(self, a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                match self {
                    Order::SmallerBetter => ord,
                    Order::LargerBetter => ord.reverse(),
                }
            }
        }
    }
}

/// Axis along which to select in a 2-D input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    /// Select within each row (the last axis).
    #[default]
    Rows,
    /// Select within each column.
    Columns,
}

/// The k best elements of a collection, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopK {
    /// Positions in the input, unique and in bounds.
    pub indices: Vec<usize>,
    /// Values at those positions.
    pub values: Vec<f32>,
}

impl TopK {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn check_k(k: usize, available: usize) -> Result<()> {
    if k == 0 || k > available {
        return Err(VerityError::InvalidK { k, available });
    }
    Ok(())
}

/// Select the k best elements and return them in final order.
pub fn top_k(elements: &[f32], k: usize, order: Order) -> Result<TopK> {
    check_k(k, elements.len())?;

    let by_value = |a: &usize, b: &usize| {
        order
            .compare(elements[*a], elements[*b])
            .then_with(|| a.cmp(b))
    };

    let mut idxs: Vec<usize> = (0..elements.len()).collect();
    if k < idxs.len() {
        idxs.select_nth_unstable_by(k - 1, by_value);
        idxs.truncate(k);
    }
    idxs.sort_unstable_by(by_value);

    let values = idxs.iter().map(|&i| elements[i]).collect();
    Ok(TopK {
        indices: idxs,
        values,
    })
}

/// Indices of the k best elements, best first.
///
/// # Errors
///
/// [`VerityError::InvalidK`] unless `0 < k <= elements.len()`.
pub fn top_k_idxs(elements: &[f32], k: usize, order: Order) -> Result<Vec<usize>> {
    top_k(elements, k, order).map(|t| t.indices)
}

/// Top-k along an axis of a matrix.
///
/// Returns one index list per row (`Axis::Rows`) or per column
/// (`Axis::Columns`); indices refer to positions along the selected axis.
pub fn top_k_idxs_along(
    matrix: &Matrix,
    k: usize,
    order: Order,
    axis: Axis,
) -> Result<Vec<Vec<usize>>> {
    match axis {
        Axis::Rows => matrix
            .rows_iter()
            .map(|row| top_k_idxs(row, k, order))
            .collect(),
        Axis::Columns => (0..matrix.ncols())
            .map(|j| top_k_idxs(&matrix.col(j), k, order))
            .collect(),
    }
}
