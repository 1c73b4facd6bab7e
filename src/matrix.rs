//! Dense row-major matrices.
//!
//! [`Matrix`] owns its storage; [`MatrixView`] borrows a contiguous range of
//! rows from one. Reference sets, query batches and distance grids all use
//! this representation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};

/// Owned row-major `f32` matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap a flat row-major buffer.
    pub fn from_flat(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(VerityError::shape(
                format!("{} elements ({rows}x{cols})", rows * cols),
                format!("{} elements", data.len()),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a list of rows. All rows must share a length.
    ///
    /// An empty list yields a `0 x 0` matrix.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(VerityError::shape(
                    format!("row of length {cols}"),
                    format!("row {i} of length {}", row.len()),
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Single-column matrix, one scalar per row.
    pub fn column(values: &[f32]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.view().rows_iter()
    }

    /// Copy out column `j`.
    pub fn col(&self, j: usize) -> Vec<f32> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    /// Borrow the whole matrix.
    #[inline]
    pub fn view(&self) -> MatrixView<'_> {
        MatrixView {
            rows: self.rows,
            cols: self.cols,
            data: &self.data,
        }
    }

    /// Borrow rows `start..end`.
    pub fn slice_rows(&self, start: usize, end: usize) -> MatrixView<'_> {
        self.view().slice_rows(start, end)
    }

    /// Size of the backing buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.get(i, j);
            }
        }
        out
    }
}

/// Borrowed contiguous block of rows.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    rows: usize,
    cols: usize,
    data: &'a [f32],
}

impl<'a> MatrixView<'a> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row(&self, i: usize) -> &'a [f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &'a [f32]> + 'a {
        let (cols, data) = (self.cols, self.data);
        (0..self.rows).map(move |i| &data[i * cols..(i + 1) * cols])
    }

    /// Borrow rows `start..end` of this view.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or `end > nrows()`.
    pub fn slice_rows(&self, start: usize, end: usize) -> MatrixView<'a> {
        assert!(start <= end && end <= self.rows, "row range {start}..{end} out of bounds");
        MatrixView {
            rows: end - start,
            cols: self.cols,
            data: &self.data[start * self.cols..end * self.cols],
        }
    }
}

impl<'a> From<&'a Matrix> for MatrixView<'a> {
    fn from(m: &'a Matrix) -> Self {
        m.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged() {
        let err = Matrix::from_rows(&[vec![1.0_f32, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, VerityError::InputShape { .. }));
    }

    #[test]
    fn slice_rows_borrows_the_right_block() {
        let m = Matrix::from_rows(&[[0.0_f32, 1.0], [2.0, 3.0], [4.0, 5.0]]).unwrap();
        let v = m.slice_rows(1, 3);
        assert_eq!(v.nrows(), 2);
        assert_eq!(v.row(0), &[2.0, 3.0]);
        assert_eq!(v.slice_rows(1, 2).row(0), &[4.0, 5.0]);
    }

    #[test]
    fn transpose_swaps_axes() {
        let m = Matrix::from_rows(&[[1.0_f32, 2.0, 3.0]]).unwrap();
        let t = m.transpose();
        assert_eq!((t.nrows(), t.ncols()), (3, 1));
        assert_eq!(t.col(0), vec![1.0, 2.0, 3.0]);
    }
}
