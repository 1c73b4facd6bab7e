//! Small dense linear-algebra helpers.
//!
//! Random rotations are the usual preprocessing step before comparing an
//! approximate index against rotated data: exact distances are preserved, so
//! ground truth computed before and after rotation must agree.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::benchmark::datasets::standard_normal;
use crate::error::{Result, VerityError};
use crate::matrix::Matrix;
use crate::simd;

/// Inverse of a permutation: `out[perm[i]] == i`.
///
/// # Errors
///
/// [`VerityError::InvalidParameter`] if `perm` is not a permutation of `0..len`.
pub fn invert_permutation(perm: &[usize]) -> Result<Vec<usize>> {
    let mut inverse = vec![usize::MAX; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        if p >= perm.len() || inverse[p] != usize::MAX {
            return Err(VerityError::InvalidParameter(format!(
                "not a permutation: entry {p} at position {i}"
            )));
        }
        inverse[p] = i;
    }
    Ok(inverse)
}

/// Orthonormal basis for the row space, one output row per input row.
///
/// Uses modified Gram-Schmidt in `f64`.
///
/// # Errors
///
/// [`VerityError::InvalidParameter`] if the rows are linearly dependent
/// (including having more rows than columns).
pub fn orthonormalize_rows(m: &Matrix) -> Result<Matrix> {
    let cols = m.ncols();
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(m.nrows());

    for (i, row) in m.rows_iter().enumerate() {
        let mut v: Vec<f64> = row.iter().map(|&x| f64::from(x)).collect();
        let scale = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        for b in &basis {
            let d: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
            for (vi, bi) in v.iter_mut().zip(b) {
                *vi -= d * bi;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= 1e-10 * scale.max(1.0) {
            return Err(VerityError::InvalidParameter(format!(
                "row {i} is linearly dependent on the previous rows"
            )));
        }
        v.iter_mut().for_each(|x| *x /= norm);
        basis.push(v);
    }

    let data = basis.into_iter().flatten().map(|x| x as f32).collect();
    Matrix::from_flat(m.nrows(), cols, data)
}

/// Random `d x d` orthogonal matrix from a seeded Gaussian draw.
pub fn random_rotation(d: usize, seed: u64) -> Result<Matrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    // Gaussian draws are full rank with probability one.
    for _ in 0..8 {
        let data: Vec<f32> = (0..d * d).map(|_| standard_normal(&mut rng)).collect();
        if let Ok(q) = orthonormalize_rows(&Matrix::from_flat(d, d, data)?) {
            return Ok(q);
        }
    }
    Err(VerityError::InvalidParameter(format!(
        "failed to draw a full-rank {d}x{d} matrix"
    )))
}

/// Multiply every row of `x` by `rotation`: `out[i] = rotation · x[i]`.
pub fn rotate_rows(x: &Matrix, rotation: &Matrix) -> Result<Matrix> {
    if rotation.ncols() != x.ncols() {
        return Err(VerityError::shape(
            format!("rotation with {} columns", x.ncols()),
            format!("rotation with {} columns", rotation.ncols()),
        ));
    }
    let mut out = Matrix::zeros(x.nrows(), rotation.nrows());
    for (i, row) in x.rows_iter().enumerate() {
        for (o, r) in out.row_mut(i).iter_mut().zip(rotation.rows_iter()) {
            *o = simd::dot(r, row);
        }
    }
    Ok(out)
}
