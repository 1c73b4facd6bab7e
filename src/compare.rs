//! Tolerant equality for numeric and mixed-type sequences.
//!
//! [`compare`] decides whether two [`Sequence`]s agree, and reports which
//! positions do not. It runs a fixed pipeline, stopping at the first failure:
//!
//! 1. shape guard (when `require_same_shape`);
//! 2. dtype guard (when `require_same_dtype`);
//! 3. numeric-class guard: numeric never equals non-numeric;
//! 4. missing values must sit at the same positions on both sides;
//! 5. missing values at all fail the comparison unless `equal_nan`;
//! 6. present values are compared, exactly for text and with
//!    `|a - b| <= atol + rtol * |b|` for numbers.
//!
//! Guard failures (1–3) report no failing indices; element-level failures
//! (4–6) always report at least one.
//!
//! # Asymmetry
//!
//! The relative term scales with `b` only, so `b` acts as the reference value:
//!
//! ```rust
//! use verity::compare::{allclose, Tolerance};
//! use verity::sequence::Sequence;
//!
//! let tol = Tolerance::new(0.5, 0.0).unwrap();
//! let a = Sequence::float(vec![1.0]);
//! let b = Sequence::float(vec![2.0]);
//! assert!(allclose(&a, &b, &tol)); // 1.0 <= 0.5 * 2.0
//! assert!(!allclose(&b, &a, &tol)); // 1.0 >  0.5 * 1.0
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::sequence::{Sequence, Values};

/// Default relative tolerance.
pub const DEFAULT_RTOL: f64 = 1e-5;
/// Default absolute tolerance.
pub const DEFAULT_ATOL: f64 = 1e-5;

/// Comparison parameters.
///
/// Tolerances are validated on construction and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTolerance")]
pub struct Tolerance {
    rtol: f64,
    atol: f64,
    equal_nan: bool,
    require_same_dtype: bool,
    require_same_shape: bool,
}

#[derive(Deserialize)]
struct RawTolerance {
    #[serde(default = "default_rtol")]
    rtol: f64,
    #[serde(default = "default_atol")]
    atol: f64,
    #[serde(default = "default_true")]
    equal_nan: bool,
    #[serde(default = "default_true")]
    require_same_dtype: bool,
    #[serde(default = "default_true")]
    require_same_shape: bool,
}

fn default_rtol() -> f64 {
    DEFAULT_RTOL
}

fn default_atol() -> f64 {
    DEFAULT_ATOL
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawTolerance> for Tolerance {
    type Error = VerityError;

    fn try_from(raw: RawTolerance) -> Result<Self> {
        Ok(Tolerance::new(raw.rtol, raw.atol)?
            .equal_nan(raw.equal_nan)
            .require_same_dtype(raw.require_same_dtype)
            .require_same_shape(raw.require_same_shape))
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
            equal_nan: true,
            require_same_dtype: true,
            require_same_shape: true,
        }
    }
}

impl Tolerance {
    /// Tolerance with the given relative and absolute terms and default flags.
    ///
    /// # Errors
    ///
    /// [`VerityError::InvalidParameter`] if either term is negative or NaN.
    pub fn new(rtol: f64, atol: f64) -> Result<Self> {
        for (name, v) in [("rtol", rtol), ("atol", atol)] {
            if v.is_nan() || v < 0.0 {
                return Err(VerityError::InvalidParameter(format!(
                    "{name} must be non-negative, got {v}"
                )));
            }
        }
        Ok(Self {
            rtol,
            atol,
            ..Self::default()
        })
    }

    /// Zero tolerance: values must match exactly.
    pub fn exact() -> Self {
        Self {
            rtol: 0.0,
            atol: 0.0,
            ..Self::default()
        }
    }

    /// Whether missing values on both sides count as equal.
    pub fn equal_nan(mut self, yes: bool) -> Self {
        self.equal_nan = yes;
        self
    }

    pub fn require_same_dtype(mut self, yes: bool) -> Self {
        self.require_same_dtype = yes;
        self
    }

    pub fn require_same_shape(mut self, yes: bool) -> Self {
        self.require_same_shape = yes;
        self
    }

    pub fn rtol(&self) -> f64 {
        self.rtol
    }

    pub fn atol(&self) -> f64 {
        self.atol
    }

    /// Largest allowed `|a - b|` when the reference value is `b`.
    #[inline]
    pub fn bound(&self, b: f64) -> f64 {
        self.atol + self.rtol * b.abs()
    }
}

/// Outcome of [`compare`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Comparison {
    pub matches: bool,
    /// Original positions that failed, ascending.
    pub failing_indices: Vec<usize>,
}

impl Comparison {
    fn pass() -> Self {
        Self {
            matches: true,
            failing_indices: Vec::new(),
        }
    }

    fn guard_failure() -> Self {
        Self::default()
    }

    fn from_failures(failing_indices: Vec<usize>) -> Self {
        Self {
            matches: failing_indices.is_empty(),
            failing_indices,
        }
    }
}

/// Compare `a` against reference `b`.
pub fn compare(a: &Sequence, b: &Sequence, tol: &Tolerance) -> Comparison {
    if tol.require_same_shape && (a.len() != b.len() || a.shape() != b.shape()) {
        return Comparison::guard_failure();
    }
    if tol.require_same_dtype && a.dtype() != b.dtype() {
        return Comparison::guard_failure();
    }
    if a.dtype().is_numeric() != b.dtype().is_numeric() {
        return Comparison::guard_failure();
    }
    // Positions cannot be aligned without equal lengths.
    if a.len() != b.len() {
        return Comparison::guard_failure();
    }

    let a_present = a.presence();
    let b_present = b.presence();
    let misaligned: Vec<usize> = (0..a.len())
        .filter(|&i| a_present[i] != b_present[i])
        .collect();
    if !misaligned.is_empty() {
        return Comparison::from_failures(misaligned);
    }

    if !tol.equal_nan {
        let missing: Vec<usize> = (0..a.len()).filter(|&i| !a_present[i]).collect();
        if !missing.is_empty() {
            return Comparison::from_failures(missing);
        }
    }

    let domain = (0..a.len()).filter(|&i| a_present[i]);
    let failures: Vec<usize> = if a.dtype().is_numeric() {
        domain.filter(|&i| !numeric_close(a, b, i, tol)).collect()
    } else {
        domain.filter(|&i| a.as_str(i) != b.as_str(i)).collect()
    };

    if failures.is_empty() {
        Comparison::pass()
    } else {
        Comparison::from_failures(failures)
    }
}

fn numeric_close(a: &Sequence, b: &Sequence, i: usize, tol: &Tolerance) -> bool {
    // Integers compare exactly; going through f64 would merge distinct large values.
    if let (Values::Int64(av), Values::Int64(bv)) = (a.values(), b.values()) {
        let (x, y) = (av[i], bv[i]);
        if x == y {
            return true;
        }
        let diff = (i128::from(x) - i128::from(y)).unsigned_abs() as f64;
        return diff <= tol.bound(y as f64);
    }

    let (Some(x), Some(y)) = (a.as_f64(i), b.as_f64(i)) else {
        return false;
    };
    // Equal infinities have a NaN difference.
    if x == y {
        return true;
    }
    // An infinite reference would otherwise make the bound infinite too.
    if x.is_infinite() || y.is_infinite() {
        return false;
    }
    (x - y).abs() <= tol.bound(y)
}

/// Whether `a` and `b` agree under `tol`.
pub fn allclose(a: &Sequence, b: &Sequence, tol: &Tolerance) -> bool {
    compare(a, b, tol).matches
}

/// Exact equality modulo missing-value handling.
pub fn array_equal(a: &Sequence, b: &Sequence, equal_nan: bool) -> bool {
    allclose(a, b, &Tolerance::exact().equal_nan(equal_nan))
}

/// Default `eps` for [`max_abs_diff_below`].
pub const ROUGH_EQ_EPS: f64 = 1e-3;

/// Quick check for float slices: equal length, and every absolute difference
/// below `eps`. Empty slices are equal.
pub fn max_abs_diff_below(x: &[f64], y: &[f64], eps: f64) -> bool {
    if x.len() != y.len() {
        return false;
    }
    x.iter().zip(y).all(|(a, b)| (a - b).abs() < eps)
}
