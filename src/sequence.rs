//! Typed one-dimensional columns with missing values.
//!
//! A [`Sequence`] is the unit the comparator works on and the unit a
//! [`ColumnStore`](crate::store::ColumnStore) loads and saves. A position is
//! *missing* when the optional presence mask marks it absent, or, for float
//! columns, when it holds NaN.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};

/// Element type of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Float64,
    Int64,
    Bool,
    Text,
}

impl DType {
    /// Whether values of this type are compared with a numeric tolerance.
    ///
    /// Booleans count as numeric (`false == 0`, `true == 1`).
    #[inline]
    pub fn is_numeric(self) -> bool {
        !matches!(self, DType::Text)
    }
}

/// Column storage, one variant per [`DType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Values {
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Float64(v) => v.len(),
            Values::Int64(v) => v.len(),
            Values::Bool(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            Values::Float64(_) => DType::Float64,
            Values::Int64(_) => DType::Int64,
            Values::Bool(_) => DType::Bool,
            Values::Text(_) => DType::Text,
        }
    }
}

/// Immutable typed column with an optional presence mask and a logical shape.
///
/// Mask length and shape are validated on deserialization as well as in
/// [`with_mask`](Self::with_mask) and [`with_shape`](Self::with_shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSequence")]
pub struct Sequence {
    values: Values,
    present: Option<Vec<bool>>,
    shape: Vec<usize>,
}

#[derive(Deserialize)]
struct RawSequence {
    values: Values,
    #[serde(default)]
    present: Option<Vec<bool>>,
    shape: Vec<usize>,
}

impl TryFrom<RawSequence> for Sequence {
    type Error = VerityError;

    fn try_from(raw: RawSequence) -> Result<Self> {
        let mut seq = Sequence::new(raw.values);
        if let Some(mask) = raw.present {
            seq = seq.with_mask(mask)?;
        }
        seq.with_shape(raw.shape)
    }
}

impl Sequence {
    /// Wrap column values; the shape defaults to `[len]`.
    pub fn new(values: Values) -> Self {
        let shape = vec![values.len()];
        Self {
            values,
            present: None,
            shape,
        }
    }

    /// Float column; NaN marks a missing value.
    pub fn float(values: Vec<f64>) -> Self {
        Self::new(Values::Float64(values))
    }

    pub fn int(values: Vec<i64>) -> Self {
        Self::new(Values::Int64(values))
    }

    pub fn bool(values: Vec<bool>) -> Self {
        Self::new(Values::Bool(values))
    }

    pub fn text<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(Values::Text(values.into_iter().map(Into::into).collect()))
    }

    /// Integer column with missing entries given as `None`.
    pub fn int_opt(values: Vec<Option<i64>>) -> Self {
        let present = values.iter().map(Option::is_some).collect();
        let data = values.into_iter().map(Option::unwrap_or_default).collect();
        Self::new(Values::Int64(data)).with_present(present)
    }

    /// Text column with missing entries given as `None`.
    pub fn text_opt<S: Into<String>>(values: Vec<Option<S>>) -> Self {
        let present = values.iter().map(Option::is_some).collect();
        let data = values
            .into_iter()
            .map(|v| v.map(Into::into).unwrap_or_default())
            .collect();
        Self::new(Values::Text(data)).with_present(present)
    }

    fn with_present(mut self, present: Vec<bool>) -> Self {
        self.present = Some(present);
        self
    }

    /// Attach an explicit presence mask (`true` = present).
    pub fn with_mask(self, mask: Vec<bool>) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(VerityError::shape(
                format!("mask of length {}", self.len()),
                format!("mask of length {}", mask.len()),
            ));
        }
        Ok(self.with_present(mask))
    }

    /// Reinterpret with a logical shape whose element count equals `len()`.
    pub fn with_shape(mut self, shape: Vec<usize>) -> Result<Self> {
        let count: usize = shape.iter().product();
        if count != self.len() {
            return Err(VerityError::shape(
                format!("{} elements", self.len()),
                format!("shape {shape:?} with {count} elements"),
            ));
        }
        self.shape = shape;
        Ok(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Whether position `i` holds a value.
    pub fn is_present(&self, i: usize) -> bool {
        let masked = self.present.as_ref().map_or(true, |m| m[i]);
        let nan = matches!(&self.values, Values::Float64(v) if v[i].is_nan());
        masked && !nan
    }

    /// Per-position presence.
    pub fn presence(&self) -> Vec<bool> {
        (0..self.len()).map(|i| self.is_present(i)).collect()
    }

    /// Value at `i` as a float, for numeric columns.
    pub fn as_f64(&self, i: usize) -> Option<f64> {
        match &self.values {
            Values::Float64(v) => Some(v[i]),
            Values::Int64(v) => Some(v[i] as f64),
            Values::Bool(v) => Some(if v[i] { 1.0 } else { 0.0 }),
            Values::Text(_) => None,
        }
    }

    /// Value at `i` as text, for text columns.
    pub fn as_str(&self, i: usize) -> Option<&str> {
        match &self.values {
            Values::Text(v) => Some(v[i].as_str()),
            _ => None,
        }
    }
}
