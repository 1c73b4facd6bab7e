//! Untyped boundary values, classified once.
//!
//! Values arriving from configuration files or foreign callers are turned
//! into an [`Input`] up front; everything downstream matches on the variant
//! instead of probing the value's type again.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Result, VerityError};

/// A single scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl Scalar {
    /// Numeric value, if this scalar has one.
    ///
    /// Text counts when it parses as a float; booleans map to 0 and 1.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(x) => Some(*x),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Null => None,
        }
    }
}

/// Classified boundary value.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Scalar(Scalar),
    Sequence(Vec<Input>),
    Mapping(BTreeMap<String, Input>),
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Input::Scalar(Scalar::Null),
            Value::Bool(b) => Input::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Input::Scalar(Scalar::Number(n.as_f64().unwrap_or(f64::NAN))),
            Value::String(s) => Input::Scalar(Scalar::Text(s)),
            Value::Array(items) => Input::Sequence(items.into_iter().map(Input::from).collect()),
            Value::Object(map) => {
                Input::Mapping(map.into_iter().map(|(k, v)| (k, Input::from(v))).collect())
            }
        }
    }
}

impl From<f64> for Input {
    fn from(x: f64) -> Self {
        Input::Scalar(Scalar::Number(x))
    }
}

impl From<&[f64]> for Input {
    fn from(xs: &[f64]) -> Self {
        Input::Sequence(xs.iter().copied().map(Input::from).collect())
    }
}

impl Input {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str::<Value>(text)
            .map(Input::from)
            .map_err(|e| VerityError::InputType(format!("invalid JSON input: {e}")))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Input::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Input::Sequence(_))
    }

    /// Wrap a non-sequence into a one-element sequence.
    pub fn into_list(self) -> Vec<Input> {
        match self {
            Input::Sequence(items) => items,
            other => vec![other],
        }
    }

    /// Interpret as a flat sequence of numbers.
    ///
    /// A numeric scalar becomes a one-element sequence.
    ///
    /// # Errors
    ///
    /// [`VerityError::InputType`] for mappings, nested sequences, and
    /// scalars without a numeric value.
    pub fn as_scalar_seq(&self) -> Result<Vec<f64>> {
        match self {
            Input::Scalar(s) => Ok(vec![scalar_f64(s)?]),
            Input::Sequence(items) => items
                .iter()
                .map(|item| match item {
                    Input::Scalar(s) => scalar_f64(s),
                    _ => Err(VerityError::InputType(
                        "sequence element is not a scalar".into(),
                    )),
                })
                .collect(),
            Input::Mapping(_) => Err(VerityError::InputType(
                "cannot convert a mapping to a sequence of scalars".into(),
            )),
        }
    }
}

fn scalar_f64(s: &Scalar) -> Result<f64> {
    s.to_f64()
        .ok_or_else(|| VerityError::InputType(format!("couldn't convert {s:?} to a scalar")))
}

/// Number of digits after the decimal point in a numeric literal.
///
/// `"3.25"` has 2; a literal without a point has 0.
pub fn decimal_digits(literal: &str) -> usize {
    literal.find('.').map_or(0, |dot| literal.len() - dot - 1)
}
