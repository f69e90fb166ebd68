//! Field values and approximate numeric comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value held by a single field of an instance.
///
/// Serialized untagged, so an instance renders as a plain JSON object
/// (`{"a": 1, "b": 2.5, "name": "x"}`). Variant order matters for
/// deserialization: booleans and integers are tried before reals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean flag.
    Bool(bool),
    /// An exact integer.
    Int(i64),
    /// An approximate real number.
    Real(f64),
    /// A text string.
    Text(String),
}

impl Value {
    /// Numeric view: integers widen to `f64`, non-numeric values are `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// The integer, if this is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The string slice, if this is `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The flag, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Real(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Tolerance for comparing approximate (real-valued) fields.
///
/// Two numbers match when `|a - b| <= max(relative * max(|a|, |b|), absolute)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Relative tolerance, scaled by the larger magnitude.
    pub relative: f64,
    /// Absolute floor, used near zero.
    pub absolute: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: 1e-9,
            absolute: 1e-9,
        }
    }
}

impl Tolerance {
    /// Whether `a` and `b` are equal within this tolerance.
    ///
    /// NaN never matches anything; equal infinities match.
    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let bound = (self.relative * a.abs().max(b.abs())).max(self.absolute);
        (a - b).abs() <= bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Real(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
    }

    #[test]
    fn untagged_json_shapes() {
        let json = serde_json::to_string(&vec![
            Value::Int(1),
            Value::Real(2.5),
            Value::from("hi"),
            Value::Bool(false),
        ])
        .unwrap();
        assert_eq!(json, r#"[1,2.5,"hi",false]"#);

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], Value::Int(1));
        assert_eq!(back[1], Value::Real(2.5));
        assert_eq!(back[3], Value::Bool(false));
    }

    #[test]
    fn tolerance_relative_and_absolute() {
        let tol = Tolerance::default();
        assert!(tol.approx_eq(0.1 + 0.2, 0.3));
        assert!(tol.approx_eq(1e12, 1e12 + 1.0));
        assert!(!tol.approx_eq(1.0, 1.001));
        assert!(tol.approx_eq(0.0, 1e-10));
        assert!(!tol.approx_eq(f64::NAN, f64::NAN));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(4).to_string(), "4");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::from("John").to_string(), "John");
    }
}
