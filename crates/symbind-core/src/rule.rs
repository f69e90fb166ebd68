//! Forward-function signature and argument access.
//!
//! A forward rule computes its target from an explicit list of parameter
//! fields. The engine calls the function only once every parameter has a
//! value, and hands those values over as [`Args`].

use crate::value::Value;
use std::sync::Arc;

/// Error returned by a forward function, or by an [`Args`] accessor when a
/// parameter is missing or has an unexpected type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    /// Build an error with a free-form message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A forward (non-invertible) rule body.
pub type ForwardFn = Arc<dyn Fn(&Args<'_>) -> Result<Value, RuleError> + Send + Sync>;

/// Named parameter values passed to a forward function.
///
/// ```
/// use symbind_core::{Args, Value};
///
/// let names = ["first".to_string(), "last".to_string()];
/// let values = [Value::from("John"), Value::from("Doe")];
/// let args = Args::new(&names, &values);
/// assert_eq!(args.text("last").unwrap(), "Doe");
/// assert!(args.real("first").is_err());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Args<'a> {
    names: &'a [String],
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Pair parameter names with their values. Both slices are in the
    /// order the parameters were declared.
    pub fn new(names: &'a [String], values: &'a [Value]) -> Self {
        Self { names, values }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.names.len().min(self.values.len())
    }

    /// Whether the rule takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw access to a parameter value.
    pub fn get(&self, name: &str) -> Result<&'a Value, RuleError> {
        let (names, values) = (self.names, self.values);
        names
            .iter()
            .zip(values)
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
            .ok_or_else(|| RuleError::new(format!("no parameter named '{name}'")))
    }

    /// A numeric parameter as `f64` (integers widen).
    pub fn real(&self, name: &str) -> Result<f64, RuleError> {
        let v = self.get(name)?;
        v.as_f64().ok_or_else(|| mismatch(name, "real", v))
    }

    /// An integer parameter.
    pub fn integer(&self, name: &str) -> Result<i64, RuleError> {
        let v = self.get(name)?;
        v.as_i64().ok_or_else(|| mismatch(name, "integer", v))
    }

    /// A text parameter.
    pub fn text(&self, name: &str) -> Result<&'a str, RuleError> {
        let v = self.get(name)?;
        v.as_str().ok_or_else(|| mismatch(name, "text", v))
    }

    /// A boolean parameter.
    pub fn boolean(&self, name: &str) -> Result<bool, RuleError> {
        let v = self.get(name)?;
        v.as_bool().ok_or_else(|| mismatch(name, "boolean", v))
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let (names, values) = (self.names, self.values);
        names.iter().map(String::as_str).zip(values)
    }
}

fn mismatch(name: &str, wanted: &str, got: &Value) -> RuleError {
    RuleError::new(format!(
        "parameter '{name}' is {} ({got}), expected {wanted}",
        got.kind()
    ))
}
