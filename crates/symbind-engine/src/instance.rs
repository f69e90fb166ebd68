//! Resolved entity instances.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use symbind_core::{Assignment, ResolutionError, Value};
use symbind_schema::Schema;

use crate::metrics::ResolutionMetrics;
use crate::resolver::Resolver;

/// A fully resolved set of field values.
///
/// Every declared field has a value, every rule and constraint held when
/// the instance was produced, and the only way to change it is through
/// [`update`](Self::update), [`set`](Self::set) or
/// [`replace`](Self::replace), all of which re-resolve and re-validate.
///
/// Equality compares the entity name and the values; metrics are
/// ignored.
#[derive(Clone)]
pub struct Instance {
    resolver: Resolver,
    pub(crate) values: Vec<Value>,
    pub(crate) metrics: ResolutionMetrics,
}

impl Instance {
    pub(crate) fn new(resolver: Resolver, values: Vec<Value>, metrics: ResolutionMetrics) -> Self {
        Self {
            resolver,
            values,
            metrics,
        }
    }

    /// The compiled schema of this instance's entity type.
    pub fn schema(&self) -> &Schema {
        self.resolver.schema()
    }

    /// The resolver that produced (and updates) this instance.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Value of `field`, or `None` if it is not declared.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema()
            .id_of(field)
            .and_then(|id| self.values.get(id.index()))
    }

    /// Numeric value of `field` (integers widen).
    pub fn real(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Integer value of `field`.
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Text value of `field`.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Boolean value of `field`.
    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.schema()
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(spec, value)| (spec.name.as_str(), value))
    }

    /// A detached copy of every value, in declaration order.
    pub fn to_assignment(&self) -> Assignment {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// Metrics from the resolution that produced the current values.
    pub fn metrics(&self) -> &ResolutionMetrics {
        &self.metrics
    }

    /// Re-resolve with `changes` as new givens. See
    /// [`Resolver::update`]. On error the instance is unchanged.
    pub fn update<I, K, V>(&mut self, changes: I) -> Result<(), ResolutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let resolver = self.resolver.clone();
        resolver.update(self, changes)
    }

    /// Change a single field, re-resolving everything that depends on it.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), ResolutionError> {
        self.update([(field, value.into())])
    }

    /// A re-resolved copy with `changes` applied; `self` is untouched.
    pub fn replace<I, K, V>(&self, changes: I) -> Result<Instance, ResolutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.resolver.replace(self, changes)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.schema().name() == other.schema().name() && self.values == other.values
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema().name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::Text(s) => write!(f, "{name}={s:?}")?,
                other => write!(f, "{name}={other}")?,
            }
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("entity", &self.schema().name())
            .field("values", &self.to_assignment())
            .finish_non_exhaustive()
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
