//! Field descriptors, semantic types, value transforms, and the
//! [`FieldSet`] bitset.

use crate::id::FieldId;
use crate::value::{Tolerance, Value};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Semantic type of a field.
///
/// Integer, text and boolean fields are compared exactly; real fields
/// are compared within a [`Tolerance`]. Only real and integer fields can
/// take part in equations and constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Approximate real number.
    Real,
    /// Exact integer.
    Integer,
    /// Text string.
    Text,
    /// Boolean flag.
    Boolean,
}

/// How far a solver value may sit from an integer and still be accepted
/// for an integer field.
const INTEGRAL_SLACK: f64 = 1e-9;

impl FieldType {
    /// Whether the type can appear in equations and constraints.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Real | Self::Integer)
    }

    /// Whether values of this type are compared exactly.
    pub fn is_exact(self) -> bool {
        !matches!(self, Self::Real)
    }

    /// Lowercase type name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Boolean => "boolean",
        }
    }

    /// Check and normalize a supplied value against this type.
    ///
    /// Integers widen to reals, and an integral real within `i64` range
    /// is accepted for an integer field. Anything else is handed back as
    /// `Err`.
    pub fn coerce(self, value: Value) -> Result<Value, Value> {
        match (self, value) {
            (Self::Real, Value::Real(r)) => Ok(Value::Real(r)),
            (Self::Real, Value::Int(i)) => Ok(Value::Real(i as f64)),
            (Self::Integer, Value::Int(i)) => Ok(Value::Int(i)),
            (Self::Integer, Value::Real(r))
                if r.is_finite() && r.fract() == 0.0 && r.abs() < i64::MAX as f64 =>
            {
                Ok(Value::Int(r as i64))
            }
            (Self::Text, Value::Text(s)) => Ok(Value::Text(s)),
            (Self::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
            (_, other) => Err(other),
        }
    }

    /// Convert a computed number into a value of this type.
    ///
    /// Returns `None` when the number lies outside the type's domain:
    /// NaN or infinite for any numeric type, or not close to an integer
    /// for an integer field.
    pub fn from_f64(self, x: f64) -> Option<Value> {
        if !x.is_finite() {
            return None;
        }
        match self {
            Self::Real => Some(Value::Real(x)),
            Self::Integer => {
                let rounded = x.round();
                let slack = INTEGRAL_SLACK * rounded.abs().max(1.0);
                if (x - rounded).abs() <= slack && rounded.abs() < i64::MAX as f64 {
                    Some(Value::Int(rounded as i64))
                } else {
                    None
                }
            }
            Self::Text | Self::Boolean => None,
        }
    }

    /// Compare two values of this type: exactly for exact types, within
    /// `tolerance` for reals.
    pub fn values_match(self, a: &Value, b: &Value, tolerance: &Tolerance) -> bool {
        match self {
            Self::Real => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => tolerance.approx_eq(x, y),
                _ => false,
            },
            Self::Integer => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            Self::Text | Self::Boolean => a == b,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Value transforms ───────────────────────────────────────────────

type TransformFn = dyn Fn(Value) -> Value + Send + Sync;

/// A post-resolution transform applied to a field's computed value.
///
/// Transforms are opaque single-argument functions, typically used for
/// precision rounding. They run on every value the engine computes for
/// the field (never on values the caller supplied) and again during
/// validation, where the rule's recomputed result is transformed before
/// comparison.
#[derive(Clone)]
pub struct ValueTransform {
    name: Arc<str>,
    func: Arc<TransformFn>,
}

impl ValueTransform {
    /// Wrap an arbitrary function. `name` is only used in diagnostics.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            func: Arc::new(func),
        }
    }

    /// Round real values to `places` decimal places. Other values pass
    /// through unchanged.
    pub fn round_to(places: u32) -> Self {
        let scale = 10f64.powi(places as i32);
        Self::new(format!("round_to({places})"), move |v| match v {
            Value::Real(r) => Value::Real((r * scale).round() / scale),
            other => other,
        })
    }

    /// Apply the transform.
    pub fn apply(&self, value: Value) -> Value {
        (self.func)(value)
    }

    /// The diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ValueTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueTransform").field(&self.name).finish()
    }
}

// ── FieldSpec ──────────────────────────────────────────────────────

/// Compiled description of one declared field.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    /// Position in declaration order.
    pub id: FieldId,
    /// Field name, unique within the schema.
    pub name: String,
    /// Semantic type.
    pub ty: FieldType,
    /// Optional transform applied to computed values.
    pub transform: Option<ValueTransform>,
    /// `true` when no rule targets this field.
    pub root: bool,
}

impl FieldSpec {
    /// Apply the field's transform, if any.
    pub fn transform(&self, value: Value) -> Value {
        match &self.transform {
            Some(t) => t.apply(value),
            None => value,
        }
    }
}

// ── FieldSet ───────────────────────────────────────────────────────

/// A set of field IDs, stored as a bitset.
///
/// Schemas rarely declare more than a hundred fields, so the first two
/// words live inline. Used by the dependency graph and the resolution
/// stages to track which fields are known, released, or still pending.
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    words: SmallVec<[u64; 2]>,
}

impl FieldSet {
    /// Create an empty field set.
    pub fn empty() -> Self {
        Self::default()
    }

    fn slot(field: FieldId) -> (usize, u64) {
        let i = field.index();
        (i / 64, 1u64 << (i % 64))
    }

    /// Insert a field; returns `true` if it was not already present.
    pub fn insert(&mut self, field: FieldId) -> bool {
        let (word, mask) = Self::slot(field);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    /// Remove a field; returns `true` if it was present.
    pub fn remove(&mut self, field: FieldId) -> bool {
        let (word, mask) = Self::slot(field);
        match self.words.get_mut(word) {
            Some(w) if *w & mask != 0 => {
                *w &= !mask;
                true
            }
            _ => false,
        }
    }

    /// Whether the set contains `field`.
    pub fn contains(&self, field: FieldId) -> bool {
        let (word, mask) = Self::slot(field);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Add every member of `other` to `self`.
    pub fn extend_from(&mut self, other: &Self) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w |= o;
        }
    }

    /// `self | other`.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.extend_from(other);
        out
    }

    /// `self & other`.
    pub fn intersection(&self, other: &Self) -> Self {
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        Self { words }
    }

    /// `self - other`: members of `self` not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let words = self
            .words
            .iter()
            .enumerate()
            .map(|(i, a)| a & !other.words.get(i).copied().unwrap_or(0))
            .collect();
        Self { words }
    }

    /// Whether every member of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, a)| a & !other.words.get(i).copied().unwrap_or(0) == 0)
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Members in ascending order.
    pub fn iter(&self) -> FieldSetIter<'_> {
        FieldSetIter {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl PartialEq for FieldSet {
    fn eq(&self, other: &Self) -> bool {
        self.is_subset(other) && other.is_subset(self)
    }
}

impl Eq for FieldSet {}

impl FromIterator<FieldId> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldId>>(iter: I) -> Self {
        let mut set = Self::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl Extend<FieldId> for FieldSet {
    fn extend<I: IntoIterator<Item = FieldId>>(&mut self, iter: I) {
        for field in iter {
            self.insert(field);
        }
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = FieldId;
    type IntoIter = FieldSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over a [`FieldSet`].
pub struct FieldSetIter<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Iterator for FieldSetIter<'_> {
    type Item = FieldId;

    fn next(&mut self) -> Option<FieldId> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(FieldId((self.index * 64 + bit) as u32));
            }
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_field_set() -> impl Strategy<Value = FieldSet> {
        prop::collection::vec(0u32..200, 0..40)
            .prop_map(|ids| ids.into_iter().map(FieldId).collect::<FieldSet>())
    }

    #[test]
    fn coerce_widens_and_narrows() {
        assert_eq!(FieldType::Real.coerce(Value::Int(2)), Ok(Value::Real(2.0)));
        assert_eq!(
            FieldType::Integer.coerce(Value::Real(3.0)),
            Ok(Value::Int(3))
        );
        assert_eq!(
            FieldType::Integer.coerce(Value::Real(3.5)),
            Err(Value::Real(3.5))
        );
        assert!(FieldType::Text.coerce(Value::Int(1)).is_err());
    }

    #[test]
    fn coerce_rejects_integral_reals_beyond_i64() {
        assert_eq!(
            FieldType::Integer.coerce(Value::Real(1e19)),
            Err(Value::Real(1e19))
        );
        assert_eq!(
            FieldType::Integer.coerce(Value::Real(-1e19)),
            Err(Value::Real(-1e19))
        );
        assert_eq!(
            FieldType::Integer.coerce(Value::Real(9e15)),
            Ok(Value::Int(9_000_000_000_000_000))
        );
    }

    #[test]
    fn from_f64_enforces_domain() {
        assert_eq!(FieldType::Real.from_f64(f64::NAN), None);
        assert_eq!(FieldType::Integer.from_f64(4.0000000000001), Some(Value::Int(4)));
        assert_eq!(FieldType::Integer.from_f64(4.5), None);
        assert_eq!(FieldType::Text.from_f64(1.0), None);
    }

    #[test]
    fn round_to_only_touches_reals() {
        let t = ValueTransform::round_to(2);
        assert_eq!(t.apply(Value::Real(3.14159)), Value::Real(3.14));
        assert_eq!(t.apply(Value::Int(7)), Value::Int(7));
        assert_eq!(t.name(), "round_to(2)");
    }

    #[test]
    fn iteration_crosses_word_boundaries() {
        let set: FieldSet = [FieldId(0), FieldId(63), FieldId(64), FieldId(130)]
            .into_iter()
            .collect();
        let ids: Vec<u32> = set.iter().map(|f| f.0).collect();
        assert_eq!(ids, vec![0, 63, 64, 130]);
    }

    #[test]
    fn remove_reports_membership() {
        let mut set = FieldSet::empty();
        assert!(set.insert(FieldId(5)));
        assert!(!set.insert(FieldId(5)));
        assert!(set.remove(FieldId(5)));
        assert!(!set.remove(FieldId(5)));
        assert!(set.is_empty());
    }

    proptest! {
        #[test]
        fn union_commutative(a in arb_field_set(), b in arb_field_set()) {
            prop_assert_eq!(a.union(&b), b.union(&a));
        }

        #[test]
        fn intersection_is_subset_of_both(a in arb_field_set(), b in arb_field_set()) {
            let i = a.intersection(&b);
            prop_assert!(i.is_subset(&a));
            prop_assert!(i.is_subset(&b));
        }

        #[test]
        fn difference_disjoint_from_other(a in arb_field_set(), b in arb_field_set()) {
            let d = a.difference(&b);
            prop_assert!(d.intersection(&b).is_empty());
            prop_assert_eq!(d.union(&a.intersection(&b)), a);
        }

        #[test]
        fn len_matches_iter_count(a in arb_field_set()) {
            prop_assert_eq!(a.len(), a.iter().count());
        }

        #[test]
        fn iter_is_ascending(a in arb_field_set()) {
            let ids: Vec<FieldId> = a.iter().collect();
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
