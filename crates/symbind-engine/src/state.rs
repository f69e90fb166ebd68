//! Working state of a resolution in progress.

use symbind_core::{FieldId, FieldSet, Value};
use symbind_schema::Schema;

/// Field values during resolution: a slot per field plus the set of
/// fields that currently have a value.
#[derive(Clone, Debug)]
pub(crate) struct Working<'s> {
    schema: &'s Schema,
    values: Vec<Option<Value>>,
    known: FieldSet,
}

impl<'s> Working<'s> {
    pub(crate) fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            values: vec![None; schema.len()],
            known: FieldSet::empty(),
        }
    }

    pub(crate) fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub(crate) fn set(&mut self, field: FieldId, value: Value) {
        if let Some(slot) = self.values.get_mut(field.index()) {
            *slot = Some(value);
            self.known.insert(field);
        }
    }

    pub(crate) fn get(&self, field: FieldId) -> Option<&Value> {
        self.values.get(field.index()).and_then(Option::as_ref)
    }

    pub(crate) fn is_known(&self, field: FieldId) -> bool {
        self.known.contains(field)
    }

    pub(crate) fn known(&self) -> &FieldSet {
        &self.known
    }

    /// Numeric value of the field called `name`, if known.
    pub(crate) fn real(&self, name: &str) -> Option<f64> {
        self.schema
            .id_of(name)
            .and_then(|id| self.get(id))
            .and_then(Value::as_f64)
    }

    /// Fields still without a value.
    pub(crate) fn missing(&self) -> FieldSet {
        self.schema
            .fields()
            .iter()
            .map(|f| f.id)
            .filter(|id| !self.known.contains(*id))
            .collect()
    }

    /// Every value, or `None` while any field is missing.
    pub(crate) fn into_values(self) -> Option<Vec<Value>> {
        self.values.into_iter().collect()
    }
}
