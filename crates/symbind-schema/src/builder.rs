//! Declarative field builder and the rule compiler.
//!
//! ```
//! use symbind_schema::{Field, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new("Rectangle")
//!     .field(Field::real("width"))
//!     .field(Field::real("height"))
//!     .field(Field::real("area").equation("width * height"))
//!     .constraint("width > 0")
//!     .constraint("height > 0")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.len(), 3);
//! assert_eq!(schema.constraints().len(), 2);
//! ```

use indexmap::IndexMap;
use std::sync::Arc;
use symbind_core::{
    Args, ConstraintId, FieldId, FieldSpec, FieldType, ForwardFn, RuleError, SchemaError,
    Value, ValueTransform,
};
use symbind_expr::{parse_expr, parse_relation, Expr, Relation};

use crate::graph::DependencyGraph;
use crate::schema::{Constraint, Rule, RuleKind, Schema};

// ── Sources ────────────────────────────────────────────────────────

/// An equation right-hand side, as text or as an already-built tree.
///
/// Text is parsed when the schema is built, so syntax errors surface as
/// [`SchemaError::Parse`] from [`SchemaBuilder::build`].
#[derive(Clone, Debug)]
pub enum ExprSource {
    /// Expression text, e.g. `"width * height"`.
    Text(String),
    /// A programmatically constructed expression.
    Parsed(Expr),
}

impl From<&str> for ExprSource {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ExprSource {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Expr> for ExprSource {
    fn from(e: Expr) -> Self {
        Self::Parsed(e)
    }
}

/// A constraint, as text or as an already-built [`Relation`].
#[derive(Clone, Debug)]
pub enum ConstraintSource {
    /// Relation text, e.g. `"a > 0"`.
    Text(String),
    /// A programmatically constructed relation.
    Parsed(Relation),
}

impl From<&str> for ConstraintSource {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ConstraintSource {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Relation> for ConstraintSource {
    fn from(r: Relation) -> Self {
        Self::Parsed(r)
    }
}

// ── Field ──────────────────────────────────────────────────────────

#[derive(Clone)]
enum Declared {
    Equation(ExprSource),
    Forward {
        params: Vec<String>,
        func: ForwardFn,
    },
}

/// Declaration of a single field.
///
/// A field without a rule (or marked with [`root`](Field::root)) is a
/// root: its value can only come from the caller or from solving
/// equations backwards.
#[derive(Clone)]
#[must_use]
pub struct Field {
    name: String,
    ty: FieldType,
    rule: Option<Declared>,
    transform: Option<ValueTransform>,
}

impl Field {
    /// A field of any type.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            rule: None,
            transform: None,
        }
    }

    /// A real-valued field.
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Real)
    }

    /// An integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// A text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// A boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Define the field as `self = expr`.
    pub fn equation(mut self, expr: impl Into<ExprSource>) -> Self {
        self.rule = Some(Declared::Equation(expr.into()));
        self
    }

    /// Define the field as the result of `func` over the named parameter
    /// fields. The function is only called once every parameter is known,
    /// and the rule is never inverted.
    pub fn forward<P, S, F>(mut self, params: P, func: F) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Args<'_>) -> Result<Value, RuleError> + Send + Sync + 'static,
    {
        self.rule = Some(Declared::Forward {
            params: params.into_iter().map(Into::into).collect(),
            func: Arc::new(func),
        });
        self
    }

    /// A zero-parameter forward rule: the field defaults to `value` when
    /// not given.
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default_with(move || value.clone())
    }

    /// A zero-parameter forward rule computing the default lazily.
    pub fn default_with<F>(mut self, func: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.rule = Some(Declared::Forward {
            params: Vec::new(),
            func: Arc::new(move |_: &Args<'_>| Ok(func())),
        });
        self
    }

    /// Mark the field as a pure root, dropping any rule declared so far.
    pub fn root(mut self) -> Self {
        self.rule = None;
        self
    }

    /// Apply `transform` to every value the engine computes for this field.
    pub fn transform(mut self, transform: ValueTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Round computed values to `places` decimal places.
    pub fn round_to(self, places: u32) -> Self {
        self.transform(ValueTransform::round_to(places))
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ── SchemaBuilder ──────────────────────────────────────────────────

/// Collects field and constraint declarations for one entity type.
#[derive(Clone)]
#[must_use]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
    constraints: Vec<ConstraintSource>,
}

impl SchemaBuilder {
    /// Start declaring the entity `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Declare a field. Declaration order is presentation order.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare several fields at once.
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Attach a constraint.
    pub fn constraint(mut self, constraint: impl Into<ConstraintSource>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    /// Compile the declarations into an immutable [`Schema`].
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found, checking in this order:
    /// missing or duplicate fields, equations, forward parameters,
    /// constraints, and finally forward-rule cycles.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields { entity: self.name });
        }

        let mut index: IndexMap<String, FieldId> = IndexMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), FieldId(i as u32)).is_some() {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }

        let specs: Vec<FieldSpec> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| FieldSpec {
                id: FieldId(i as u32),
                name: f.name.clone(),
                ty: f.ty,
                transform: f.transform.clone(),
                root: f.rule.is_none(),
            })
            .collect();

        let lookup = Lookup {
            index: &index,
            specs: &specs,
        };

        let mut rules = Vec::new();
        let mut rule_of = vec![None; specs.len()];
        for (spec, field) in specs.iter().zip(&self.fields) {
            let Some(declared) = &field.rule else {
                continue;
            };
            let kind = match declared {
                Declared::Equation(source) => {
                    let context = format!("equation for '{}'", spec.name);
                    lookup.require_numeric(&spec.name, &context)?;
                    let expr = match source {
                        ExprSource::Text(text) => parse_expr(text).map_err(|e| SchemaError::Parse {
                            context: context.clone(),
                            source: e,
                        })?,
                        ExprSource::Parsed(expr) => expr.clone(),
                    };
                    let mut operands = Vec::new();
                    for name in expr.variables() {
                        let id = lookup.require_numeric(&name, &context)?;
                        if let Some(Declared::Forward { .. }) = &self.fields[id.index()].rule {
                            return Err(SchemaError::ForwardTargetInEquation {
                                field: name,
                                equation: spec.name.clone(),
                            });
                        }
                        operands.push(id);
                    }
                    RuleKind::Equation { expr, operands }
                }
                Declared::Forward { params, func } => {
                    let mut ids = Vec::with_capacity(params.len());
                    for p in params {
                        let id = index.get(p).copied().ok_or_else(|| {
                            SchemaError::UnknownParameter {
                                field: spec.name.clone(),
                                parameter: p.clone(),
                            }
                        })?;
                        ids.push(id);
                    }
                    RuleKind::Forward {
                        params: ids,
                        param_names: params.clone(),
                        func: Arc::clone(func),
                    }
                }
            };
            rule_of[spec.id.index()] = Some(rules.len());
            rules.push(Rule {
                target: spec.id,
                kind,
            });
        }

        let mut constraints = Vec::with_capacity(self.constraints.len());
        for (i, source) in self.constraints.iter().enumerate() {
            let relation = match source {
                ConstraintSource::Text(text) => {
                    parse_relation(text).map_err(|e| SchemaError::Parse {
                        context: format!("constraint `{text}`"),
                        source: e,
                    })?
                }
                ConstraintSource::Parsed(r) => r.clone(),
            };
            let context = format!("constraint `{relation}`");
            let names = relation.variables();
            if names.is_empty() {
                return Err(SchemaError::MalformedConstraint {
                    constraint: relation.to_string(),
                    reason: "references no fields".to_string(),
                });
            }
            let mut fields = Vec::with_capacity(names.len());
            for name in &names {
                fields.push(lookup.require_numeric(name, &context)?);
            }
            constraints.push(Constraint {
                id: ConstraintId(i as u32),
                relation,
                fields,
            });
        }

        let graph = DependencyGraph::build(&specs, &rules);
        if let Some(cycle) = graph.forward_cycles().into_iter().next() {
            return Err(SchemaError::ForwardCycle {
                fields: cycle
                    .iter()
                    .map(|id| specs[id.index()].name.clone())
                    .collect(),
            });
        }

        tracing::debug!(
            entity = %self.name,
            fields = specs.len(),
            rules = rules.len(),
            constraints = constraints.len(),
            "compiled schema"
        );

        Ok(Schema {
            name: self.name,
            fields: specs,
            index,
            rules,
            rule_of,
            constraints,
            graph,
        })
    }
}

/// Name resolution shared by equation and constraint checks.
struct Lookup<'a> {
    index: &'a IndexMap<String, FieldId>,
    specs: &'a [FieldSpec],
}

impl Lookup<'_> {
    fn require_numeric(&self, name: &str, context: &str) -> Result<FieldId, SchemaError> {
        let id = self
            .index
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownField {
                name: name.to_string(),
                context: context.to_string(),
            })?;
        let ty = self.specs[id.index()].ty;
        if !ty.is_numeric() {
            return Err(SchemaError::NonNumericField {
                name: name.to_string(),
                ty,
                context: context.to_string(),
            });
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum() -> SchemaBuilder {
        SchemaBuilder::new("Sum")
            .field(Field::real("a"))
            .field(Field::real("b"))
            .field(Field::real("c").equation("a + b"))
    }

    #[test]
    fn roots_and_rules() {
        let schema = sum().build().unwrap();
        assert_eq!(schema.name(), "Sum");
        assert!(schema.field_by_name("a").unwrap().root);
        assert!(!schema.field_by_name("c").unwrap().root);
        let rule = schema.rule_for(FieldId(2)).unwrap();
        assert!(rule.is_invertible());
        assert_eq!(rule.inputs(), &[FieldId(0), FieldId(1)]);
        assert_eq!(schema.describe_rule(rule), "c = a + b");
    }

    #[test]
    fn root_marker_drops_rule() {
        let schema = SchemaBuilder::new("R")
            .field(Field::real("x").equation("1 + 1").root())
            .build()
            .unwrap();
        assert!(schema.rules().is_empty());
        assert!(schema.fields()[0].root);
    }

    #[test]
    fn empty_schema_rejected() {
        assert_eq!(
            SchemaBuilder::new("Nothing").build().unwrap_err(),
            SchemaError::NoFields {
                entity: "Nothing".into()
            }
        );
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = sum().field(Field::real("a")).build().unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField { name: "a".into() });
    }

    #[test]
    fn unknown_field_in_equation() {
        let err = SchemaBuilder::new("E")
            .field(Field::real("a"))
            .field(Field::real("b").equation("a * z"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownField {
                name: "z".into(),
                context: "equation for 'b'".into()
            }
        );
    }

    #[test]
    fn parse_error_carries_context() {
        let err = SchemaBuilder::new("E")
            .field(Field::real("a"))
            .field(Field::real("b").equation("a *"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Parse { ref context, .. } if context == "equation for 'b'"));
    }

    #[test]
    fn programmatic_expressions_accepted() {
        let schema = SchemaBuilder::new("P")
            .field(Field::real("a"))
            .field(Field::real("b").equation(Expr::var("a").pow(2.0)))
            .constraint(Expr::var("a").gt(0.0))
            .build()
            .unwrap();
        assert_eq!(schema.constraints()[0].to_string(), "a > 0");
    }
}
