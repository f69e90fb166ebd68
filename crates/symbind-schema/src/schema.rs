//! The compiled, immutable [`Schema`].

use indexmap::IndexMap;
use std::fmt;
use symbind_core::{ConstraintId, FieldId, FieldSet, FieldSpec, ForwardFn};
use symbind_expr::{Expr, Relation};

use crate::graph::DependencyGraph;

/// How a rule computes its target.
#[derive(Clone)]
pub enum RuleKind {
    /// `target = expr`, solvable in any direction.
    Equation {
        /// Right-hand side over other field names.
        expr: Expr,
        /// Fields referenced by `expr`, in first-appearance order.
        operands: Vec<FieldId>,
    },
    /// `target = func(params)`, evaluated forward only.
    Forward {
        /// Parameter fields, in declared order.
        params: Vec<FieldId>,
        /// Parameter names, parallel to `params`.
        param_names: Vec<String>,
        /// The function body.
        func: ForwardFn,
    },
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equation { expr, operands } => f
                .debug_struct("Equation")
                .field("expr", &expr.to_string())
                .field("operands", operands)
                .finish(),
            Self::Forward { param_names, .. } => f
                .debug_struct("Forward")
                .field("params", param_names)
                .finish_non_exhaustive(),
        }
    }
}

/// A rule binding one target field to others.
#[derive(Clone, Debug)]
pub struct Rule {
    /// The field this rule defines.
    pub target: FieldId,
    /// Equation or forward function.
    pub kind: RuleKind,
}

impl Rule {
    /// Equation rules can be solved for any of their fields; forward
    /// rules never can.
    pub fn is_invertible(&self) -> bool {
        matches!(self.kind, RuleKind::Equation { .. })
    }

    /// Fields the rule reads (operands or parameters).
    pub fn inputs(&self) -> &[FieldId] {
        match &self.kind {
            RuleKind::Equation { operands, .. } => operands,
            RuleKind::Forward { params, .. } => params,
        }
    }

    /// The equation's right-hand side, if this is an equation rule.
    pub fn expr(&self) -> Option<&Expr> {
        match &self.kind {
            RuleKind::Equation { expr, .. } => Some(expr),
            RuleKind::Forward { .. } => None,
        }
    }
}

/// A relational constraint over numeric fields.
#[derive(Clone, Debug)]
pub struct Constraint {
    /// Position in declaration order.
    pub id: ConstraintId,
    /// The relation.
    pub relation: Relation,
    /// Fields the relation references.
    pub fields: Vec<FieldId>,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relation)
    }
}

/// Compiled description of an entity type.
///
/// Built by [`SchemaBuilder::build`](crate::SchemaBuilder::build) and
/// shared read-only (usually behind an `Arc`) by every instance of the
/// type.
#[derive(Debug)]
pub struct Schema {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) index: IndexMap<String, FieldId>,
    pub(crate) rules: Vec<Rule>,
    /// `rule_of[field] = index into rules`.
    pub(crate) rule_of: Vec<Option<usize>>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) graph: DependencyGraph,
}

impl Schema {
    /// Entity type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false` for a compiled schema; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Descriptor for `id`.
    pub fn field(&self, id: FieldId) -> Option<&FieldSpec> {
        self.fields.get(id.index())
    }

    /// Look up a field id by name.
    pub fn id_of(&self, name: &str) -> Option<FieldId> {
        self.index.get(name).copied()
    }

    /// Look up a descriptor by name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldSpec> {
        self.id_of(name).and_then(|id| self.field(id))
    }

    /// Name of `id`, or `"?"` for an id from another schema.
    pub fn name_of(&self, id: FieldId) -> &str {
        self.field(id).map_or("?", |f| f.name.as_str())
    }

    /// Names of every member of `set`, in declaration order.
    pub fn names(&self, set: &FieldSet) -> Vec<String> {
        set.iter().map(|id| self.name_of(id).to_string()).collect()
    }

    /// All rules, in target declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule targeting `field`, if it is derived.
    pub fn rule_for(&self, field: FieldId) -> Option<&Rule> {
        self.rule_of
            .get(field.index())
            .copied()
            .flatten()
            .and_then(|i| self.rules.get(i))
    }

    /// Equation rules only.
    pub fn equations(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_invertible())
    }

    /// Forward rules only.
    pub fn forward_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| !r.is_invertible())
    }

    /// Constraints in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Fields with no rule.
    pub fn roots(&self) -> FieldSet {
        self.fields.iter().filter(|f| f.root).map(|f| f.id).collect()
    }

    /// The dependency graph derived at compile time.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Render a rule for diagnostics: `c = a + b` for equations,
    /// `full = <fn(first, last)>` for forward rules.
    pub fn describe_rule(&self, rule: &Rule) -> String {
        let target = self.name_of(rule.target);
        match &rule.kind {
            RuleKind::Equation { expr, .. } => format!("{target} = {expr}"),
            RuleKind::Forward { param_names, .. } => {
                format!("{target} = <fn({})>", param_names.join(", "))
            }
        }
    }
}
