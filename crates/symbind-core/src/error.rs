//! Error types for symbind, organized by phase: schema compilation
//! ([`SchemaError`]) and per-instance resolution ([`ResolutionError`]).

use crate::field::FieldType;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use symbind_expr::ParseError;

/// A full or partial assignment of field names to values, in schema
/// declaration order.
pub type Assignment = IndexMap<String, Value>;

// ── Schema errors ──────────────────────────────────────────────────

/// Errors detected while compiling field declarations into a schema.
///
/// These are fatal for the entity type: it cannot be resolved until the
/// declarations are fixed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The entity declares no fields.
    #[error("entity '{entity}' declares no fields")]
    NoFields {
        /// Entity name.
        entity: String,
    },
    /// Two fields share a name.
    #[error("field '{name}' is declared more than once")]
    DuplicateField {
        /// The repeated name.
        name: String,
    },
    /// An equation or constraint failed to parse.
    #[error("cannot parse {context}: {source}")]
    Parse {
        /// Which declaration failed, e.g. `equation for 'c'`.
        context: String,
        /// The parser diagnostic.
        #[source]
        source: ParseError,
    },
    /// An equation or constraint references an undeclared field.
    #[error("{context} references unknown field '{name}'")]
    UnknownField {
        /// The undeclared name.
        name: String,
        /// Which declaration referenced it.
        context: String,
    },
    /// A forward function lists an undeclared parameter.
    #[error("forward rule for '{field}' lists unknown parameter '{parameter}'")]
    UnknownParameter {
        /// Target of the forward rule.
        field: String,
        /// The undeclared parameter.
        parameter: String,
    },
    /// An equation or constraint references a text or boolean field.
    #[error("{context} references non-numeric field '{name}' ({ty})")]
    NonNumericField {
        /// The offending field.
        name: String,
        /// Its declared type.
        ty: FieldType,
        /// Which declaration referenced it.
        context: String,
    },
    /// A forward-rule target appears in an equation, where the solver
    /// could never see its value.
    #[error("field '{field}' is computed by a forward rule and cannot appear in the equation for '{equation}'")]
    ForwardTargetInEquation {
        /// The forward-rule target.
        field: String,
        /// Target of the equation that references it.
        equation: String,
    },
    /// Forward rules depend on each other in a cycle.
    #[error("forward rules form a cycle through [{}]", .fields.join(", "))]
    ForwardCycle {
        /// Fields on the cycle, in declaration order.
        fields: Vec<String>,
    },
    /// A constraint that cannot filter anything.
    #[error("malformed constraint `{constraint}`: {reason}")]
    MalformedConstraint {
        /// The constraint as written.
        constraint: String,
        /// What is wrong with it.
        reason: String,
    },
}

// ── Resolution diagnostics ─────────────────────────────────────────

/// A candidate solution rejected by the constraint filter, with the
/// constraints it failed.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateRejection {
    /// The candidate's values for the fields the solver computed.
    pub candidate: Assignment,
    /// Text of every constraint the candidate failed.
    pub failed: Vec<String>,
}

impl fmt::Display for CandidateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} fails {}",
            join_assignment(&self.candidate),
            self.failed
                .iter()
                .map(|c| format!("`{c}`"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// A forward-rule target that could not be evaluated, with the parameters
/// it was still waiting for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StalledField {
    /// The unresolved field.
    pub field: String,
    /// Parameters that never became known.
    pub missing: Vec<String>,
}

impl fmt::Display for StalledField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing.is_empty() {
            write!(f, "'{}'", self.field)
        } else {
            write!(f, "'{}' (needs {})", self.field, self.missing.join(", "))
        }
    }
}

/// One failed check from the final validation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationFailure {
    /// The rule or constraint checked, e.g. `c = a + b`,
    /// `full = <fn(first, last)>` or `constraint a > 0`.
    pub subject: String,
    /// What the rule computes (or `true` for constraints).
    pub expected: String,
    /// What the instance holds.
    pub actual: String,
    /// `|expected - actual|` when both sides are numeric.
    pub difference: Option<f64>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.subject, self.expected, self.actual
        )?;
        if let Some(d) = self.difference {
            write!(f, " (difference {d})")?;
        }
        Ok(())
    }
}

// ── Resolution errors ──────────────────────────────────────────────

/// Errors from constructing, updating or replacing an instance.
///
/// Every resolution is all-or-nothing: when one of these is returned no
/// instance was produced and no existing instance was modified.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    /// Too few independent givens to fix every equation field.
    #[error(
        "insufficient inputs: cannot determine [{}] from [{}]",
        .missing.join(", "),
        .provided.join(", ")
    )]
    InsufficientInputs {
        /// Fields that were known going in.
        provided: Vec<String>,
        /// Fields the equations leave undetermined.
        missing: Vec<String>,
    },
    /// The givens contradict the equations; no solution exists.
    #[error("inconsistent inputs: {reason}")]
    InconsistentInputs {
        /// What failed to hold.
        reason: String,
    },
    /// More than one candidate survived constraint filtering.
    #[error(
        "ambiguous solution: {} candidates satisfy every constraint: {}",
        .candidates.len(),
        join_candidates(.candidates)
    )]
    AmbiguousSolution {
        /// The surviving candidates.
        candidates: Vec<Assignment>,
    },
    /// Every candidate failed at least one constraint.
    #[error(
        "constraint violation: no candidate satisfies every constraint; {}",
        join_display(.rejected, "; ")
    )]
    ConstraintViolation {
        /// Per-candidate diagnostics.
        rejected: Vec<CandidateRejection>,
    },
    /// Forward evaluation stalled with targets still unknown.
    #[error(
        "cannot resolve forward-only field(s) {}",
        join_display(.stalled, ", ")
    )]
    UnresolvableField {
        /// Each stalled field and what it was waiting for.
        stalled: Vec<StalledField>,
    },
    /// The final state breaks a rule or constraint.
    #[error(
        "validation failed for {} check(s): {}",
        .failures.len(),
        join_display(.failures, "; ")
    )]
    ValidationFailed {
        /// Every failed check.
        failures: Vec<ValidationFailure>,
    },
    /// A given or changed field is not declared by the schema.
    #[error("unknown field '{name}'")]
    UnknownField {
        /// The undeclared name.
        name: String,
    },
    /// A given value does not fit the field's semantic type.
    #[error("field '{field}' expects {expected}, got {} value {found}", .found.kind())]
    TypeMismatch {
        /// The field.
        field: String,
        /// Its declared type.
        expected: FieldType,
        /// The value supplied.
        found: Value,
    },
    /// A forward function failed or returned a value of the wrong type.
    #[error("forward rule for '{field}' failed: {reason}")]
    ForwardFailed {
        /// Target of the forward rule.
        field: String,
        /// The function's error or the type problem.
        reason: String,
    },
    /// The equation solver gave up, e.g. on an unbounded family of roots.
    #[error("equation solver failed: {reason}")]
    SolverFailed {
        /// The solver's explanation.
        reason: String,
    },
    /// An instance was handed to a resolver for a different entity type.
    #[error("a resolver for '{expected}' cannot update an instance of '{found}'")]
    SchemaMismatch {
        /// Entity type of the resolver.
        expected: String,
        /// Entity type of the instance.
        found: String,
    },
}

fn join_display<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

fn join_assignment(a: &Assignment) -> String {
    a.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_candidates(candidates: &[Assignment]) -> String {
    candidates
        .iter()
        .map(|c| format!("{{{}}}", join_assignment(c)))
        .collect::<Vec<_>>()
        .join(", ")
}
