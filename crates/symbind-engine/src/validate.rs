//! Final-state validator: the single gate every resolution passes
//! through before its result is published.

use symbind_core::{FieldSpec, ResolutionError, Tolerance, ValidationFailure, Value};
use symbind_schema::{RuleKind, Schema};

use crate::forward;

/// Re-check every rule and constraint against `values` (one per field,
/// in declaration order), collecting every failure.
///
/// A rule passes when its recomputed result, after the target's
/// transform, matches the recorded value. The untransformed result is
/// also accepted so that a given target value is not required to be
/// pre-rounded. Zero-parameter forward rules only supply defaults and
/// are not checked.
pub(crate) fn check(
    schema: &Schema,
    values: &[Value],
    tolerance: &Tolerance,
) -> Result<(), ResolutionError> {
    let env = |name: &str| {
        schema
            .id_of(name)
            .and_then(|id| values.get(id.index()))
            .and_then(Value::as_f64)
    };
    let mut failures = Vec::new();

    for rule in schema.rules() {
        if !rule.is_invertible() && rule.inputs().is_empty() {
            continue;
        }
        let (Some(spec), Some(actual)) = (schema.field(rule.target), values.get(rule.target.index()))
        else {
            continue;
        };
        let subject = schema.describe_rule(rule);
        let recomputed = match &rule.kind {
            RuleKind::Equation { expr, .. } => match expr.eval(&env) {
                Ok(x) => spec.ty.from_f64(x).ok_or_else(|| format!("{x}")),
                Err(e) => Err(e.to_string()),
            },
            RuleKind::Forward { .. } => {
                forward::run(schema, rule, |id| values.get(id.index())).map_err(|e| e.to_string())
            }
        };
        match recomputed {
            Ok(raw) => {
                if let Some(failure) = compare(spec, subject, raw, actual, tolerance) {
                    failures.push(failure);
                }
            }
            Err(expected) => failures.push(ValidationFailure {
                subject,
                expected,
                actual: actual.to_string(),
                difference: None,
            }),
        }
    }

    for constraint in schema.constraints() {
        let actual = match constraint.relation.holds(&env) {
            Ok(true) => continue,
            Ok(false) => "false".to_string(),
            Err(e) => e.to_string(),
        };
        failures.push(ValidationFailure {
            subject: format!("constraint `{constraint}`"),
            expected: "true".into(),
            actual,
            difference: None,
        });
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ResolutionError::ValidationFailed { failures })
    }
}

fn compare(
    spec: &FieldSpec,
    subject: String,
    raw: Value,
    actual: &Value,
    tolerance: &Tolerance,
) -> Option<ValidationFailure> {
    let transformed = spec.transform(raw.clone());
    if spec.ty.values_match(&transformed, actual, tolerance)
        || spec.ty.values_match(&raw, actual, tolerance)
    {
        return None;
    }
    let difference = match (transformed.as_f64(), actual.as_f64()) {
        (Some(e), Some(a)) => Some((e - a).abs()),
        _ => None,
    };
    Some(ValidationFailure {
        subject,
        expected: transformed.to_string(),
        actual: actual.to_string(),
        difference,
    })
}
