//! Forward evaluator: fixed-point evaluation of forward-only rules.

use symbind_core::{Args, FieldId, ResolutionError, StalledField, Value};
use symbind_schema::{Rule, RuleKind, Schema};
use tracing::trace;

use crate::metrics::ResolutionMetrics;
use crate::state::Working;

/// Evaluate every forward rule whose target is unknown and whose
/// parameters are known, repeating until a scan makes no progress.
///
/// Afterwards any forward rule still missing parameters is reported as
/// [`ResolutionError::UnresolvableField`], including rules whose target
/// was given: such a value could never be checked against its inputs.
pub(crate) fn evaluate(
    working: &mut Working<'_>,
    metrics: &mut ResolutionMetrics,
) -> Result<(), ResolutionError> {
    let schema = working.schema();
    loop {
        metrics.forward_passes += 1;
        let mut progressed = false;
        for rule in schema.forward_rules() {
            if working.is_known(rule.target)
                || !schema.graph().is_ready(rule.target, working.known())
            {
                continue;
            }
            let raw = run(schema, rule, |id| working.get(id))?;
            let value = match schema.field(rule.target) {
                Some(spec) => spec.transform(raw),
                None => raw,
            };
            trace!(field = schema.name_of(rule.target), %value, "evaluated forward rule");
            working.set(rule.target, value);
            metrics.forward_evaluations += 1;
            progressed = true;
        }
        if !progressed {
            break;
        }
    }

    let stalled: Vec<StalledField> = schema
        .forward_rules()
        .filter_map(|rule| {
            let missing = schema
                .graph()
                .missing_parameters(rule.target, working.known());
            (!missing.is_empty()).then(|| StalledField {
                field: schema.name_of(rule.target).to_string(),
                missing: missing
                    .into_iter()
                    .map(|id| schema.name_of(id).to_string())
                    .collect(),
            })
        })
        .collect();
    if stalled.is_empty() {
        Ok(())
    } else {
        Err(ResolutionError::UnresolvableField { stalled })
    }
}

/// Call a forward rule's function with its parameters looked up through
/// `lookup`, and check the result against the target's type. The result
/// is not transformed.
pub(crate) fn run<'v, L>(schema: &Schema, rule: &Rule, lookup: L) -> Result<Value, ResolutionError>
where
    L: Fn(FieldId) -> Option<&'v Value>,
{
    let target = schema.name_of(rule.target);
    let RuleKind::Forward {
        params,
        param_names,
        func,
    } = &rule.kind
    else {
        return Err(ResolutionError::ForwardFailed {
            field: target.to_string(),
            reason: "not a forward rule".into(),
        });
    };

    let mut values = Vec::with_capacity(params.len());
    for (id, name) in params.iter().zip(param_names) {
        match lookup(*id) {
            Some(v) => values.push(v.clone()),
            None => {
                return Err(ResolutionError::ForwardFailed {
                    field: target.to_string(),
                    reason: format!("parameter '{name}' has no value"),
                })
            }
        }
    }

    let result = func(&Args::new(param_names, &values)).map_err(|e| {
        ResolutionError::ForwardFailed {
            field: target.to_string(),
            reason: e.message().to_string(),
        }
    })?;
    let Some(spec) = schema.field(rule.target) else {
        return Ok(result);
    };
    spec.ty
        .coerce(result)
        .map_err(|found| ResolutionError::ForwardFailed {
            field: target.to_string(),
            reason: format!("returned {} value {found}, expected {}", found.kind(), spec.ty),
        })
}
