//! Equation stage: solve every equation rule simultaneously for the
//! equation fields that are not yet known.

use symbind_core::{Assignment, ResolutionError};
use symbind_expr::Expr;
use symbind_solver::{Candidate, EquationSolver, EquationSystem, SolverError};
use tracing::{debug, trace};

use crate::metrics::ResolutionMetrics;
use crate::state::Working;

/// Build the combined system, solve it, and keep the candidates whose
/// every value lies in its field's domain. Returned values are already
/// transformed.
pub(crate) fn solve(
    solver: &dyn EquationSolver,
    working: &Working<'_>,
    metrics: &mut ResolutionMetrics,
) -> Result<Vec<Assignment>, ResolutionError> {
    let schema = working.schema();
    let mut system = EquationSystem::new();
    for id in schema.graph().equation_fields().iter() {
        let name = schema.name_of(id);
        match working.get(id).and_then(|v| v.as_f64()) {
            Some(x) => system.add_known(name, x),
            None => system.add_unknown(name),
        }
    }
    for rule in schema.equations() {
        if let Some(expr) = rule.expr() {
            system.add_equation(
                schema.describe_rule(rule),
                Expr::var(schema.name_of(rule.target)),
                expr.clone(),
            );
        }
    }
    if system.equations().is_empty() {
        return Ok(vec![Assignment::new()]);
    }
    metrics.solver_unknowns = system.unknowns().len();

    let raw = solver
        .solve(&system)
        .map_err(|e| solver_failure(working, e))?;
    metrics.raw_candidates = raw.len();
    debug!(
        solver = solver.name(),
        unknowns = system.unknowns().len(),
        candidates = raw.len(),
        "equation stage solved"
    );

    let in_domain: Vec<Assignment> = raw
        .iter()
        .filter_map(|candidate| to_assignment(working, candidate))
        .collect();
    metrics.domain_candidates = in_domain.len();

    if in_domain.is_empty() {
        let reason = if raw.is_empty() {
            "the equations have no real solution for the given values".to_string()
        } else {
            format!(
                "none of the {} solution(s) lies in the fields' declared domains",
                raw.len()
            )
        };
        return Err(ResolutionError::InconsistentInputs { reason });
    }
    Ok(in_domain)
}

/// Convert a numeric candidate into typed, transformed values. `None`
/// when any value is outside its field's domain.
fn to_assignment(working: &Working<'_>, candidate: &Candidate) -> Option<Assignment> {
    let schema = working.schema();
    let mut out = Assignment::new();
    for (name, &x) in candidate {
        let Some(spec) = schema.field_by_name(name) else {
            continue;
        };
        let Some(value) = spec.ty.from_f64(x) else {
            trace!(field = %name, value = x, ty = %spec.ty, "candidate outside field domain");
            return None;
        };
        out.insert(name.clone(), spec.transform(value));
    }
    Some(out)
}

fn solver_failure(working: &Working<'_>, error: SolverError) -> ResolutionError {
    match error {
        SolverError::Underdetermined { unresolved } => ResolutionError::InsufficientInputs {
            provided: working.schema().names(working.known()),
            missing: unresolved,
        },
        SolverError::Contradiction { equation } => ResolutionError::InconsistentInputs {
            reason: format!("the given values contradict `{equation}`"),
        },
        other @ (SolverError::TooManyCandidates { .. }
        | SolverError::InvalidConfig { .. }
        | SolverError::Numeric { .. }) => {
            ResolutionError::SolverFailed {
                reason: other.to_string(),
            }
        }
    }
}
