//! Constraint filter: pick the one candidate every constraint accepts.

use symbind_core::{Assignment, CandidateRejection, ResolutionError, Value};
use tracing::{debug, trace};

use crate::state::Working;

/// Reduce `candidates` to exactly one.
///
/// A lone candidate is accepted as is; constraints are still checked on
/// it later by validation. With several, each is checked against every
/// constraint (merged with the known values). Constraints that mention a
/// field with no value yet, such as a forward target, are skipped here.
pub(crate) fn select(
    working: &Working<'_>,
    mut candidates: Vec<Assignment>,
) -> Result<Assignment, ResolutionError> {
    if candidates.len() <= 1 {
        return candidates
            .pop()
            .ok_or_else(|| ResolutionError::InconsistentInputs {
                reason: "the equations have no real solution for the given values".into(),
            });
    }

    let schema = working.schema();
    let total = candidates.len();
    let mut survivors = Vec::new();
    let mut rejected = Vec::new();
    for candidate in candidates {
        let env = |name: &str| {
            candidate
                .get(name)
                .and_then(Value::as_f64)
                .or_else(|| working.real(name))
        };
        let failed: Vec<String> = schema
            .constraints()
            .iter()
            .filter(|c| matches!(c.relation.holds(&env), Ok(false)))
            .map(ToString::to_string)
            .collect();
        if failed.is_empty() {
            survivors.push(candidate);
        } else {
            trace!(?failed, "constraint filter rejected candidate");
            rejected.push(CandidateRejection { candidate, failed });
        }
    }
    debug!(candidates = total, survivors = survivors.len(), "constraint filter");

    match survivors.len() {
        0 => Err(ResolutionError::ConstraintViolation { rejected }),
        1 => Ok(survivors.remove(0)),
        _ => Err(ResolutionError::AmbiguousSolution {
            candidates: survivors,
        }),
    }
}
