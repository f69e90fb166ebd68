//! Per-resolution metrics.
//!
//! [`ResolutionMetrics`] records how much work the most recent
//! construct/update/replace on an instance took, for profiling schemas
//! whose equations are expensive to solve.

/// Timing and candidate counts from a single resolution.
///
/// All durations are in microseconds. An update that turned out to be a
/// no-op leaves the previous metrics in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionMetrics {
    /// Wall-clock time for the whole resolution, in microseconds.
    pub total_us: u64,
    /// Time spent in the equation solver, in microseconds.
    pub solve_us: u64,
    /// Time spent filtering candidates by constraints, in microseconds.
    pub filter_us: u64,
    /// Time spent evaluating forward rules, in microseconds.
    pub forward_us: u64,
    /// Time spent in final validation, in microseconds.
    pub validate_us: u64,
    /// Unknowns handed to the solver.
    pub solver_unknowns: usize,
    /// Candidates returned by the solver.
    pub raw_candidates: usize,
    /// Candidates left after dropping values outside a field's domain.
    pub domain_candidates: usize,
    /// Candidates left after constraint filtering (0 or 1 on success).
    pub surviving_candidates: usize,
    /// Scans made by the forward evaluator.
    pub forward_passes: usize,
    /// Forward rules evaluated.
    pub forward_evaluations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = ResolutionMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.solve_us, 0);
        assert_eq!(m.raw_candidates, 0);
        assert_eq!(m.forward_passes, 0);
    }
}
