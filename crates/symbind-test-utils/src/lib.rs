//! Test utilities for symbind development.
//!
//! Provides fixture schemas ([`fixtures`]), a [`CountingSolver`] that
//! records how often the engine reaches the equation solver, and
//! [`init_tracing`] for seeing engine logs in failing tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use symbind_solver::{Candidate, EquationSolver, EquationSystem, NewtonSolver, SolverError};

/// Install a `tracing` subscriber honouring `RUST_LOG`, writing through
/// the test harness's captured output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wraps [`NewtonSolver`] and counts calls to [`solve`](EquationSolver::solve).
///
/// The counter is shared, so a clone handed to a resolver can be
/// inspected through the original.
#[derive(Clone, Default)]
pub struct CountingSolver {
    inner: NewtonSolver,
    calls: Arc<AtomicUsize>,
}

impl CountingSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `solve` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EquationSolver for CountingSolver {
    fn solve(&self, system: &EquationSystem) -> Result<Vec<Candidate>, SolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.solve(system)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// A solver that always returns the same candidates, for driving the
/// constraint filter and validator with hand-picked input.
#[derive(Clone, Debug, Default)]
pub struct FixedSolver {
    pub candidates: Vec<Candidate>,
}

impl FixedSolver {
    /// Candidates built from `(name, value)` rows.
    pub fn new(rows: &[&[(&str, f64)]]) -> Self {
        Self {
            candidates: rows
                .iter()
                .map(|row| row.iter().map(|(k, v)| (k.to_string(), *v)).collect())
                .collect(),
        }
    }
}

impl EquationSolver for FixedSolver {
    fn solve(&self, _system: &EquationSystem) -> Result<Vec<Candidate>, SolverError> {
        Ok(self.candidates.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
