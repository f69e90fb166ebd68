//! Equation solving for symbind.
//!
//! The resolution engine treats solving as a black box: it hands an
//! [`EquationSystem`] (unknowns, equations, pinned known values) to an
//! [`EquationSolver`] and gets back every real [`Candidate`] assignment
//! of the unknowns, or a [`SolverError`] explaining why none can be
//! produced.
//!
//! [`NewtonSolver`] is the default implementation. It pins the knowns,
//! checks fully-known equations for contradictions, runs a structural
//! analysis to find unknowns the equations cannot determine, splits the
//! rest into strongly connected blocks, and enumerates the real roots of
//! each block with the `constraint-solver` crate's globalized Newton
//! iteration from a deterministic set of start points.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod newton;
mod structure;
pub mod system;

pub use config::SolverConfig;
pub use error::SolverError;
pub use newton::NewtonSolver;
pub use system::{Candidate, Equation, EquationSystem};

/// A capability that solves simultaneous equations over named unknowns.
///
/// Implementations must be deterministic: the same system always yields
/// the same candidates in the same order.
pub trait EquationSolver: Send + Sync {
    /// Enumerate the real solutions of `system`.
    ///
    /// An empty vector means the equations have no real solution with the
    /// given knowns.
    fn solve(&self, system: &EquationSystem) -> Result<Vec<Candidate>, SolverError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "solver"
    }
}
