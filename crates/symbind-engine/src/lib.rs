//! Resolution engine for symbind.
//!
//! A [`Resolver`] turns a partial set of field values into a complete,
//! validated [`Instance`] of a compiled schema. Each resolution runs the
//! same pipeline:
//!
//! 1. **Equation stage**: every equation rule is handed to an
//!    [`EquationSolver`](symbind_solver::EquationSolver) as one
//!    simultaneous system; candidates outside a field's domain are
//!    dropped and transforms applied.
//! 2. **Constraint filter**: several candidates are narrowed to one by
//!    the schema's constraints, or the call fails as ambiguous or
//!    violating.
//! 3. **Forward evaluation**: forward-only rules run to a fixed point.
//! 4. **Validation**: every rule and constraint is re-checked against
//!    the final state.
//!
//! Updates reuse the pipeline with a planned set of knowns; see
//! [`Resolver::update`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
mod constraints;
mod equations;
mod forward;
pub mod instance;
pub mod metrics;
pub mod resolver;
mod state;
mod validate;

pub use config::{ConfigError, ResolverConfig};
pub use instance::Instance;
pub use metrics::ResolutionMetrics;
pub use resolver::Resolver;
