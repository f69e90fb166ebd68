//! symbind: declare relationships between an entity's fields once, then
//! resolve them in whichever direction the known values allow.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all symbind sub-crates. For most users, adding `symbind` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use symbind::prelude::*;
//!
//! let schema = SchemaBuilder::new("Temperature")
//!     .field(Field::real("celsius"))
//!     .field(Field::real("fahrenheit").equation("celsius * 9 / 5 + 32"))
//!     .build()
//!     .unwrap();
//! let resolver = Resolver::new(schema);
//!
//! // Forward: the equation as written.
//! let boiling = resolver.construct([("celsius", 100.0)]).unwrap();
//! assert_eq!(boiling.real("fahrenheit"), Some(212.0));
//!
//! // Inverse: the same equation, solved for the root.
//! let mut t = resolver.construct([("fahrenheit", 212.0)]).unwrap();
//! assert_eq!(t.real("celsius"), Some(100.0));
//!
//! // Updates propagate in either direction.
//! t.set("fahrenheit", 32.0).unwrap();
//! assert_eq!(t.real("celsius"), Some(0.0));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `symbind-core` | Values, field types, IDs, errors |
//! | [`expr`] | `symbind-expr` | Expression AST, parser, evaluation, derivatives |
//! | [`schema`] | `symbind-schema` | Schema builder, compiled rules, dependency graph |
//! | [`solver`] | `symbind-solver` | The equation-solver seam and its Newton implementation |
//! | [`engine`] | `symbind-engine` | Resolver, instances, config and metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, IDs and errors (`symbind-core`).
///
/// Contains [`types::Value`], [`types::FieldType`], and the error enums
/// [`types::SchemaError`] and [`types::ResolutionError`].
pub use symbind_core as types;

/// Symbolic expressions (`symbind-expr`).
///
/// [`expr::parse_expr`] and [`expr::parse_relation`] turn source text into
/// [`expr::Expr`] and [`expr::Relation`] trees.
pub use symbind_expr as expr;

/// Entity declaration and compilation (`symbind-schema`).
///
/// Declare fields with [`schema::SchemaBuilder`], or implement
/// [`schema::Entity`] to compile once through the global registry.
pub use symbind_schema as schema;

/// Equation solving (`symbind-solver`).
///
/// The [`solver::EquationSolver`] trait is the extension point for
/// replacing the bundled [`solver::NewtonSolver`].
pub use symbind_solver as solver;

/// Resolution engine (`symbind-engine`).
///
/// [`engine::Resolver`] turns givens into fully resolved
/// [`engine::Instance`]s and applies updates to them.
pub use symbind_engine as engine;

/// Common imports for typical symbind usage.
///
/// ```rust
/// use symbind::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use symbind_core::{Assignment, FieldType, RuleError, Tolerance, Value, ValueTransform};

    // Errors
    pub use symbind_core::{ResolutionError, SchemaError};

    // Schema
    pub use symbind_schema::{Entity, Field, Schema, SchemaBuilder};

    // Solver
    pub use symbind_solver::{EquationSolver, NewtonSolver, SolverConfig};

    // Engine
    pub use symbind_engine::{Instance, ResolutionMetrics, Resolver, ResolverConfig};
}
