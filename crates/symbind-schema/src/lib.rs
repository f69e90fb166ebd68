//! Rule compilation for symbind.
//!
//! Field declarations are written once per entity type with
//! [`SchemaBuilder`] and compiled into an immutable [`Schema`]. Compilation
//! checks every name an equation, constraint or forward function refers
//! to, rejects forward-rule cycles, and derives the [`DependencyGraph`]
//! the engine uses for readiness checks and update planning. Compiled
//! schemas are shared through a [`SchemaRegistry`] for the lifetime of
//! the process.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod graph;
pub mod registry;
pub mod schema;

pub use builder::{ConstraintSource, ExprSource, Field, SchemaBuilder};
pub use graph::DependencyGraph;
pub use registry::{Entity, SchemaRegistry};
pub use schema::{Constraint, Rule, RuleKind, Schema};
