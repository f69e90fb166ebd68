//! Expression and relation language for symbind.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! algebraic [`Expr`] tree that equation rules are written in, the
//! [`Relation`] type used by constraints, a text parser for both, numeric
//! evaluation, and the symbolic derivative the solver uses to build
//! Jacobians.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod ast;
pub mod calculus;
pub mod eval;
pub mod parser;

pub use ast::{BinOp, Expr, Func, RelOp, Relation};
pub use eval::EvalError;
pub use parser::{parse_expr, parse_relation, ParseError};
