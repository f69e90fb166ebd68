//! Core types for the symbind resolution engine.
//!
//! Every other symbind crate builds on the vocabulary defined here:
//! field identifiers and the [`FieldSet`] bitset, the [`Value`] a field
//! holds and its declared [`FieldType`], value transforms, the signature
//! of forward functions, and the [`SchemaError`] / [`ResolutionError`]
//! taxonomy surfaced to callers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;
pub mod rule;
pub mod value;

pub use error::{
    Assignment, CandidateRejection, ResolutionError, SchemaError, StalledField,
    ValidationFailure,
};
pub use field::{FieldSet, FieldSpec, FieldType, ValueTransform};
pub use id::{ConstraintId, FieldId};
pub use rule::{Args, ForwardFn, RuleError};
pub use value::{Tolerance, Value};
