//! Resolver configuration and validation.

use serde::{Deserialize, Serialize};
use symbind_core::Tolerance;
use symbind_solver::{SolverConfig, SolverError};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`ResolverConfig::validate()`].
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A tolerance component is negative or not finite.
    #[error("tolerance.{component} must be finite and non-negative, got {value}")]
    InvalidTolerance {
        /// `"relative"` or `"absolute"`.
        component: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The solver configuration is invalid.
    #[error("solver: {0}")]
    Solver(#[from] SolverError),
}

// ── ResolverConfig ─────────────────────────────────────────────────

/// Tuning for a [`Resolver`](crate::Resolver).
///
/// Serde-friendly so embedding applications can load it from a file;
/// missing keys fall back to the defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Comparison tolerance for real-valued fields during validation and
    /// for the idempotent-update check.
    pub tolerance: Tolerance,
    /// Settings for the default Newton solver.
    pub solver: SolverConfig,
}

impl ResolverConfig {
    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (component, value) in [
            ("relative", self.tolerance.relative),
            ("absolute", self.tolerance.absolute),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTolerance { component, value });
            }
        }
        self.solver.validate()?;
        Ok(())
    }
}
