//! Solver tuning parameters.

use serde::{Deserialize, Serialize};

use crate::error::SolverError;

/// Configuration for [`NewtonSolver`](crate::NewtonSolver).
///
/// Every field has a serde default, so a partial JSON/TOML table is
/// enough to override a single knob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Newton iterations per start point. Default: 100.
    pub max_iterations: u32,
    /// A block is solved when the Euclidean norm of its residuals, each
    /// divided by `max(1, largest constant in its equation)`, is at most
    /// this. Default: 1e-10.
    pub residual_tolerance: f64,
    /// Relative tolerance for equations whose variables are all known,
    /// and for surplus equations used as filters. Default: 1e-9.
    pub consistency_tolerance: f64,
    /// Upper bound on enumerated candidates. Default: 64.
    pub max_candidates: usize,
    /// Positive magnitudes used to seed Newton. Each is tried with both
    /// signs, alongside zero and magnitudes derived from the known values.
    pub start_points: Vec<f64>,
    /// Cap on per-magnitude sign patterns for multivariate blocks.
    /// Default: 64.
    pub max_sign_patterns: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            residual_tolerance: 1e-10,
            consistency_tolerance: 1e-9,
            max_candidates: 64,
            start_points: vec![0.5, 1.0, 2.0, 5.0, 10.0, 100.0, 1e3, 1e4, 1e6],
            max_sign_patterns: 64,
        }
    }
}

impl SolverConfig {
    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), SolverError> {
        let invalid = |reason: String| Err(SolverError::InvalidConfig { reason });
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".into());
        }
        for (name, value) in [
            ("residual_tolerance", self.residual_tolerance),
            ("consistency_tolerance", self.consistency_tolerance),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return invalid(format!("{name} must be in (0, 1), got {value}"));
            }
        }
        if self.max_candidates == 0 {
            return invalid("max_candidates must be at least 1".into());
        }
        if self.start_points.is_empty() {
            return invalid("start_points must not be empty".into());
        }
        if let Some(bad) = self
            .start_points
            .iter()
            .find(|p| !p.is_finite() || **p <= 0.0)
        {
            return invalid(format!("start_points must be finite and positive, got {bad}"));
        }
        if self.max_sign_patterns == 0 {
            return invalid("max_sign_patterns must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_tolerance() {
        let cfg = SolverConfig {
            residual_tolerance: f64::NAN,
            ..SolverConfig::default()
        };
        match cfg.validate() {
            Err(SolverError::InvalidConfig { reason }) => {
                assert!(reason.contains("residual_tolerance"));
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_start_point() {
        let cfg = SolverConfig {
            start_points: vec![1.0, -2.0],
            ..SolverConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_overrides_one_field() {
        let cfg: SolverConfig = serde_json::from_str(r#"{"max_iterations": 7}"#).unwrap();
        assert_eq!(cfg.max_iterations, 7);
        assert_eq!(cfg.max_candidates, 64);
    }
}
