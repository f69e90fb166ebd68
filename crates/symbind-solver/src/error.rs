//! Solver errors.

/// Why a solver could not enumerate candidates.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    /// The equations do not determine these unknowns.
    #[error("system is underdetermined in [{}]", .unresolved.join(", "))]
    Underdetermined {
        /// Unknowns left free, in system order.
        unresolved: Vec<String>,
    },
    /// An equation with every variable known does not hold.
    #[error("known values contradict `{equation}`")]
    Contradiction {
        /// Label of the failing equation.
        equation: String,
    },
    /// More solutions than the configured limit.
    #[error("more than {limit} candidate solutions")]
    TooManyCandidates {
        /// The configured limit.
        limit: usize,
    },
    /// A configuration value is out of range.
    #[error("invalid solver configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
    /// The numeric backend refused to build or run a block.
    #[error("numeric backend rejected block [{}]: {reason}", .block.join(", "))]
    Numeric {
        /// Unknowns of the rejected block.
        block: Vec<String>,
        /// The backend's message.
        reason: String,
    },
}
