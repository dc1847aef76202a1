//! Error types for Synstation

use thiserror::Error;

/// Errors raised by pools, binary markets and the basket router
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Insufficient reserve: requested {requested}, available {available}")]
    InsufficientReserve { requested: f64, available: f64 },

    #[error("Split search did not converge after {iterations} iterations (bracket [{left}, {right}])")]
    NumericConvergenceFailure {
        iterations: usize,
        left: f64,
        right: f64,
    },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Unknown outcome {index} (basket has {outcomes} outcomes)")]
    UnknownOutcome { index: usize, outcomes: usize },
}

/// Result type alias for Synstation operations
pub type Result<T> = std::result::Result<T, CurveError>;

impl CurveError {
    /// Stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "invalid_configuration",
            Self::InsufficientReserve { .. } => "insufficient_reserve",
            Self::NumericConvergenceFailure { .. } => "numeric_convergence_failure",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::UnknownOutcome { .. } => "unknown_outcome",
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Reject NaN, infinite and negative amounts handed to a committing operation.
pub fn ensure_amount(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CurveError::InvalidAmount {
            message: format!("{} must be a finite non-negative number, got {}", name, value),
        });
    }
    Ok(())
}

/// Reject prices outside `[0, 1]`.
pub fn ensure_probability(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(CurveError::InvalidAmount {
            message: format!("{} must lie in [0, 1], got {}", name, value),
        });
    }
    Ok(())
}
