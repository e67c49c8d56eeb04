//! Error types for the tracking-error engine.
//!
//! Every failure is a local computation failure with no partial results:
//! the caller receives a typed error and no default value is invented in
//! its place. The engine is deterministic and pure, so nothing is retried
//! internally; any recovery (clamping a percentage, substituting a
//! default distribution) is the caller's decision.

use thiserror::Error;

/// Result type alias for all fallible operations in this crate.
pub type StakingResult<T> = Result<T, StakingError>;

/// Errors produced by the tracking-error engine.
#[derive(Debug, Error)]
pub enum StakingError {
    /// Malformed market inputs: weights that do not sum to one, negative
    /// weights, non-positive volatilities, or correlations outside [-1, 1].
    #[error("invalid market configuration: {0}")]
    InvalidMarketConfig(String),

    /// The constraint Gram matrix `C Σ⁻¹ Cᵗ` (or the covariance matrix
    /// itself) is not invertible: degenerate covariance or redundant
    /// constraints. The message names the offending constraint set.
    #[error("singular constraint system: {0}")]
    SingularConstraintSystem(String),

    /// Redemption probabilities are negative or do not sum to one within
    /// tolerance after a normalization attempt.
    #[error("invalid redemption distribution: {0}")]
    InvalidDistribution(String),

    /// Fund-level configuration error, e.g. the current tracking
    /// difference already exceeds the committee cap.
    #[error("invalid fund configuration: {0}")]
    InvalidFundConfig(String),

    /// Per-asset staking configuration error: fractions outside [0, 1],
    /// a zero unbonding period, or more staked assets than the
    /// time-segmented variance model supports.
    #[error("invalid staking configuration: {0}")]
    InvalidStakingConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StakingError::InvalidMarketConfig("weights sum to 0.9".to_string());
        assert_eq!(
            err.to_string(),
            "invalid market configuration: weights sum to 0.9"
        );

        let err = StakingError::SingularConstraintSystem("pinned assets [1, 1]".to_string());
        assert!(err.to_string().starts_with("singular constraint system"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = StakingError::InvalidDistribution("sum 0.98".to_string());
        let debug = format!("{err:?}");
        assert!(debug.contains("InvalidDistribution"));
    }
}
