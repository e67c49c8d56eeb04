//! Covariance matrix construction from volatilities and correlations.

use crate::market::correlation::CorrelationMatrix;
use crate::types::CovarianceMatrix;
use crate::types::error::{StakingError, StakingResult};

/// Builds covariance matrices with a specified correlation structure.
///
/// # Mathematical Background
///
/// ```text
/// Σ_ii = σ_i²
/// Σ_ij = ρ_ij · σ_i · σ_j
/// ```
///
/// The output is symmetric by construction and positive semi-definite
/// whenever the correlation matrix is; invertibility for a given
/// constraint set is checked downstream by the optimizer.
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::{AssetId, CorrelationMatrix, CovarianceBuilder};
///
/// let assets: Vec<AssetId> = ["BTC", "ETH"].iter().map(|s| AssetId::new(*s)).collect();
/// let correlations = CorrelationMatrix::grouped(
///     assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60,
/// ).unwrap();
///
/// let cov = CovarianceBuilder::build(&[0.039, 0.048], &correlations).unwrap();
///
/// assert!((cov[(0, 0)] - 0.039 * 0.039).abs() < 1e-15);
/// assert!((cov[(0, 1)] - 0.70 * 0.039 * 0.048).abs() < 1e-15);
/// assert_eq!(cov[(0, 1)], cov[(1, 0)]);
/// ```
pub struct CovarianceBuilder;

impl CovarianceBuilder {
    /// Constructs the covariance matrix `Σ` from daily volatilities and a
    /// correlation matrix over the same ordered asset list.
    ///
    /// This is a pure function: no caching, no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidMarketConfig`] if the volatility
    /// count does not match the correlation matrix, or any volatility is
    /// not strictly positive. Correlation range is enforced by
    /// [`CorrelationMatrix`] at construction.
    pub fn build(
        daily_volatilities: &[f64],
        correlations: &CorrelationMatrix,
    ) -> StakingResult<CovarianceMatrix> {
        let n = daily_volatilities.len();

        if n != correlations.asset_count() {
            return Err(StakingError::InvalidMarketConfig(format!(
                "{} volatilities for {} correlated assets",
                n,
                correlations.asset_count()
            )));
        }

        for &vol in daily_volatilities {
            if vol <= 0.0 || vol.is_nan() {
                return Err(StakingError::InvalidMarketConfig(format!(
                    "daily volatility must be positive, got {vol}"
                )));
            }
        }

        let mut cov = CovarianceMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                cov[(i, j)] = correlations.get(i, j) * daily_volatilities[i] * daily_volatilities[j];
            }
        }

        Ok(cov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::params::AssetId;

    fn assets(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|s| AssetId::new(*s)).collect()
    }

    #[test]
    fn test_diagonal_is_variance() {
        let ids = assets(&["BTC", "ETH", "SOL"]);
        let corr = CorrelationMatrix::identity(ids);
        let vols = [0.039, 0.048, 0.071];

        let cov = CovarianceBuilder::build(&vols, &corr).unwrap();

        for (i, &vol) in vols.iter().enumerate() {
            assert!((cov[(i, i)] - vol * vol).abs() < 1e-15);
        }
        // Identity correlation: no off-diagonal covariance.
        assert_eq!(cov[(0, 1)], 0.0);
    }

    #[test]
    fn test_symmetric_output() {
        let ids = assets(&["BTC", "ETH", "XRP", "SOL"]);
        let corr =
            CorrelationMatrix::grouped(ids.clone(), (&ids[0], &ids[1]), 0.70, 0.60).unwrap();

        let cov = CovarianceBuilder::build(&[0.039, 0.048, 0.053, 0.071], &corr).unwrap();

        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(cov[(i, j)], cov[(j, i)]);
            }
        }
        assert!((cov[(0, 1)] - 0.70 * 0.039 * 0.048).abs() < 1e-15);
        assert!((cov[(2, 3)] - 0.60 * 0.053 * 0.071).abs() < 1e-15);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let ids = assets(&["BTC", "ETH"]);
        let corr = CorrelationMatrix::identity(ids);
        assert!(CovarianceBuilder::build(&[0.039], &corr).is_err());
    }

    #[test]
    fn test_rejects_non_positive_volatility() {
        let ids = assets(&["BTC", "ETH"]);
        let corr = CorrelationMatrix::identity(ids);
        assert!(CovarianceBuilder::build(&[0.039, 0.0], &corr).is_err());
        assert!(CovarianceBuilder::build(&[0.039, -0.01], &corr).is_err());
    }
}
