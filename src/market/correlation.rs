//! Symmetric correlation matrix with upper-triangle storage.

use crate::market::params::AssetId;
use crate::types::error::{StakingError, StakingResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Symmetric correlation matrix for multiple assets.
///
/// Stores correlations between pairs of assets efficiently using only the
/// upper triangle of the matrix.
///
/// # Invariants
///
/// - Diagonal elements are always 1.0 (self-correlation)
/// - Off-diagonal elements are in range \[-1, 1\]
/// - Matrix is symmetric: ρ(A,B) = ρ(B,A)
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::{AssetId, CorrelationMatrix};
///
/// let btc = AssetId::new("BTC");
/// let eth = AssetId::new("ETH");
/// let sol = AssetId::new("SOL");
///
/// let mut matrix = CorrelationMatrix::identity(vec![btc.clone(), eth.clone(), sol.clone()]);
///
/// matrix.set_correlation(&btc, &eth, 0.70).unwrap();
/// matrix.set_correlation(&btc, &sol, 0.60).unwrap();
/// matrix.set_correlation(&eth, &sol, 0.60).unwrap();
///
/// // Symmetric lookup
/// assert_eq!(matrix.get_correlation(&btc, &eth), Some(0.70));
/// assert_eq!(matrix.get_correlation(&eth, &btc), Some(0.70));
///
/// // Self-correlation is always 1
/// assert_eq!(matrix.get_correlation(&btc, &btc), Some(1.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelationMatrix {
    /// List of assets in the matrix.
    assets: Vec<AssetId>,
    /// Flat vector storing upper triangle (including diagonal).
    /// Index formula: i * n - i * (i + 1) / 2 + j for i <= j
    correlations: Vec<f64>,
}

impl CorrelationMatrix {
    /// Creates an identity correlation matrix: all self-correlations are
    /// 1.0, all cross-correlations are 0.0.
    #[must_use]
    pub fn identity(assets: Vec<AssetId>) -> Self {
        let n = assets.len();
        let size = n * (n + 1) / 2;
        let mut correlations = vec![0.0; size];

        for i in 0..n {
            let idx = Self::index_for(i, i, n);
            correlations[idx] = 1.0;
        }

        Self {
            assets,
            correlations,
        }
    }

    /// Creates a correlation matrix from a grouped template: one
    /// correlation for the designated core pair and one shared correlation
    /// for every other pair.
    ///
    /// This is the usual specification for crypto benchmarks, where the
    /// two dominant assets are more tightly coupled than the tail.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidMarketConfig`] if either correlation
    /// lies outside [-1, 1] or a core-pair asset is not in `assets`.
    pub fn grouped(
        assets: Vec<AssetId>,
        core_pair: (&AssetId, &AssetId),
        core_rho: f64,
        shared_rho: f64,
    ) -> StakingResult<Self> {
        let mut matrix = Self::identity(assets);
        let n = matrix.assets.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let idx = Self::index_for(i, j, n);
                matrix.correlations[idx] = shared_rho;
            }
        }
        Self::check_range(shared_rho)?;

        let (core_a, core_b) = core_pair;
        matrix.set_correlation_by_id(core_a, core_b, core_rho)?;

        Ok(matrix)
    }

    /// Returns the number of assets in the matrix.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Returns the list of assets.
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Calculates the flat index for position (i, j) in the upper triangle.
    fn index_for(i: usize, j: usize, n: usize) -> usize {
        let (row, col) = if i <= j { (i, j) } else { (j, i) };
        row * n - row * (row + 1) / 2 + col
    }

    /// Gets the index of an asset in the matrix.
    fn asset_index(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    fn check_range(rho: f64) -> StakingResult<()> {
        if !(-1.0..=1.0).contains(&rho) || rho.is_nan() {
            return Err(StakingError::InvalidMarketConfig(format!(
                "correlation must be in [-1, 1], got {rho}"
            )));
        }
        Ok(())
    }

    /// Gets the correlation between two assets.
    ///
    /// Returns `None` if either asset is not in the matrix.
    #[must_use]
    pub fn get_correlation(&self, asset1: &AssetId, asset2: &AssetId) -> Option<f64> {
        let i = self.asset_index(asset1)?;
        let j = self.asset_index(asset2)?;
        let idx = Self::index_for(i, j, self.assets.len());
        Some(self.correlations[idx])
    }

    /// Gets the correlation by asset position in the ordered asset list.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.assets.len() && j < self.assets.len());
        self.correlations[Self::index_for(i, j, self.assets.len())]
    }

    /// Sets the correlation between two assets.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidMarketConfig`] if the correlation is
    /// outside [-1, 1], either asset is unknown, or the pair is a
    /// self-correlation (the diagonal is fixed at 1.0).
    pub fn set_correlation(
        &mut self,
        asset1: &AssetId,
        asset2: &AssetId,
        rho: f64,
    ) -> StakingResult<()> {
        self.set_correlation_by_id(asset1, asset2, rho)
    }

    fn set_correlation_by_id(
        &mut self,
        asset1: &AssetId,
        asset2: &AssetId,
        rho: f64,
    ) -> StakingResult<()> {
        Self::check_range(rho)?;

        let i = self.asset_index(asset1).ok_or_else(|| {
            StakingError::InvalidMarketConfig(format!("unknown asset: {asset1}"))
        })?;
        let j = self.asset_index(asset2).ok_or_else(|| {
            StakingError::InvalidMarketConfig(format!("unknown asset: {asset2}"))
        })?;

        if i == j {
            return Err(StakingError::InvalidMarketConfig(format!(
                "cannot set self-correlation for {asset1}"
            )));
        }

        let idx = Self::index_for(i, j, self.assets.len());
        self.correlations[idx] = rho;
        Ok(())
    }
}
