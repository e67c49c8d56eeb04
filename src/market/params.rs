//! Market, staking and fund parameter types.
//!
//! All of these are immutable value structs validated at construction;
//! derived quantities (thresholds, budgets, covariance) are computed on
//! demand by pure functions rather than cached in mutable state.

use crate::market::correlation::CorrelationMatrix;
use crate::market::covariance::CovarianceBuilder;
use crate::types::CovarianceMatrix;
use crate::types::error::{StakingError, StakingResult};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance for the benchmark-weights-sum-to-one invariant.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-4;

/// Unique identifier for an asset.
///
/// Used to identify benchmark constituents in market parameters, staking
/// maps and calculation results.
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::AssetId;
///
/// let btc = AssetId::new("BTC");
/// let eth = AssetId::from("ETH");
///
/// assert_ne!(btc, eth);
/// assert_eq!(btc.as_str(), "BTC");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssetId(pub String);

impl AssetId {
    /// Creates a new asset ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the asset ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Benchmark market structure: ordered assets, weights, daily
/// volatilities and the pairwise correlation specification.
///
/// # Invariants
///
/// - Benchmark weights are non-negative and sum to 1 within `1e-4`
/// - Daily volatilities are strictly positive
/// - The correlation matrix covers exactly the same ordered asset list
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::{AssetId, CorrelationMatrix, MarketParameters};
///
/// let assets: Vec<AssetId> = ["BTC", "ETH"].iter().map(|s| AssetId::new(*s)).collect();
/// let correlations = CorrelationMatrix::grouped(
///     assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60,
/// ).unwrap();
///
/// let market = MarketParameters::new(
///     assets,
///     vec![0.88, 0.12],
///     vec![0.039, 0.048],
///     correlations,
/// ).unwrap();
///
/// assert_eq!(market.asset_count(), 2);
/// assert_eq!(market.weight(1), 0.12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarketParameters {
    assets: Vec<AssetId>,
    benchmark_weights: Vec<f64>,
    daily_volatilities: Vec<f64>,
    correlations: CorrelationMatrix,
    trading_days_per_year: u32,
}

impl MarketParameters {
    /// Standard trading-day count used for annualization.
    pub const DEFAULT_TRADING_DAYS: u32 = 252;

    /// Creates validated market parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidMarketConfig`] if:
    /// - the asset list is empty or input lengths differ
    /// - any weight is negative or the weights do not sum to 1 within `1e-4`
    /// - any daily volatility is not strictly positive
    /// - the correlation matrix was built over a different asset list
    pub fn new(
        assets: Vec<AssetId>,
        benchmark_weights: Vec<f64>,
        daily_volatilities: Vec<f64>,
        correlations: CorrelationMatrix,
    ) -> StakingResult<Self> {
        Self::with_trading_days(
            assets,
            benchmark_weights,
            daily_volatilities,
            correlations,
            Self::DEFAULT_TRADING_DAYS,
        )
    }

    /// Creates validated market parameters with an explicit trading-day
    /// count (used only for annualization of replication figures and
    /// windowed tracking errors).
    pub fn with_trading_days(
        assets: Vec<AssetId>,
        benchmark_weights: Vec<f64>,
        daily_volatilities: Vec<f64>,
        correlations: CorrelationMatrix,
        trading_days_per_year: u32,
    ) -> StakingResult<Self> {
        if assets.is_empty() {
            return Err(StakingError::InvalidMarketConfig(
                "asset list must not be empty".to_string(),
            ));
        }

        if assets.len() != benchmark_weights.len() || assets.len() != daily_volatilities.len() {
            return Err(StakingError::InvalidMarketConfig(format!(
                "mismatched input lengths: {} assets, {} weights, {} volatilities",
                assets.len(),
                benchmark_weights.len(),
                daily_volatilities.len()
            )));
        }

        if correlations.assets() != assets.as_slice() {
            return Err(StakingError::InvalidMarketConfig(
                "correlation matrix assets do not match market assets".to_string(),
            ));
        }

        for (asset, &w) in assets.iter().zip(&benchmark_weights) {
            if !(0.0..=1.0).contains(&w) || w.is_nan() {
                return Err(StakingError::InvalidMarketConfig(format!(
                    "benchmark weight for {asset} must be in [0, 1], got {w}"
                )));
            }
        }

        let sum: f64 = benchmark_weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(StakingError::InvalidMarketConfig(format!(
                "benchmark weights must sum to 1.0, got {sum}"
            )));
        }

        for (asset, &vol) in assets.iter().zip(&daily_volatilities) {
            if vol <= 0.0 || vol.is_nan() {
                return Err(StakingError::InvalidMarketConfig(format!(
                    "daily volatility for {asset} must be positive, got {vol}"
                )));
            }
        }

        if trading_days_per_year == 0 {
            return Err(StakingError::InvalidMarketConfig(
                "trading_days_per_year must be positive".to_string(),
            ));
        }

        Ok(Self {
            assets,
            benchmark_weights,
            daily_volatilities,
            correlations,
            trading_days_per_year,
        })
    }

    /// Returns the number of assets in the benchmark.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Returns the ordered asset list.
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Returns the position of an asset in the ordered list.
    #[must_use]
    pub fn asset_index(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Returns the benchmark weight at position `index`.
    #[must_use]
    pub fn weight(&self, index: usize) -> f64 {
        self.benchmark_weights[index]
    }

    /// Returns all benchmark weights in asset order.
    #[must_use]
    pub fn benchmark_weights(&self) -> &[f64] {
        &self.benchmark_weights
    }

    /// Returns all daily volatilities in asset order.
    #[must_use]
    pub fn daily_volatilities(&self) -> &[f64] {
        &self.daily_volatilities
    }

    /// Returns the correlation specification.
    #[must_use]
    pub fn correlations(&self) -> &CorrelationMatrix {
        &self.correlations
    }

    /// Returns the trading-day count used for annualization.
    #[must_use]
    pub fn trading_days_per_year(&self) -> u32 {
        self.trading_days_per_year
    }

    /// Builds the daily covariance matrix `Σ_ij = ρ_ij·σ_i·σ_j`.
    ///
    /// # Errors
    ///
    /// Propagates [`StakingError::InvalidMarketConfig`] from the builder.
    pub fn covariance(&self) -> StakingResult<CovarianceMatrix> {
        CovarianceBuilder::build(&self.daily_volatilities, &self.correlations)
    }
}

/// Staking configuration for a single benchmark asset.
///
/// The redemption threshold τ = 1 − staking fraction is derived on demand
/// via [`StakingConfig::threshold`]; there is no cached state to fall out
/// of sync when configurations are rebuilt for a sensitivity scan.
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::StakingConfig;
///
/// let config = StakingConfig::new(0.80, 10, 0.05, 0.70).unwrap();
///
/// assert!((config.threshold() - 0.20).abs() < 1e-12);
/// assert_eq!(config.unbonding_days, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StakingConfig {
    /// Fraction of the asset's holdings that is staked, in [0, 1].
    pub staking_pct: f64,

    /// Days required to convert staked holdings back to liquid form.
    pub unbonding_days: u32,

    /// Annual staking yield earned on the staked fraction.
    pub annual_yield: f64,

    /// Reference staking fraction against which the baseline yield
    /// benefit is measured.
    pub baseline_pct: f64,
}

impl StakingConfig {
    /// Creates a validated staking configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidStakingConfig`] if `staking_pct`,
    /// `annual_yield` or `baseline_pct` lie outside [0, 1], or if the
    /// unbonding period is zero.
    pub fn new(
        staking_pct: f64,
        unbonding_days: u32,
        annual_yield: f64,
        baseline_pct: f64,
    ) -> StakingResult<Self> {
        if !(0.0..=1.0).contains(&staking_pct) || staking_pct.is_nan() {
            return Err(StakingError::InvalidStakingConfig(format!(
                "staking_pct must be in [0, 1], got {staking_pct}"
            )));
        }

        if unbonding_days == 0 {
            return Err(StakingError::InvalidStakingConfig(
                "unbonding_days must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&annual_yield) || annual_yield.is_nan() {
            return Err(StakingError::InvalidStakingConfig(format!(
                "annual_yield must be in [0, 1], got {annual_yield}"
            )));
        }

        if !(0.0..=1.0).contains(&baseline_pct) || baseline_pct.is_nan() {
            return Err(StakingError::InvalidStakingConfig(format!(
                "baseline_pct must be in [0, 1], got {baseline_pct}"
            )));
        }

        Ok(Self {
            staking_pct,
            unbonding_days,
            annual_yield,
            baseline_pct,
        })
    }

    /// Returns a copy of this configuration at a different staking level.
    ///
    /// Used by the sensitivity scan, which varies the staking fraction
    /// while holding yield, baseline and unbonding fixed.
    #[must_use]
    pub fn at_level(&self, staking_pct: f64) -> Self {
        Self {
            staking_pct,
            ..*self
        }
    }

    /// Redemption threshold τ = 1 − staking fraction.
    ///
    /// A redemption of fraction `r ≤ τ` can be served entirely from liquid
    /// holdings and forces no overweight.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        1.0 - self.staking_pct
    }

    /// Forced overweight `w·(r − τ)₊` for a redemption of fraction `r`,
    /// given this asset's benchmark weight `w`.
    #[must_use]
    pub fn required_overweight(&self, benchmark_weight: f64, redemption_pct: f64) -> f64 {
        benchmark_weight * (redemption_pct - self.threshold()).max(0.0)
    }
}

/// Fund-level settings for the tracking-difference budget.
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::FundConfig;
///
/// let fund = FundConfig::new(500_000_000.0, 0.0143, 0.015).unwrap();
/// assert!((fund.budget() - 0.0007).abs() < 1e-12);
///
/// // The current tracking difference may not exceed the cap.
/// assert!(FundConfig::new(500_000_000.0, 0.016, 0.015).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FundConfig {
    /// Net asset value in currency units.
    pub nav: f64,

    /// Current expected tracking difference.
    pub current_td: f64,

    /// Tracking-difference cap set by the investment committee.
    pub cap_td: f64,
}

impl FundConfig {
    /// Creates a validated fund configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidFundConfig`] if NAV is not positive,
    /// either tracking difference lies outside [0, 1], or
    /// `current_td > cap_td`. The last case is a configuration error
    /// surfaced to the caller, never silently clamped.
    pub fn new(nav: f64, current_td: f64, cap_td: f64) -> StakingResult<Self> {
        if nav <= 0.0 || nav.is_nan() {
            return Err(StakingError::InvalidFundConfig(format!(
                "nav must be positive, got {nav}"
            )));
        }

        for (name, td) in [("current_td", current_td), ("cap_td", cap_td)] {
            if !(0.0..=1.0).contains(&td) || td.is_nan() {
                return Err(StakingError::InvalidFundConfig(format!(
                    "{name} must be in [0, 1], got {td}"
                )));
            }
        }

        if current_td > cap_td {
            return Err(StakingError::InvalidFundConfig(format!(
                "current_td {current_td} exceeds cap_td {cap_td}"
            )));
        }

        Ok(Self {
            nav,
            current_td,
            cap_td,
        })
    }

    /// Remaining tracking-difference budget, `cap_td − current_td`.
    #[must_use]
    pub fn budget(&self) -> f64 {
        self.cap_td - self.current_td
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_asset_market() -> MarketParameters {
        let assets: Vec<AssetId> = ["BTC", "ETH"].iter().map(|s| AssetId::new(*s)).collect();
        let correlations =
            CorrelationMatrix::grouped(assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60)
                .unwrap();
        MarketParameters::new(assets, vec![0.88, 0.12], vec![0.039, 0.048], correlations).unwrap()
    }

    #[test]
    fn test_asset_id_conversions() {
        let btc = AssetId::new("BTC");
        assert_eq!(btc, AssetId::from("BTC"));
        assert_eq!(btc, AssetId::from("BTC".to_string()));
        assert_eq!(format!("{btc}"), "BTC");
    }

    #[test]
    fn test_market_valid() {
        let market = two_asset_market();
        assert_eq!(market.asset_count(), 2);
        assert_eq!(market.asset_index(&AssetId::new("ETH")), Some(1));
        assert_eq!(market.asset_index(&AssetId::new("XRP")), None);
        assert_eq!(market.trading_days_per_year(), 252);
    }

    #[test]
    fn test_market_rejects_bad_weight_sum() {
        let assets: Vec<AssetId> = ["BTC", "ETH"].iter().map(|s| AssetId::new(*s)).collect();
        let correlations = CorrelationMatrix::identity(assets.clone());
        let result =
            MarketParameters::new(assets, vec![0.80, 0.12], vec![0.039, 0.048], correlations);
        assert!(result.is_err());
    }

    #[test]
    fn test_market_rejects_negative_weight() {
        let assets: Vec<AssetId> = ["BTC", "ETH"].iter().map(|s| AssetId::new(*s)).collect();
        let correlations = CorrelationMatrix::identity(assets.clone());
        let result =
            MarketParameters::new(assets, vec![1.05, -0.05], vec![0.039, 0.048], correlations);
        assert!(result.is_err());
    }

    #[test]
    fn test_market_rejects_non_positive_volatility() {
        let assets: Vec<AssetId> = ["BTC", "ETH"].iter().map(|s| AssetId::new(*s)).collect();
        let correlations = CorrelationMatrix::identity(assets.clone());
        let result = MarketParameters::new(assets, vec![0.88, 0.12], vec![0.039, 0.0], correlations);
        assert!(result.is_err());
    }

    #[test]
    fn test_market_rejects_mismatched_correlations() {
        let assets: Vec<AssetId> = ["BTC", "ETH"].iter().map(|s| AssetId::new(*s)).collect();
        let other: Vec<AssetId> = ["BTC", "SOL"].iter().map(|s| AssetId::new(*s)).collect();
        let correlations = CorrelationMatrix::identity(other);
        let result =
            MarketParameters::new(assets, vec![0.88, 0.12], vec![0.039, 0.048], correlations);
        assert!(result.is_err());
    }

    #[test]
    fn test_staking_config_threshold() {
        let config = StakingConfig::new(0.90, 10, 0.03, 0.70).unwrap();
        assert!((config.threshold() - 0.10).abs() < 1e-12);

        let relaxed = config.at_level(0.75);
        assert!((relaxed.threshold() - 0.25).abs() < 1e-12);
        assert_eq!(relaxed.unbonding_days, 10);
    }

    #[test]
    fn test_staking_config_required_overweight() {
        let config = StakingConfig::new(0.80, 10, 0.05, 0.70).unwrap();

        // Below threshold: no forced overweight.
        assert_eq!(config.required_overweight(0.1049, 0.15), 0.0);

        // Above threshold: w · (r − τ).
        let delta = config.required_overweight(0.1049, 0.30);
        assert!((delta - 0.1049 * 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_staking_config_validation() {
        assert!(StakingConfig::new(1.01, 10, 0.05, 0.70).is_err());
        assert!(StakingConfig::new(-0.1, 10, 0.05, 0.70).is_err());
        assert!(StakingConfig::new(0.9, 0, 0.05, 0.70).is_err());
        assert!(StakingConfig::new(0.9, 10, -0.01, 0.70).is_err());
        assert!(StakingConfig::new(0.9, 10, 0.05, 1.2).is_err());
    }

    #[test]
    fn test_fund_config_budget() {
        let fund = FundConfig::new(500_000_000.0, 0.0143, 0.015).unwrap();
        assert!((fund.budget() - 0.0007).abs() < 1e-12);
    }

    #[test]
    fn test_fund_config_rejects_exceeded_cap() {
        let result = FundConfig::new(500_000_000.0, 0.02, 0.015);
        assert!(matches!(
            result,
            Err(StakingError::InvalidFundConfig(_))
        ));
    }

    #[test]
    fn test_fund_config_rejects_bad_nav() {
        assert!(FundConfig::new(0.0, 0.01, 0.015).is_err());
        assert!(FundConfig::new(-1.0, 0.01, 0.015).is_err());
    }
}
