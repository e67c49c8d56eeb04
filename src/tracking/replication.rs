//! Closed-form two-asset benchmark replication.
//!
//! Some funds replicate a broad benchmark while holding only its two
//! dominant constituents. For a fixed pair (a, b) the active weights are
//! `δw(x) = δw₀ + x·s` with `s = e_a − e_b` and `δw₀` the all-in-b
//! portfolio minus the benchmark; tracking variance is quadratic in `x`,
//! so the unconstrained minimizer is available in closed form:
//!
//! ```text
//! x* = −(sᵗ Σ δw₀) / (sᵗ Σ s)
//! ```
//!
//! projected onto [0, 1].

use crate::market::{AssetId, MarketParameters};
use crate::types::error::{StakingError, StakingResult};
use nalgebra::DVector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Two-asset replication split and its tracking error.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairReplication {
    /// Portfolio weight of the first held asset.
    pub weight_a: f64,
    /// Portfolio weight of the second held asset, `1 − weight_a`.
    pub weight_b: f64,
    /// Daily tracking error of the split against the full benchmark.
    pub daily_tracking_error: f64,
    /// Annualized tracking error, `daily·√(trading_days)`.
    pub annual_tracking_error: f64,
}

/// Finds the two-asset split minimizing tracking error against the full
/// benchmark.
///
/// # Errors
///
/// Returns [`StakingError::InvalidMarketConfig`] if either asset is not a
/// benchmark constituent or the two assets coincide.
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::{AssetId, CorrelationMatrix, MarketParameters};
/// use staking_analytics_rs::tracking::optimal_pair_replication;
///
/// let assets: Vec<AssetId> = ["BTC", "ETH", "SOL"].iter().map(|s| AssetId::new(*s)).collect();
/// let correlations = CorrelationMatrix::grouped(
///     assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60,
/// ).unwrap();
/// let market = MarketParameters::new(
///     assets.clone(), vec![0.80, 0.15, 0.05], vec![0.039, 0.048, 0.071], correlations,
/// ).unwrap();
///
/// let replication = optimal_pair_replication(&market, &assets[0], &assets[1]).unwrap();
///
/// assert!((replication.weight_a + replication.weight_b - 1.0).abs() < 1e-12);
/// assert!(replication.daily_tracking_error > 0.0);
/// ```
pub fn optimal_pair_replication(
    market: &MarketParameters,
    hold_a: &AssetId,
    hold_b: &AssetId,
) -> StakingResult<PairReplication> {
    let (a, b, cov) = resolve_pair(market, hold_a, hold_b)?;

    let delta_w0 = all_in_b_deviation(market, b);
    let mut s = DVector::zeros(market.asset_count());
    s[a] = 1.0;
    s[b] = -1.0;

    let numerator = s.dot(&(&cov * &delta_w0));
    let denominator = s.dot(&(&cov * &s));
    let x = (-numerator / denominator).clamp(0.0, 1.0);

    Ok(evaluate_split(market, &cov, &delta_w0, &s, x))
}

/// Tracking error of an explicit two-asset split (`weight_a` in the
/// first asset, the rest in the second).
///
/// # Errors
///
/// Returns [`StakingError::InvalidMarketConfig`] for unknown or
/// coinciding assets, or a weight outside [0, 1].
pub fn pair_replication_tracking_error(
    market: &MarketParameters,
    hold_a: &AssetId,
    hold_b: &AssetId,
    weight_a: f64,
) -> StakingResult<PairReplication> {
    if !(0.0..=1.0).contains(&weight_a) || weight_a.is_nan() {
        return Err(StakingError::InvalidMarketConfig(format!(
            "weight_a must be in [0, 1], got {weight_a}"
        )));
    }

    let (a, b, cov) = resolve_pair(market, hold_a, hold_b)?;

    let delta_w0 = all_in_b_deviation(market, b);
    let mut s = DVector::zeros(market.asset_count());
    s[a] = 1.0;
    s[b] = -1.0;

    Ok(evaluate_split(market, &cov, &delta_w0, &s, weight_a))
}

fn resolve_pair(
    market: &MarketParameters,
    hold_a: &AssetId,
    hold_b: &AssetId,
) -> StakingResult<(usize, usize, crate::types::CovarianceMatrix)> {
    let a = market.asset_index(hold_a).ok_or_else(|| {
        StakingError::InvalidMarketConfig(format!("unknown asset: {hold_a}"))
    })?;
    let b = market.asset_index(hold_b).ok_or_else(|| {
        StakingError::InvalidMarketConfig(format!("unknown asset: {hold_b}"))
    })?;

    if a == b {
        return Err(StakingError::InvalidMarketConfig(format!(
            "replication pair must be two distinct assets, got {hold_a} twice"
        )));
    }

    Ok((a, b, market.covariance()?))
}

/// Deviation of the all-in-b portfolio from the benchmark.
fn all_in_b_deviation(market: &MarketParameters, b: usize) -> DVector<f64> {
    let mut delta = DVector::from_iterator(
        market.asset_count(),
        market.benchmark_weights().iter().map(|w| -w),
    );
    delta[b] += 1.0;
    delta
}

fn evaluate_split(
    market: &MarketParameters,
    cov: &crate::types::CovarianceMatrix,
    delta_w0: &DVector<f64>,
    s: &DVector<f64>,
    x: f64,
) -> PairReplication {
    let active = delta_w0 + s * x;
    let daily = active.dot(&(cov * &active)).sqrt();

    PairReplication {
        weight_a: x,
        weight_b: 1.0 - x,
        daily_tracking_error: daily,
        annual_tracking_error: daily * f64::from(market.trading_days_per_year()).sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::CorrelationMatrix;

    fn reference_market() -> MarketParameters {
        let assets: Vec<AssetId> = ["BTC", "ETH", "XRP", "SOL", "ADA", "XLM"]
            .iter()
            .map(|s| AssetId::new(*s))
            .collect();
        let correlations =
            CorrelationMatrix::grouped(assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60)
                .unwrap();
        MarketParameters::new(
            assets,
            vec![0.7869, 0.1049, 0.0549, 0.0387, 0.0119, 0.0027],
            vec![0.039, 0.048, 0.053, 0.071, 0.055, 0.051],
            correlations,
        )
        .unwrap()
    }

    #[test]
    fn test_optimal_btc_eth_split() {
        let market = reference_market();
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");

        let replication = optimal_pair_replication(&market, &btc, &eth).unwrap();

        // Known closed-form optimum for the reference market.
        assert!((replication.weight_a - 0.847255156950672).abs() < 1e-9);
        assert!((replication.weight_b - 0.152744843049328).abs() < 1e-9);
        assert!((replication.annual_tracking_error - 5.925836386820e-2).abs() < 1e-9);
    }

    #[test]
    fn test_optimum_beats_proportional_split() {
        let market = reference_market();
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");

        let optimal = optimal_pair_replication(&market, &btc, &eth).unwrap();

        // Proportional split: benchmark weights rescaled to the pair.
        let proportional_x = 0.7869 / (0.7869 + 0.1049);
        let proportional =
            pair_replication_tracking_error(&market, &btc, &eth, proportional_x).unwrap();

        assert!((proportional.annual_tracking_error - 6.233612039224e-2).abs() < 1e-9);
        assert!(optimal.annual_tracking_error < proportional.annual_tracking_error);
    }

    #[test]
    fn test_explicit_split_weights() {
        let market = reference_market();
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");

        let replication = pair_replication_tracking_error(&market, &btc, &eth, 0.9).unwrap();
        assert_eq!(replication.weight_a, 0.9);
        assert!((replication.weight_b - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let market = reference_market();
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");
        let unknown = AssetId::new("DOGE");

        assert!(optimal_pair_replication(&market, &btc, &unknown).is_err());
        assert!(optimal_pair_replication(&market, &btc, &btc).is_err());
        assert!(pair_replication_tracking_error(&market, &btc, &eth, 1.5).is_err());
    }
}
