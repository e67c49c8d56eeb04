//! Threshold variance model: redemption size to instantaneous variance.

use crate::optimizer::KFactors;
use crate::types::error::{StakingError, StakingResult};

/// Staking-side inputs of the variance model for one pinned asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StakedAssetSpec {
    /// Redemption threshold τ = 1 − staking fraction.
    pub threshold: f64,
    /// Unbonding period in days.
    pub unbonding_days: u32,
}

/// Converts a redemption-size scenario into instantaneous tracking
/// variance using the optimizer's k-factors.
///
/// Supports one or two staked assets. With two assets the episode is
/// time-segmented: during the first `d_short` days both overweights are
/// active (`variance_full`), for the remaining `d_long − d_short` days
/// only the longer-unbonding asset's overweight persists
/// (`variance_partial`). The partial segment reuses the k-factor from
/// the joint constraint solve.
///
/// ```text
/// Var_full(r)    = k₁₁(r−τ₁)²₊ + 2k₁₂(r−τ₁)₊(r−τ₂)₊ + k₂₂(r−τ₂)²₊
/// Var_partial(r) = k_LL(r−τ_L)²₊        (L = longer-unbonding asset)
/// ```
#[derive(Debug, Clone)]
pub struct ThresholdVarianceModel {
    k: KFactors,
    staked: Vec<StakedAssetSpec>,
}

impl ThresholdVarianceModel {
    /// Creates a variance model from k-factors and per-asset staking
    /// specs, in the same pinned-asset order.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidStakingConfig`] if the spec count
    /// does not match the k-factors, or is not 1 or 2 (the time-segmented
    /// model is defined for at most two distinct unbonding periods).
    pub fn new(k: KFactors, staked: Vec<StakedAssetSpec>) -> StakingResult<Self> {
        if staked.len() != k.asset_count() {
            return Err(StakingError::InvalidStakingConfig(format!(
                "{} staked asset specs for {} pinned assets",
                staked.len(),
                k.asset_count()
            )));
        }

        if staked.is_empty() || staked.len() > 2 {
            return Err(StakingError::InvalidStakingConfig(format!(
                "variance model supports one or two staked assets, got {}",
                staked.len()
            )));
        }

        Ok(Self { k, staked })
    }

    /// Returns the number of staked assets.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.staked.len()
    }

    /// Returns the k-factors backing this model.
    #[must_use]
    pub fn k_factors(&self) -> &KFactors {
        &self.k
    }

    /// Returns the per-asset staking specs in pinned order.
    #[must_use]
    pub fn staked(&self) -> &[StakedAssetSpec] {
        &self.staked
    }

    /// Returns a copy of this model with new thresholds, keeping the
    /// k-factors and unbonding periods.
    ///
    /// The sensitivity grid uses this to vary staking levels without
    /// repeating the constraint solve.
    ///
    /// # Panics
    ///
    /// Panics if the threshold count differs from the staked-asset count.
    #[must_use]
    pub fn with_thresholds(&self, thresholds: &[f64]) -> Self {
        assert_eq!(thresholds.len(), self.staked.len());
        let staked = self
            .staked
            .iter()
            .zip(thresholds)
            .map(|(spec, &threshold)| StakedAssetSpec {
                threshold,
                unbonding_days: spec.unbonding_days,
            })
            .collect();
        Self {
            k: self.k.clone(),
            staked,
        }
    }

    /// Excess redemption `(r − τᵢ)₊` for the `i`-th staked asset.
    #[must_use]
    pub fn excess(&self, i: usize, redemption_pct: f64) -> f64 {
        (redemption_pct - self.staked[i].threshold).max(0.0)
    }

    /// Shorter of the unbonding periods.
    #[must_use]
    pub fn d_short(&self) -> u32 {
        self.staked
            .iter()
            .map(|s| s.unbonding_days)
            .min()
            .unwrap_or(0)
    }

    /// Longer of the unbonding periods.
    #[must_use]
    pub fn d_long(&self) -> u32 {
        self.staked
            .iter()
            .map(|s| s.unbonding_days)
            .max()
            .unwrap_or(0)
    }

    /// Position (in pinned order) of the longer-unbonding asset.
    ///
    /// Ties resolve to the first asset, which makes the partial segment
    /// irrelevant anyway: equal unbonding periods give it zero length.
    #[must_use]
    pub fn long_position(&self) -> usize {
        self.staked
            .iter()
            .enumerate()
            .max_by_key(|(_, s)| s.unbonding_days)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Variance while every staked asset's overweight is active.
    ///
    /// The double sum over k-factors produces the cross term with its
    /// factor of two: `k₁₂e₁e₂` and `k₂₁e₂e₁` are both counted.
    #[must_use]
    pub fn variance_full(&self, redemption_pct: f64) -> f64 {
        let mut variance = 0.0;
        for i in 0..self.staked.len() {
            let e_i = self.excess(i, redemption_pct);
            for j in 0..self.staked.len() {
                let e_j = self.excess(j, redemption_pct);
                variance += self.k.cross(i, j) * e_i * e_j;
            }
        }
        variance
    }

    /// Variance after the shorter-unbonding asset has unbonded: only the
    /// longer-unbonding asset's overweight remains.
    ///
    /// For a single staked asset this equals [`Self::variance_full`].
    #[must_use]
    pub fn variance_partial(&self, redemption_pct: f64) -> f64 {
        let long = self.long_position();
        let e = self.excess(long, redemption_pct);
        self.k.own(long) * e * e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{AssetId, CorrelationMatrix, MarketParameters};
    use crate::optimizer::ActiveWeightOptimizer;

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

    fn two_asset_model(eth_staking: f64, sol_staking: f64) -> ThresholdVarianceModel {
        let market = reference_market();
        let optimizer = ActiveWeightOptimizer::new(market.covariance().unwrap()).unwrap();
        let k = optimizer
            .k_factors(&[1, 3], market.benchmark_weights())
            .unwrap();

        ThresholdVarianceModel::new(
            k,
            vec![
                StakedAssetSpec {
                    threshold: 1.0 - eth_staking,
                    unbonding_days: 10,
                },
                StakedAssetSpec {
                    threshold: 1.0 - sol_staking,
                    unbonding_days: 2,
                },
            ],
        )
        .unwrap()
    }

    fn single_asset_model(staking: f64) -> ThresholdVarianceModel {
        let market = reference_market();
        let optimizer = ActiveWeightOptimizer::new(market.covariance().unwrap()).unwrap();
        let k = optimizer
            .k_factors(&[1], market.benchmark_weights())
            .unwrap();

        ThresholdVarianceModel::new(
            k,
            vec![StakedAssetSpec {
                threshold: 1.0 - staking,
                unbonding_days: 10,
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_zero_below_threshold() {
        let model = single_asset_model(0.70);

        assert_eq!(model.variance_full(0.05), 0.0);
        assert_eq!(model.variance_full(0.30), 0.0);
        assert_eq!(model.variance_partial(0.30), 0.0);
        assert!(model.variance_full(0.31) > 0.0);
    }

    #[test]
    fn test_single_asset_quadratic_above_threshold() {
        let model = single_asset_model(0.80);
        let k = model.k_factors().own(0);

        let var = model.variance_full(0.30);
        assert!((var - k * 0.01).abs() < 1e-18);
        // Partial equals full for one staked asset.
        assert_eq!(model.variance_partial(0.30), var);
    }

    #[test]
    fn test_two_asset_full_variance_includes_cross_term() {
        let model = two_asset_model(0.80, 0.90);
        let k = model.k_factors();

        let r = 0.30;
        let e_eth = r - 0.20;
        let e_sol = r - 0.10;
        let expected = k.own(0) * e_eth * e_eth
            + 2.0 * k.cross(0, 1) * e_eth * e_sol
            + k.own(1) * e_sol * e_sol;

        assert!((model.variance_full(r) - expected).abs() < 1e-18);
    }

    #[test]
    fn test_partial_uses_longer_unbonding_asset() {
        let model = two_asset_model(0.80, 0.90);
        let k = model.k_factors();

        // ETH unbonds in 10 days, SOL in 2: the partial segment carries
        // only the ETH overweight.
        assert_eq!(model.long_position(), 0);
        assert_eq!(model.d_short(), 2);
        assert_eq!(model.d_long(), 10);

        let var = model.variance_partial(0.30);
        assert!((var - k.own(0) * 0.01).abs() < 1e-18);
    }

    #[test]
    fn test_equal_thresholds_collapse_cross_term() {
        let model = two_asset_model(0.85, 0.85);
        let k = model.k_factors();

        let r = 0.30;
        let e = r - 0.15;
        let expected = (k.own(0) + 2.0 * k.cross(0, 1) + k.own(1)) * e * e;
        assert!((model.variance_full(r) - expected).abs() < 1e-18);
    }

    #[test]
    fn test_rejects_mismatched_specs() {
        let market = reference_market();
        let optimizer = ActiveWeightOptimizer::new(market.covariance().unwrap()).unwrap();
        let k = optimizer
            .k_factors(&[1, 3], market.benchmark_weights())
            .unwrap();

        let result = ThresholdVarianceModel::new(
            k,
            vec![StakedAssetSpec {
                threshold: 0.2,
                unbonding_days: 10,
            }],
        );
        assert!(result.is_err());
    }
}
