//! Pipeline assembly and the public calculation entry points.

use crate::benefit::{NetBenefitBreakdown, NetBenefitCalculator};
use crate::market::{AssetId, FundConfig, MarketParameters, StakingConfig};
use crate::optimizer::ActiveWeightOptimizer;
use crate::redemption::RedemptionParams;
use crate::sensitivity::{GridAxis, GridCell, GridPoint, SensitivityGrid, SensitivityGridEngine};
use crate::tracking::{
    StakedAssetSpec, ThresholdVarianceModel, TrackingErrorAggregator, TrackingErrorDecomposition,
};
use crate::types::error::{StakingError, StakingResult};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete calculation output: decomposition, net benefit, optimal
/// staking levels and the scanned sensitivity grid.
///
/// All fields are derived and immutable; per-asset vectors follow the
/// order of `staked_assets` (benchmark order of the staked constituents).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalculationResult {
    /// Staked assets, in benchmark order.
    pub staked_assets: Vec<AssetId>,
    /// Tracking-error decomposition at the configured staking levels.
    pub decomposition: TrackingErrorDecomposition,
    /// Net-benefit analysis at the configured staking levels.
    pub net_benefit: NetBenefitBreakdown,
    /// Per-asset staking fraction maximizing net benefit on the grid.
    pub optimal_staking_levels: Vec<f64>,
    /// Every scanned grid point.
    pub sensitivity_grid: Vec<GridPoint>,
}

#[derive(Debug, Clone)]
struct StakedEntry {
    id: AssetId,
    weight: f64,
    config: StakingConfig,
}

/// End-to-end tracking-error and net-benefit calculator.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use staking_analytics_rs::calculator::TrackingErrorCalculator;
/// use staking_analytics_rs::market::{
///     AssetId, CorrelationMatrix, FundConfig, MarketParameters, StakingConfig,
/// };
/// use staking_analytics_rs::redemption::{RedemptionDistribution, RedemptionParams};
///
/// let assets: Vec<AssetId> = ["BTC", "ETH", "SOL"].iter().map(|s| AssetId::new(*s)).collect();
/// let correlations = CorrelationMatrix::grouped(
///     assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60,
/// ).unwrap();
/// let market = MarketParameters::new(
///     assets.clone(), vec![0.80, 0.15, 0.05], vec![0.039, 0.048, 0.071], correlations,
/// ).unwrap();
///
/// let mut staking = HashMap::new();
/// staking.insert(assets[1].clone(), StakingConfig::new(0.80, 10, 0.05, 0.70).unwrap());
///
/// let distribution = RedemptionDistribution::from_counts(&[(0.05, 12), (0.30, 1)]).unwrap();
/// let redemption = RedemptionParams::new(18.0, distribution).unwrap();
/// let fund = FundConfig::new(500_000_000.0, 0.0143, 0.015).unwrap();
///
/// let calculator = TrackingErrorCalculator::new(market, staking, redemption, fund).unwrap();
/// assert!(calculator.tracking_error() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct TrackingErrorCalculator {
    market: MarketParameters,
    staked: Vec<StakedEntry>,
    redemption: RedemptionParams,
    fund: FundConfig,
    model: ThresholdVarianceModel,
    aggregator: TrackingErrorAggregator,
}

impl TrackingErrorCalculator {
    /// Builds the pipeline: validates the staking map, constructs the
    /// covariance matrix, runs the constrained Lagrange solve and caches
    /// the resulting k-factors.
    ///
    /// # Errors
    ///
    /// - [`StakingError::InvalidStakingConfig`] if no asset is staked,
    ///   more than two are, or a staked asset is not a benchmark
    ///   constituent
    /// - [`StakingError::InvalidMarketConfig`] /
    ///   [`StakingError::SingularConstraintSystem`] from the market and
    ///   optimizer layers
    pub fn new(
        market: MarketParameters,
        staking: HashMap<AssetId, StakingConfig>,
        redemption: RedemptionParams,
        fund: FundConfig,
    ) -> StakingResult<Self> {
        if staking.is_empty() {
            return Err(StakingError::InvalidStakingConfig(
                "at least one staked asset is required".to_string(),
            ));
        }
        if staking.len() > 2 {
            return Err(StakingError::InvalidStakingConfig(format!(
                "the time-segmented model supports at most two staked assets, got {}",
                staking.len()
            )));
        }

        // Canonical order: benchmark order of the staked constituents.
        let mut staked = Vec::with_capacity(staking.len());
        for (id, config) in staking {
            let index = market.asset_index(&id).ok_or_else(|| {
                StakingError::InvalidStakingConfig(format!(
                    "staked asset {id} is not a benchmark constituent"
                ))
            })?;
            staked.push((index, id, config));
        }
        staked.sort_by_key(|(index, _, _)| *index);

        let optimizer = ActiveWeightOptimizer::new(market.covariance()?)?;
        let pinned: Vec<usize> = staked.iter().map(|(index, _, _)| *index).collect();
        let k = optimizer.k_factors(&pinned, market.benchmark_weights())?;

        let specs: Vec<StakedAssetSpec> = staked
            .iter()
            .map(|(_, _, config)| StakedAssetSpec {
                threshold: config.threshold(),
                unbonding_days: config.unbonding_days,
            })
            .collect();
        let model = ThresholdVarianceModel::new(k, specs)?;

        let aggregator = TrackingErrorAggregator::new(redemption.expected_per_year)?;

        let staked = staked
            .into_iter()
            .map(|(index, id, config)| StakedEntry {
                id,
                weight: market.weight(index),
                config,
            })
            .collect();

        Ok(Self {
            market,
            staked,
            redemption,
            fund,
            model,
            aggregator,
        })
    }

    /// Returns the staked assets in benchmark order.
    #[must_use]
    pub fn staked_assets(&self) -> Vec<AssetId> {
        self.staked.iter().map(|entry| entry.id.clone()).collect()
    }

    /// Returns the market parameters.
    #[must_use]
    pub fn market(&self) -> &MarketParameters {
        &self.market
    }

    /// Annualized tracking error at the configured staking levels.
    #[must_use]
    pub fn tracking_error(&self) -> f64 {
        self.aggregator
            .annual_tracking_error(&self.model, &self.redemption.distribution)
    }

    /// Tracking-error decomposition at the configured staking levels.
    #[must_use]
    pub fn decomposition(&self) -> TrackingErrorDecomposition {
        self.aggregator
            .decompose(&self.model, &self.redemption.distribution)
    }

    /// Net-benefit analysis at the configured staking levels.
    #[must_use]
    pub fn net_benefit(&self) -> NetBenefitBreakdown {
        let staked: Vec<(f64, StakingConfig)> = self
            .staked
            .iter()
            .map(|entry| (entry.weight, entry.config))
            .collect();

        NetBenefitCalculator::new(self.redemption.expected_per_year, &self.fund).evaluate(
            self.tracking_error(),
            &staked,
            &self.redemption.distribution,
        )
    }

    /// Scans the sensitivity grid: each staked asset's axis spans its
    /// baseline staking level to 100%.
    ///
    /// Cells reuse the cached k-factors; only thresholds and yields
    /// change per cell.
    ///
    /// # Errors
    ///
    /// Propagates axis validation failures from degenerate baselines.
    pub fn sensitivity_grid(
        &self,
        engine: &SensitivityGridEngine,
    ) -> StakingResult<SensitivityGrid> {
        let axes: Vec<GridAxis> = self
            .staked
            .iter()
            .map(|entry| GridAxis::new(entry.config.baseline_pct, 1.0))
            .collect::<StakingResult<_>>()?;

        let benefit = NetBenefitCalculator::new(self.redemption.expected_per_year, &self.fund);
        let distribution = &self.redemption.distribution;

        engine.scan(&axes, |levels| {
            let thresholds: Vec<f64> = levels.iter().map(|s| 1.0 - s).collect();
            let model = self.model.with_thresholds(&thresholds);
            let tracking_error = self
                .aggregator
                .annual_tracking_error(&model, distribution);

            let staked: Vec<(f64, StakingConfig)> = self
                .staked
                .iter()
                .zip(levels)
                .map(|(entry, &level)| (entry.weight, entry.config.at_level(level)))
                .collect();
            let breakdown = benefit.evaluate(tracking_error, &staked, distribution);

            GridCell {
                tracking_error,
                yield_benefit: breakdown.total_yield_benefit,
                expected_shortfall: breakdown.expected_shortfall,
                net_benefit_bps: breakdown.net_benefit_bps,
            }
        })
    }

    /// Runs the full pipeline: decomposition, net benefit, sensitivity
    /// grid and optimal staking levels.
    ///
    /// # Errors
    ///
    /// See [`TrackingErrorCalculator::sensitivity_grid`].
    pub fn compute(&self) -> StakingResult<CalculationResult> {
        let grid = self.sensitivity_grid(&SensitivityGridEngine::default_resolution())?;
        let optimal_staking_levels = grid.optimal().staking_levels.clone();

        Ok(CalculationResult {
            staked_assets: self.staked_assets(),
            decomposition: self.decomposition(),
            net_benefit: self.net_benefit(),
            optimal_staking_levels,
            sensitivity_grid: grid.points,
        })
    }
}

/// One-shot pipeline run: builds a [`TrackingErrorCalculator`] and
/// returns its [`CalculationResult`].
///
/// # Errors
///
/// See [`TrackingErrorCalculator::new`] and
/// [`TrackingErrorCalculator::compute`].
pub fn compute(
    market: MarketParameters,
    staking: HashMap<AssetId, StakingConfig>,
    redemption: RedemptionParams,
    fund: FundConfig,
) -> StakingResult<CalculationResult> {
    TrackingErrorCalculator::new(market, staking, redemption, fund)?.compute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::CorrelationMatrix;
    use crate::redemption::RedemptionDistribution;

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

    fn reference_redemption() -> RedemptionParams {
        let distribution = RedemptionDistribution::from_probabilities(&[
            (0.05, 0.667),
            (0.10, 0.167),
            (0.20, 0.111),
            (0.30, 0.056),
        ])
        .unwrap();
        RedemptionParams::new(18.0, distribution).unwrap()
    }

    fn eth_only_calculator(staking_pct: f64, fund: FundConfig) -> TrackingErrorCalculator {
        let mut staking = HashMap::new();
        staking.insert(
            AssetId::new("ETH"),
            StakingConfig::new(staking_pct, 10, 0.05, 0.70).unwrap(),
        );
        TrackingErrorCalculator::new(reference_market(), staking, reference_redemption(), fund)
            .unwrap()
    }

    fn eth_sol_calculator() -> TrackingErrorCalculator {
        let mut staking = HashMap::new();
        staking.insert(
            AssetId::new("ETH"),
            StakingConfig::new(0.80, 10, 0.03, 0.70).unwrap(),
        );
        staking.insert(
            AssetId::new("SOL"),
            StakingConfig::new(0.90, 2, 0.073, 0.70).unwrap(),
        );
        TrackingErrorCalculator::new(
            reference_market(),
            staking,
            reference_redemption(),
            FundConfig::new(500_000_000.0, 0.0143, 0.015).unwrap(),
        )
        .unwrap()
    }

    /// A fund whose entire tracking-difference budget is already spent,
    /// so the expected shortfall flows straight into the net benefit.
    fn exhausted_budget() -> FundConfig {
        FundConfig::new(500_000_000.0, 0.015, 0.015).unwrap()
    }

    #[test]
    fn test_single_asset_scenario_at_80_pct() {
        let calculator = eth_only_calculator(0.80, exhausted_budget());

        let te = calculator.tracking_error();
        assert!((te - 1.0337457796632e-3).abs() < 1e-9);

        let benefit = calculator.net_benefit();
        assert!((benefit.net_benefit_bps - 1.265655).abs() < 1e-3);
        assert!(benefit.net_benefit_bps > 0.0);
    }

    #[test]
    fn test_single_asset_scenario_at_full_staking() {
        let calculator = eth_only_calculator(1.0, exhausted_budget());

        let te = calculator.tracking_error();
        assert!((te - 4.9456275e-3).abs() < 1e-8);

        // Tracking cost exceeds the yield benefit.
        let benefit = calculator.net_benefit();
        assert!((benefit.net_benefit_bps - (-1.694155)).abs() < 1e-3);
        assert!(benefit.net_benefit_bps < 0.0);
    }

    #[test]
    fn test_zero_te_at_baseline() {
        let calculator = eth_only_calculator(0.70, exhausted_budget());
        assert_eq!(calculator.tracking_error(), 0.0);
    }

    #[test]
    fn test_two_asset_scenario() {
        let calculator = eth_sol_calculator();

        assert_eq!(
            calculator.staked_assets(),
            vec![AssetId::new("ETH"), AssetId::new("SOL")]
        );

        let te = calculator.tracking_error();
        assert!((te - 1.268440152308e-3).abs() < 1e-9);

        let benefit = calculator.net_benefit();
        assert!((benefit.net_benefit_bps - 8.946097).abs() < 1e-3);
        // Shortfall stays inside the default budget.
        assert_eq!(benefit.budget_deficit, 0.0);
    }

    #[test]
    fn test_two_asset_grid_optimum() {
        let calculator = eth_sol_calculator();
        let grid = calculator
            .sensitivity_grid(&SensitivityGridEngine::default_resolution())
            .unwrap();

        assert_eq!(grid.points.len(), 31 * 31);

        let optimal = grid.optimal();
        assert!((optimal.staking_levels[0] - 0.81).abs() < 1e-9);
        assert!((optimal.staking_levels[1] - 1.00).abs() < 1e-9);
        assert!((optimal.net_benefit_bps - 12.151256).abs() < 1e-3);
    }

    #[test]
    fn test_compute_bundles_everything() {
        let calculator = eth_sol_calculator();
        let result = calculator.compute().unwrap();

        assert_eq!(result.staked_assets.len(), 2);
        assert_eq!(result.optimal_staking_levels.len(), 2);
        assert_eq!(result.sensitivity_grid.len(), 961);
        assert!(
            (result.decomposition.tracking_error - result.net_benefit.tracking_error).abs()
                < 1e-15
        );

        // The reported optimum is the best point on the grid.
        let best = result
            .sensitivity_grid
            .iter()
            .map(|p| p.net_benefit_bps)
            .fold(f64::NEG_INFINITY, f64::max);
        let optimal_point = result
            .sensitivity_grid
            .iter()
            .find(|p| p.staking_levels == result.optimal_staking_levels)
            .unwrap();
        assert_eq!(optimal_point.net_benefit_bps, best);
    }

    #[test]
    fn test_single_asset_grid_is_ladder() {
        let calculator = eth_only_calculator(0.80, exhausted_budget());
        let grid = calculator
            .sensitivity_grid(&SensitivityGridEngine::default_resolution())
            .unwrap();

        assert_eq!(grid.points.len(), 31);
        for point in &grid.points {
            assert_eq!(point.staking_levels.len(), 1);
        }
    }

    #[test]
    fn test_rejects_unknown_staked_asset() {
        let mut staking = HashMap::new();
        staking.insert(
            AssetId::new("DOGE"),
            StakingConfig::new(0.80, 10, 0.05, 0.70).unwrap(),
        );

        let result = TrackingErrorCalculator::new(
            reference_market(),
            staking,
            reference_redemption(),
            exhausted_budget(),
        );
        assert!(matches!(
            result,
            Err(StakingError::InvalidStakingConfig(_))
        ));
    }

    #[test]
    fn test_rejects_three_staked_assets() {
        let mut staking = HashMap::new();
        for asset in ["ETH", "SOL", "ADA"] {
            staking.insert(
                AssetId::new(asset),
                StakingConfig::new(0.80, 10, 0.05, 0.70).unwrap(),
            );
        }

        let result = TrackingErrorCalculator::new(
            reference_market(),
            staking,
            reference_redemption(),
            exhausted_budget(),
        );
        assert!(matches!(
            result,
            Err(StakingError::InvalidStakingConfig(_))
        ));
    }

    #[test]
    fn test_rejects_empty_staking() {
        let result = TrackingErrorCalculator::new(
            reference_market(),
            HashMap::new(),
            reference_redemption(),
            exhausted_budget(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_compute_free_function() {
        let mut staking = HashMap::new();
        staking.insert(
            AssetId::new("ETH"),
            StakingConfig::new(0.80, 10, 0.05, 0.70).unwrap(),
        );

        let result = compute(
            reference_market(),
            staking,
            reference_redemption(),
            exhausted_budget(),
        )
        .unwrap();

        assert_eq!(result.staked_assets, vec![AssetId::new("ETH")]);
        assert!((result.decomposition.tracking_error - 1.0337457796632e-3).abs() < 1e-9);
    }
}
