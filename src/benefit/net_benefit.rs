//! Net benefit: staking yield against expected tracking shortfall.
//!
//! # Mathematical Model
//!
//! Each staked asset earns two yield components:
//!
//! ```text
//! baseline = w · max(0, s − s₀) · y              (above the reference level)
//! marginal = w · y · (λ·d/365) · E[(R − τ)₊]     (episode overweight accrual)
//! ```
//!
//! The cost side approximates expected underperformance when the
//! tracking error works against the fund by the half-normal mean:
//!
//! ```text
//! shortfall = −TE · √(2/π) · 0.5
//! deficit   = min(0, budget − |shortfall|)
//! net       = Σ benefits + deficit
//! ```
//!
//! Day count: yield accrues over 365 calendar days; episode variance is
//! aggregated in trading days upstream.

use crate::market::{FundConfig, StakingConfig};
use crate::redemption::RedemptionDistribution;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Days used for yield accrual of episode overweights.
const YIELD_ACCRUAL_DAYS: f64 = 365.0;

/// Yield benefit decomposition for one staked asset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct YieldBenefit {
    /// Benefit from staking above the baseline reference level.
    pub baseline: f64,
    /// Benefit from the marginal overweight held during episodes.
    pub marginal: f64,
    /// `baseline + marginal`.
    pub total: f64,
}

/// Net benefit figures for one staking configuration.
///
/// Derived, immutable output: recomputed on every parameter change,
/// never mutated in place. Per-asset entries follow the pinned-asset
/// order of the calculation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetBenefitBreakdown {
    /// Annualized tracking error the costs were derived from.
    pub tracking_error: f64,
    /// Per-asset yield benefit decomposition.
    pub per_asset: Vec<YieldBenefit>,
    /// Sum of all per-asset totals.
    pub total_yield_benefit: f64,
    /// Half-normal expected shortfall, `−TE·√(2/π)·0.5` (non-positive).
    pub expected_shortfall: f64,
    /// Remaining tracking-difference budget, `cap_td − current_td`.
    pub tracking_difference_budget: f64,
    /// `min(0, budget − |shortfall|)` (non-positive).
    pub budget_deficit: f64,
    /// `total_yield_benefit + budget_deficit`, as a fraction.
    pub net_benefit: f64,
    /// Net benefit in basis points.
    pub net_benefit_bps: f64,
}

/// Combines staking yield benefits with the expected tracking-error cost.
///
/// Stateless: every evaluation is a pure function of the tracking error,
/// staking configurations and redemption distribution passed in. The
/// `current_td ≤ cap_td` invariant is enforced when [`FundConfig`] is
/// constructed, so no clamping happens here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetBenefitCalculator {
    redemptions_per_year: f64,
    tracking_difference_budget: f64,
}

impl NetBenefitCalculator {
    /// Creates a calculator for an annual episode rate and fund budget.
    #[must_use]
    pub fn new(redemptions_per_year: f64, fund: &FundConfig) -> Self {
        Self {
            redemptions_per_year,
            tracking_difference_budget: fund.budget(),
        }
    }

    /// Yield benefit for one staked asset with benchmark weight `w`.
    #[must_use]
    pub fn asset_benefit(
        &self,
        benchmark_weight: f64,
        staking: &StakingConfig,
        distribution: &RedemptionDistribution,
    ) -> YieldBenefit {
        let baseline = benchmark_weight
            * (staking.staking_pct - staking.baseline_pct).max(0.0)
            * staking.annual_yield;

        let threshold = staking.threshold();
        let expected_excess = distribution.expectation(|r| (r - threshold).max(0.0));
        let episode_fraction =
            self.redemptions_per_year * f64::from(staking.unbonding_days) / YIELD_ACCRUAL_DAYS;
        let marginal =
            benchmark_weight * staking.annual_yield * episode_fraction * expected_excess;

        YieldBenefit {
            baseline,
            marginal,
            total: baseline + marginal,
        }
    }

    /// Evaluates the full net-benefit breakdown for a staking
    /// configuration and its already-computed tracking error.
    #[must_use]
    pub fn evaluate(
        &self,
        tracking_error: f64,
        staked: &[(f64, StakingConfig)],
        distribution: &RedemptionDistribution,
    ) -> NetBenefitBreakdown {
        let per_asset: Vec<YieldBenefit> = staked
            .iter()
            .map(|(weight, config)| self.asset_benefit(*weight, config, distribution))
            .collect();
        let total_yield_benefit: f64 = per_asset.iter().map(|b| b.total).sum();

        let expected_shortfall =
            -tracking_error * (2.0 / std::f64::consts::PI).sqrt() * 0.5;
        let budget_deficit =
            (self.tracking_difference_budget - expected_shortfall.abs()).min(0.0);

        let net_benefit = total_yield_benefit + budget_deficit;

        NetBenefitBreakdown {
            tracking_error,
            per_asset,
            total_yield_benefit,
            expected_shortfall,
            tracking_difference_budget: self.tracking_difference_budget,
            budget_deficit,
            net_benefit,
            net_benefit_bps: net_benefit * 10_000.0,
        }
    }
}
