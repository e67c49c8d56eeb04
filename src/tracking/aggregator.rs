//! Annualized tracking-error aggregation over redemption distributions.

use crate::redemption::RedemptionDistribution;
use crate::tracking::variance::ThresholdVarianceModel;
use crate::types::error::{StakingError, StakingResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decomposition of the annualized tracking error into per-asset and
/// cross-term contributions.
///
/// `per_asset_te` holds the hypothetical single-asset tracking errors
/// (each asset under its own unbonding period); the independence
/// approximation is `√(Σ TEᵢ²)`. With a positive cross k-factor the
/// exact tracking error exceeds it; the gap is the correlation cost of
/// staking both assets at once.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackingErrorDecomposition {
    /// Exact annualized tracking error.
    pub tracking_error: f64,
    /// Hypothetical tracking error from each staked asset alone.
    pub per_asset_te: Vec<f64>,
    /// `√(Σ TEᵢ²)`: the tracking error if the assets did not interact.
    pub independence_approx: f64,
    /// `tracking_error − independence_approx`.
    pub correlation_cost: f64,
    /// Correlation cost as a percentage increase over the approximation.
    pub correlation_cost_pct: f64,
    /// Share of total variance contributed by each staked asset, percent.
    pub per_asset_contribution_pct: Vec<f64>,
    /// Share of total variance contributed by the cross term, percent.
    pub cross_contribution_pct: f64,
}

/// Delta-method confidence interval for the tracking-error estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackingErrorInterval {
    /// Lower bound, floored at zero.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// Combines episode frequency, episode duration and distributional
/// expectations into an annualized tracking error.
///
/// The aggregation works in variance-days: each episode contributes its
/// instantaneous daily variance for as long as the relevant overweights
/// persist, redemption counts scale linearly with the measurement window
/// and standard deviation scales with its square root, so the result is
/// invariant to the window over which λ is quoted (a tested property).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingErrorAggregator {
    redemptions_per_year: f64,
}

impl TrackingErrorAggregator {
    /// Creates an aggregator for an expected annual episode count λ.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidDistribution`] if λ is negative or
    /// not finite.
    pub fn new(redemptions_per_year: f64) -> StakingResult<Self> {
        if redemptions_per_year < 0.0 || !redemptions_per_year.is_finite() {
            return Err(StakingError::InvalidDistribution(format!(
                "redemptions_per_year must be non-negative, got {redemptions_per_year}"
            )));
        }
        Ok(Self {
            redemptions_per_year,
        })
    }

    /// Returns the annual episode rate λ.
    #[must_use]
    pub fn redemptions_per_year(&self) -> f64 {
        self.redemptions_per_year
    }

    /// Expected variance-days per episode:
    /// `d_short·E[Var_full(R)] + (d_long − d_short)·E[Var_partial(R)]`.
    fn expected_variance_days(
        model: &ThresholdVarianceModel,
        distribution: &RedemptionDistribution,
    ) -> f64 {
        let d_short = f64::from(model.d_short());
        let d_long = f64::from(model.d_long());

        let exp_full = distribution.expectation(|r| model.variance_full(r));
        let exp_partial = distribution.expectation(|r| model.variance_partial(r));

        d_short * exp_full + (d_long - d_short) * exp_partial
    }

    /// Annualized tracking error `√(λ·variance_days_per_episode)`.
    ///
    /// For a single staked asset this reduces to `√(λ·d·E[var(R)])`.
    #[must_use]
    pub fn annual_tracking_error(
        &self,
        model: &ThresholdVarianceModel,
        distribution: &RedemptionDistribution,
    ) -> f64 {
        (self.redemptions_per_year * Self::expected_variance_days(model, distribution)).sqrt()
    }

    /// Tracking error measured over a `window_days` trading-day window,
    /// with the episode rate scaled to `λ·window/trading_days`.
    ///
    /// Annualizing the result with [`Self::annualize`] reproduces
    /// [`Self::annual_tracking_error`] exactly (to floating rounding).
    #[must_use]
    pub fn windowed_tracking_error(
        &self,
        model: &ThresholdVarianceModel,
        distribution: &RedemptionDistribution,
        window_days: f64,
        trading_days_per_year: u32,
    ) -> f64 {
        let lambda_window =
            self.redemptions_per_year * window_days / f64::from(trading_days_per_year);
        (lambda_window * Self::expected_variance_days(model, distribution)).sqrt()
    }

    /// Annualizes a windowed tracking error by `√(trading_days/window)`.
    #[must_use]
    pub fn annualize(windowed_te: f64, window_days: f64, trading_days_per_year: u32) -> f64 {
        windowed_te * (f64::from(trading_days_per_year) / window_days).sqrt()
    }

    /// Decomposes the tracking error into per-asset and cross-term
    /// contributions.
    ///
    /// Each asset's standalone variance uses its own unbonding period
    /// (`λ·dᵢ·kᵢᵢ·E[(r−τᵢ)²₊]`); the cross term lives only in the shared
    /// `d_short` segment.
    #[must_use]
    pub fn decompose(
        &self,
        model: &ThresholdVarianceModel,
        distribution: &RedemptionDistribution,
    ) -> TrackingErrorDecomposition {
        let lambda = self.redemptions_per_year;
        let k = model.k_factors();
        let n = model.asset_count();

        let mut per_asset_var = Vec::with_capacity(n);
        for i in 0..n {
            let d_i = f64::from(model.staked()[i].unbonding_days);
            let exp_sq = distribution.expectation(|r| {
                let e = model.excess(i, r);
                e * e
            });
            per_asset_var.push(lambda * d_i * k.own(i) * exp_sq);
        }

        let cross_var = if n == 2 {
            let d_short = f64::from(model.d_short());
            let exp_cross = distribution.expectation(|r| model.excess(0, r) * model.excess(1, r));
            lambda * d_short * 2.0 * k.cross(0, 1) * exp_cross
        } else {
            0.0
        };

        let total_var: f64 = per_asset_var.iter().sum::<f64>() + cross_var;
        let tracking_error = self.annual_tracking_error(model, distribution);

        let per_asset_te: Vec<f64> = per_asset_var.iter().map(|v| v.sqrt()).collect();
        let independence_approx = per_asset_var.iter().sum::<f64>().sqrt();
        let correlation_cost = tracking_error - independence_approx;
        let correlation_cost_pct = if independence_approx > 0.0 {
            (tracking_error / independence_approx - 1.0) * 100.0
        } else {
            0.0
        };

        let per_asset_contribution_pct = per_asset_var
            .iter()
            .map(|&v| {
                if total_var > 0.0 {
                    v / total_var * 100.0
                } else {
                    0.0
                }
            })
            .collect();
        let cross_contribution_pct = if total_var > 0.0 {
            cross_var / total_var * 100.0
        } else {
            0.0
        };

        TrackingErrorDecomposition {
            tracking_error,
            per_asset_te,
            independence_approx,
            correlation_cost,
            correlation_cost_pct,
            per_asset_contribution_pct,
            cross_contribution_pct,
        }
    }

    /// Delta-method confidence interval for the annualized tracking
    /// error, treating the episode count as Poisson and redemption sizes
    /// as independent draws.
    ///
    /// With `f(R)` the variance-days of one episode, the estimator
    /// `√(Σf(Rᵢ))` has `Var[√X] ≈ Var[X]/(4·E[X]) = E[f²]/(4·E[f])`.
    /// `z` is the two-sided normal quantile (e.g. 1.96 for 95%).
    #[must_use]
    pub fn confidence_interval(
        &self,
        model: &ThresholdVarianceModel,
        distribution: &RedemptionDistribution,
        z: f64,
    ) -> TrackingErrorInterval {
        let te = self.annual_tracking_error(model, distribution);
        if te <= 0.0 {
            return TrackingErrorInterval {
                lower: 0.0,
                upper: 0.0,
            };
        }

        let d_short = f64::from(model.d_short());
        let d_long = f64::from(model.d_long());
        let per_episode = |r: f64| {
            d_short * model.variance_full(r) + (d_long - d_short) * model.variance_partial(r)
        };

        let exp_f = distribution.expectation(per_episode);
        let exp_f_sq = distribution.expectation(|r| {
            let f = per_episode(r);
            f * f
        });

        let te_std = (exp_f_sq / (4.0 * exp_f)).sqrt();
        let margin = z * te_std;

        TrackingErrorInterval {
            lower: (te - margin).max(0.0),
            upper: te + margin,
        }
    }
}
