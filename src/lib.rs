//! Tracking-error and net-benefit analytics for crypto index funds that
//! stake a fraction of one or two constituent assets.
//!
//! Staked holdings cannot be sold during their unbonding period. When a
//! redemption exceeds an asset's liquid fraction, the fund is forced to
//! hold that asset overweight until unbonding completes, and the
//! risk-minimizing hedge of that overweight drives tracking error. This
//! crate prices that effect analytically and weighs it against the
//! staking yield.
//!
//! # Mathematical Model
//!
//! For a redemption of fraction `r` and staking fraction `s` with
//! threshold `τ = 1 − s`, the minimum-variance active weights follow from
//! a Lagrange solve under linear constraints, which reduces tracking
//! variance to scalar k-factors:
//!
//! ```text
//! var(r) = k₁₁·(r − τ₁)²₊ + 2k₁₂·(r − τ₁)₊(r − τ₂)₊ + k₂₂·(r − τ₂)²₊
//! TE     = √(λ · (d_short·E[Var_full] + (d_long − d_short)·E[Var_partial]))
//! ```
//!
//! with λ expected redemption episodes per year and `d` unbonding
//! periods. The net benefit nets staking yield (baseline plus episodic
//! marginal accrual) against a half-normal expected-shortfall proxy
//! under the fund's tracking-difference budget.
//!
//! # Pipeline
//!
//! ```text
//! CovarianceBuilder → ActiveWeightOptimizer → ThresholdVarianceModel
//!     → TrackingErrorAggregator → NetBenefitCalculator
//! ```
//!
//! driven over a staking-level grid by [`sensitivity::SensitivityGridEngine`].
//! The whole pipeline is pure and stateless: no I/O, no shared mutable
//! state, every output a function of its explicit inputs.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use staking_analytics_rs::prelude::*;
//!
//! let assets: Vec<AssetId> = ["BTC", "ETH", "SOL"].iter().map(|s| AssetId::new(*s)).collect();
//! let correlations = CorrelationMatrix::grouped(
//!     assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60,
//! ).unwrap();
//! let market = MarketParameters::new(
//!     assets.clone(), vec![0.80, 0.15, 0.05], vec![0.039, 0.048, 0.071], correlations,
//! ).unwrap();
//!
//! let mut staking = HashMap::new();
//! staking.insert(assets[1].clone(), StakingConfig::new(0.85, 10, 0.04, 0.70).unwrap());
//!
//! let distribution = RedemptionDistribution::from_counts(&[
//!     (0.05, 12), (0.10, 3), (0.20, 2), (0.30, 1),
//! ]).unwrap();
//! let redemption = RedemptionParams::new(18.0, distribution).unwrap();
//! let fund = FundConfig::new(500_000_000.0, 0.0143, 0.015).unwrap();
//!
//! let result = compute(market, staking, redemption, fund).unwrap();
//!
//! println!(
//!     "TE {:.4}%, net benefit {:+.2} bps, optimal ETH staking {:.0}%",
//!     result.decomposition.tracking_error * 100.0,
//!     result.net_benefit.net_benefit_bps,
//!     result.optimal_staking_levels[0] * 100.0,
//! );
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` on the public value types
//! - `parallel`: distribute the sensitivity grid scan via rayon

pub mod benefit;
pub mod calculator;
pub mod market;
pub mod optimizer;
pub mod redemption;
pub mod sensitivity;
pub mod tracking;
pub mod types;

pub use types::error::{StakingError, StakingResult};
pub use types::CovarianceMatrix;

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::benefit::{NetBenefitBreakdown, NetBenefitCalculator, YieldBenefit};
    pub use crate::calculator::{CalculationResult, TrackingErrorCalculator, compute};
    pub use crate::market::{
        AssetId, CorrelationMatrix, CovarianceBuilder, FundConfig, MarketParameters,
        StakingConfig,
    };
    pub use crate::optimizer::{ActiveWeightOptimizer, HedgeVector, KFactors};
    pub use crate::redemption::{RedemptionDistribution, RedemptionParams};
    pub use crate::sensitivity::{GridAxis, GridPoint, SensitivityGrid, SensitivityGridEngine};
    pub use crate::tracking::{
        PairReplication, ThresholdVarianceModel, TrackingErrorAggregator,
        TrackingErrorDecomposition, optimal_pair_replication,
    };
    pub use crate::types::error::{StakingError, StakingResult};
}
