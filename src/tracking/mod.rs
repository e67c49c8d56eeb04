//! Tracking-error computation: threshold variance, annualized
//! aggregation and benchmark replication.
//!
//! # Components
//!
//! - [`ThresholdVarianceModel`]: maps a redemption size to instantaneous
//!   tracking variance through the optimizer's k-factors
//! - [`TrackingErrorAggregator`]: combines episode frequency, duration
//!   and distributional expectations into an annualized tracking error
//! - [`PairReplication`]: closed-form two-asset benchmark replication
//!
//! # Mathematical Background
//!
//! Single staked asset with threshold τ and k-factor k:
//!
//! ```text
//! var(r) = k · max(0, r − τ)²
//! TE     = √(λ · d · E[var(R)])
//! ```
//!
//! Two staked assets with unbonding periods d_short ≤ d_long split each
//! episode into a full segment (both overweights active) and a partial
//! segment (only the longer-unbonding asset still overweighted):
//!
//! ```text
//! TE = √(λ · (d_short·E[Var_full(R)] + (d_long − d_short)·E[Var_partial(R)]))
//! ```

mod aggregator;
mod replication;
mod variance;

pub use aggregator::{
    TrackingErrorAggregator, TrackingErrorDecomposition, TrackingErrorInterval,
};
pub use replication::{PairReplication, optimal_pair_replication, pair_replication_tracking_error};
pub use variance::{StakedAssetSpec, ThresholdVarianceModel};
