//! Constrained active-weight optimization.
//!
//! Solves the risk-minimizing portfolio deviation required to absorb a
//! forced overweight in one or more staked assets, via Lagrange
//! multipliers under linear equality constraints.
//!
//! # Components
//!
//! - [`ActiveWeightOptimizer`]: the generic k-constrained Lagrange solver
//! - [`HedgeVector`]: minimum-variance active-weight direction per unit
//!   forced overweight
//! - [`KFactors`]: scalar coefficients converting squared excess
//!   redemption into variance

mod lagrange;

pub use lagrange::{ActiveWeightOptimizer, HedgeVector, KFactors};
