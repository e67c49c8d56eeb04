//! Redemption behavior: discrete size distributions and episode
//! frequency.
//!
//! Redemptions are modeled as independent draws from a discrete
//! probability mass function over redemption sizes (fractions of NAV),
//! arriving at an expected rate of λ episodes per year. Path-dependent
//! effects and correlation across episodes are out of scope.

mod distribution;

pub use distribution::{RedemptionDistribution, RedemptionParams};
