//! Net economic benefit of staking under a tracking-difference budget.

mod net_benefit;

pub use net_benefit::{NetBenefitBreakdown, NetBenefitCalculator, YieldBenefit};
