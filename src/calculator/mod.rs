//! End-to-end tracking-error calculation pipeline.
//!
//! [`TrackingErrorCalculator`] wires the components together: covariance
//! construction, the constrained Lagrange solve, the threshold variance
//! model, distributional aggregation, net-benefit analysis and the
//! sensitivity grid. Construct it once per market/staking structure; the
//! expensive matrix work happens in [`TrackingErrorCalculator::new`] and
//! every query afterwards reuses the cached k-factors.
//!
//! The one-shot [`compute`] function covers the common case.

mod pipeline;

pub use pipeline::{CalculationResult, TrackingErrorCalculator, compute};
