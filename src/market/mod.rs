//! Market structure: assets, benchmark weights, volatilities and the
//! correlation/covariance machinery.
//!
//! This module provides the market-side inputs of the tracking-error
//! pipeline:
//!
//! - [`AssetId`]: unique identifier for benchmark constituents
//! - [`CorrelationMatrix`]: symmetric correlation matrix with validation
//! - [`MarketParameters`]: ordered benchmark weights and volatilities
//! - [`CovarianceBuilder`]: converts volatilities + correlations into Σ
//! - [`StakingConfig`] / [`FundConfig`]: staking and fund-level settings
//!
//! # Example
//!
//! ```rust
//! use staking_analytics_rs::market::{AssetId, CorrelationMatrix, MarketParameters};
//!
//! let assets: Vec<AssetId> = ["BTC", "ETH", "SOL"].iter().map(|s| AssetId::new(*s)).collect();
//! let correlations = CorrelationMatrix::grouped(
//!     assets.clone(),
//!     (&assets[0], &assets[1]),
//!     0.70,
//!     0.60,
//! ).unwrap();
//!
//! let market = MarketParameters::new(
//!     assets,
//!     vec![0.80, 0.15, 0.05],
//!     vec![0.039, 0.048, 0.071],
//!     correlations,
//! ).unwrap();
//!
//! let cov = market.covariance().unwrap();
//! assert_eq!(cov.nrows(), 3);
//! ```

mod correlation;
mod covariance;
mod params;

pub use correlation::CorrelationMatrix;
pub use covariance::CovarianceBuilder;
pub use params::{AssetId, FundConfig, MarketParameters, StakingConfig};
