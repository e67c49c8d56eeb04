//! Shared types used across the crate.

pub mod error;

pub use error::{StakingError, StakingResult};

/// Asset covariance matrix, entries `Σ_ij = ρ_ij·σ_i·σ_j`.
pub type CovarianceMatrix = nalgebra::DMatrix<f64>;
