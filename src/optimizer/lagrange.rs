//! Lagrange solver for minimum-variance active weights.
//!
//! # Mathematical Model
//!
//! The optimizer minimizes the quadratic tracking variance
//!
//! ```text
//! min  ½ aᵗ Σ a    subject to    C a = c
//! ```
//!
//! where `a` is the active-weight vector, `Σ` the asset covariance matrix
//! and `C` stacks one "fully invested" constraint (Σᵢ aᵢ = 0) with one
//! unit-row constraint per pinned asset forcing `a_i = δ_i`.
//!
//! The first-order conditions give
//!
//! ```text
//! λ  = (C Σ⁻¹ Cᵗ)⁻¹ c
//! a* = Σ⁻¹ Cᵗ λ
//! ```
//!
//! Because the right-hand side `c = Σᵢ δ_i·e_i` is linear in the pinned
//! overweights, the solution decomposes as `a* = Σᵢ δ_i·v_i` where
//!
//! ```text
//! v_i = Σ⁻¹ Cᵗ (C Σ⁻¹ Cᵗ)⁻¹ e_i
//! ```
//!
//! is the **hedge vector** for pinned asset `i`, computed once per
//! covariance/constraint structure and reused across every redemption
//! scenario. The scalar **k-factors**
//!
//! ```text
//! k_ij = w_i · w_j · (v_iᵗ Σ v_j)
//! ```
//!
//! then fully characterize tracking variance as a function of overweight
//! sizes without repeating the matrix solve.
//!
//! Cross k-factors may be positive: pinning a second asset removes
//! degrees of freedom from the hedge, so two staked assets that are both
//! positively correlated with the rest of the benchmark interfere with
//! each other's hedges. That is a correlation cost, not a bug.

use crate::types::CovarianceMatrix;
use crate::types::error::{StakingError, StakingResult};
use nalgebra::{DMatrix, DVector};

/// Relative determinant threshold below which the constraint Gram matrix
/// is treated as singular.
const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Minimum-variance active-weight direction per unit forced overweight
/// in one pinned asset.
///
/// Owned by the optimizer's result; consumed read-only by the variance
/// model.
#[derive(Debug, Clone, PartialEq)]
pub struct HedgeVector {
    /// Index of the pinned asset in covariance order.
    pub asset: usize,
    /// Active weight per asset, per unit overweight of the pinned asset.
    pub direction: DVector<f64>,
}

impl HedgeVector {
    /// Returns the direction as a slice in covariance asset order.
    #[must_use]
    pub fn components(&self) -> &[f64] {
        self.direction.as_slice()
    }
}

/// Scalar variance coefficients for a fixed covariance/constraint
/// structure.
///
/// `k_ij = w_i·w_j·(v_iᵗ Σ v_j)` over the pinned assets; the diagonal
/// entries convert squared excess redemption into variance, the
/// off-diagonal entries carry the cross term between two staked assets.
#[derive(Debug, Clone, PartialEq)]
pub struct KFactors {
    assets: Vec<usize>,
    values: DMatrix<f64>,
    hedge_vectors: Vec<HedgeVector>,
}

impl KFactors {
    /// Returns the number of pinned assets.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Returns the pinned asset indices in covariance order.
    #[must_use]
    pub fn assets(&self) -> &[usize] {
        &self.assets
    }

    /// Own k-factor `k_ii` for the `i`-th pinned asset.
    #[must_use]
    pub fn own(&self, i: usize) -> f64 {
        self.values[(i, i)]
    }

    /// Cross k-factor `k_ij` between the `i`-th and `j`-th pinned assets.
    #[must_use]
    pub fn cross(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Returns the hedge vectors the k-factors were derived from, in
    /// pinned-asset order.
    #[must_use]
    pub fn hedge_vectors(&self) -> &[HedgeVector] {
        &self.hedge_vectors
    }
}

/// Calculates risk-minimizing active weights via Lagrange multipliers.
///
/// One generic solver covers any number of pinned assets; the single- and
/// two-asset tracking-error formulas are derived from the same code path.
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::market::{AssetId, CorrelationMatrix, MarketParameters};
/// use staking_analytics_rs::optimizer::ActiveWeightOptimizer;
///
/// let assets: Vec<AssetId> = ["BTC", "ETH", "SOL"].iter().map(|s| AssetId::new(*s)).collect();
/// let correlations = CorrelationMatrix::grouped(
///     assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60,
/// ).unwrap();
/// let market = MarketParameters::new(
///     assets, vec![0.80, 0.15, 0.05], vec![0.039, 0.048, 0.071], correlations,
/// ).unwrap();
///
/// let optimizer = ActiveWeightOptimizer::new(market.covariance().unwrap()).unwrap();
///
/// // Force a 2% ETH overweight; the hedge spreads the offset across the
/// // rest of the benchmark so that active weights stay fully invested.
/// let active = optimizer.optimize(&[(1, 0.02)]).unwrap();
///
/// assert!((active[1] - 0.02).abs() < 1e-12);
/// assert!(active.iter().sum::<f64>().abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct ActiveWeightOptimizer {
    cov: CovarianceMatrix,
}

impl ActiveWeightOptimizer {
    /// Creates an optimizer for a covariance matrix.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::SingularConstraintSystem`] if the matrix is
    /// not square or not invertible (degenerate covariance).
    pub fn new(cov: CovarianceMatrix) -> StakingResult<Self> {
        if !cov.is_square() {
            return Err(StakingError::SingularConstraintSystem(format!(
                "covariance matrix must be square, got {}x{}",
                cov.nrows(),
                cov.ncols()
            )));
        }

        if Self::effectively_singular(&cov) {
            return Err(StakingError::SingularConstraintSystem(
                "covariance matrix is singular".to_string(),
            ));
        }

        Ok(Self { cov })
    }

    /// Returns the number of assets covered by the covariance matrix.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.cov.nrows()
    }

    /// Computes the hedge vector for each pinned asset.
    ///
    /// The vectors are a fixed property of the covariance/constraint
    /// structure: any combination of overweights is the linear
    /// combination `a* = Σᵢ δ_i·v_i`.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::SingularConstraintSystem`] if the
    /// constraint Gram matrix `C Σ⁻¹ Cᵗ` is not invertible (redundant
    /// constraints), or [`StakingError::InvalidMarketConfig`] for pinned
    /// indices outside the asset universe.
    pub fn hedge_vectors(&self, pinned: &[usize]) -> StakingResult<Vec<HedgeVector>> {
        let n = self.asset_count();
        self.validate_pinned(pinned)?;

        // C: fully-invested row plus one unit row per pinned asset.
        let k = pinned.len() + 1;
        let mut constraints = DMatrix::zeros(k, n);
        for j in 0..n {
            constraints[(0, j)] = 1.0;
        }
        for (row, &asset) in pinned.iter().enumerate() {
            constraints[(row + 1, asset)] = 1.0;
        }

        // Σ⁻¹Cᵗ via LU solve; explicit inversion would compound floating
        // error across repeated grid-scan calls.
        let cov_lu = self.cov.clone().lu();
        let sigma_inv_ct = cov_lu.solve(&constraints.transpose()).ok_or_else(|| {
            StakingError::SingularConstraintSystem(format!(
                "covariance matrix is singular for pinned assets {pinned:?}"
            ))
        })?;

        let gram = &constraints * &sigma_inv_ct;
        if Self::effectively_singular(&gram) {
            return Err(StakingError::SingularConstraintSystem(format!(
                "constraint Gram matrix is singular for pinned assets {pinned:?}"
            )));
        }

        let gram_lu = gram.lu();
        let mut vectors = Vec::with_capacity(pinned.len());
        for (row, &asset) in pinned.iter().enumerate() {
            let mut unit = DVector::zeros(k);
            unit[row + 1] = 1.0;

            let lambda = gram_lu.solve(&unit).ok_or_else(|| {
                StakingError::SingularConstraintSystem(format!(
                    "constraint Gram matrix is singular for pinned assets {pinned:?}"
                ))
            })?;

            vectors.push(HedgeVector {
                asset,
                direction: &sigma_inv_ct * lambda,
            });
        }

        Ok(vectors)
    }

    /// Finds the active weights minimizing tracking variance for explicit
    /// per-asset overweights.
    ///
    /// Constraints: active weights sum to zero, and the active weight of
    /// each pinned asset equals its overweight.
    ///
    /// # Errors
    ///
    /// See [`ActiveWeightOptimizer::hedge_vectors`].
    pub fn optimize(&self, overweights: &[(usize, f64)]) -> StakingResult<DVector<f64>> {
        let pinned: Vec<usize> = overweights.iter().map(|(asset, _)| *asset).collect();
        let vectors = self.hedge_vectors(&pinned)?;

        let mut active = DVector::zeros(self.asset_count());
        for (vector, &(_, delta)) in vectors.iter().zip(overweights) {
            active += &vector.direction * delta;
        }
        Ok(active)
    }

    /// Derives the k-factors `k_ij = w_i·w_j·(v_iᵗ Σ v_j)` for the given
    /// pinned assets and benchmark weights.
    ///
    /// Computed once per covariance/constraint structure; the downstream
    /// variance model and sensitivity grid reuse the result for every
    /// redemption scenario and staking level.
    ///
    /// # Errors
    ///
    /// See [`ActiveWeightOptimizer::hedge_vectors`]; additionally returns
    /// [`StakingError::InvalidMarketConfig`] if the weight slice does not
    /// cover the asset universe.
    pub fn k_factors(
        &self,
        pinned: &[usize],
        benchmark_weights: &[f64],
    ) -> StakingResult<KFactors> {
        if benchmark_weights.len() != self.asset_count() {
            return Err(StakingError::InvalidMarketConfig(format!(
                "{} benchmark weights for {} assets",
                benchmark_weights.len(),
                self.asset_count()
            )));
        }

        let vectors = self.hedge_vectors(pinned)?;

        let k = pinned.len();
        let mut values = DMatrix::zeros(k, k);
        for i in 0..k {
            // Σ v_j columns are reused for the symmetric entries.
            let sigma_v = &self.cov * &vectors[i].direction;
            for j in 0..k {
                let quad = vectors[j].direction.dot(&sigma_v);
                values[(j, i)] =
                    benchmark_weights[pinned[i]] * benchmark_weights[pinned[j]] * quad;
            }
        }

        tracing::debug!(
            "k-factors for pinned assets {:?}: {:?}",
            pinned,
            values.as_slice()
        );

        Ok(KFactors {
            assets: pinned.to_vec(),
            values,
            hedge_vectors: vectors,
        })
    }

    fn validate_pinned(&self, pinned: &[usize]) -> StakingResult<()> {
        let n = self.asset_count();

        if pinned.is_empty() {
            return Err(StakingError::InvalidMarketConfig(
                "at least one pinned asset is required".to_string(),
            ));
        }

        if pinned.len() + 1 > n {
            return Err(StakingError::SingularConstraintSystem(format!(
                "{} constraints over {} assets leave no degrees of freedom (pinned {pinned:?})",
                pinned.len() + 1,
                n
            )));
        }

        for &asset in pinned {
            if asset >= n {
                return Err(StakingError::InvalidMarketConfig(format!(
                    "pinned asset index {asset} out of range for {n} assets"
                )));
            }
        }

        Ok(())
    }

    /// Hadamard-scaled determinant test: |det| relative to the product of
    /// row norms.
    fn effectively_singular(matrix: &DMatrix<f64>) -> bool {
        let det = matrix.determinant();
        if !det.is_finite() {
            return true;
        }

        let mut bound = 1.0;
        for i in 0..matrix.nrows() {
            bound *= matrix.row(i).norm();
        }
        if bound == 0.0 {
            return true;
        }

        det.abs() / bound < SINGULARITY_TOLERANCE
    }
}
