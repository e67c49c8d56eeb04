//! Discrete redemption-size distribution.

use crate::types::error::{StakingError, StakingResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance for the probabilities-sum-to-one invariant.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Discrete probability mass function over redemption sizes.
///
/// Sizes are fractions of NAV in [0, 1]; probabilities are non-negative
/// and sum to exactly 1.0 after normalization. Normalization rescales all
/// probabilities and then forces the floating-point residual onto the
/// last entry, so the sum is exact rather than merely close.
///
/// # Example
///
/// ```rust
/// use staking_analytics_rs::redemption::RedemptionDistribution;
///
/// // From an episode-count schedule: 12 episodes of 5%, 3 of 10%, ...
/// let dist = RedemptionDistribution::from_counts(&[
///     (0.05, 12),
///     (0.10, 3),
///     (0.20, 2),
///     (0.30, 1),
/// ]).unwrap();
///
/// assert_eq!(dist.probabilities().iter().sum::<f64>(), 1.0);
/// assert!((dist.probability(0) - 12.0 / 18.0).abs() < 1e-12);
///
/// // Expected excess over a 20% threshold.
/// let expected = dist.expectation(|r| (r - 0.20f64).max(0.0));
/// assert!((expected - (1.0 / 18.0) * 0.10).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RedemptionDistribution {
    sizes: Vec<f64>,
    probabilities: Vec<f64>,
}

impl RedemptionDistribution {
    /// Creates a distribution from explicit size/probability pairs.
    ///
    /// The probabilities are normalized so the sum is exactly 1.0; inputs
    /// that merely approximate a probability vector (e.g. rounded survey
    /// weights summing to 1.001) are accepted and rescaled. Failure means
    /// no normalization could produce a valid distribution.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidDistribution`] if the input is
    /// empty, a size lies outside [0, 1], a probability is negative, or
    /// the total mass is not positive.
    pub fn from_probabilities(entries: &[(f64, f64)]) -> StakingResult<Self> {
        let mut dist = Self::unchecked(entries)?;
        dist.renormalize()?;

        let sum: f64 = dist.probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(StakingError::InvalidDistribution(format!(
                "probabilities do not sum to 1.0 after normalization, got {sum}"
            )));
        }

        Ok(dist)
    }

    /// Creates a distribution from an episode-count schedule, e.g. twelve
    /// 5% redemptions and one 30% redemption per reference year.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidDistribution`] if the schedule is
    /// empty, all counts are zero, or a size lies outside [0, 1].
    pub fn from_counts(schedule: &[(f64, u32)]) -> StakingResult<Self> {
        let total: u64 = schedule.iter().map(|&(_, count)| u64::from(count)).sum();
        if total == 0 {
            return Err(StakingError::InvalidDistribution(
                "episode schedule must contain at least one episode".to_string(),
            ));
        }

        let entries: Vec<(f64, f64)> = schedule
            .iter()
            .map(|&(size, count)| (size, f64::from(count) / total as f64))
            .collect();

        let mut dist = Self::unchecked(&entries)?;
        dist.renormalize()?;
        Ok(dist)
    }

    fn unchecked(entries: &[(f64, f64)]) -> StakingResult<Self> {
        if entries.is_empty() {
            return Err(StakingError::InvalidDistribution(
                "distribution must contain at least one entry".to_string(),
            ));
        }

        for &(size, probability) in entries {
            if !(0.0..=1.0).contains(&size) || size.is_nan() {
                return Err(StakingError::InvalidDistribution(format!(
                    "redemption size must be in [0, 1], got {size}"
                )));
            }
            if probability < 0.0 || probability.is_nan() {
                return Err(StakingError::InvalidDistribution(format!(
                    "probability must be non-negative, got {probability}"
                )));
            }
        }

        Ok(Self {
            sizes: entries.iter().map(|&(size, _)| size).collect(),
            probabilities: entries.iter().map(|&(_, p)| p).collect(),
        })
    }

    /// Rescales the probabilities to sum to one and forces the residual
    /// onto the last entry so the sum is exactly 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidDistribution`] if the total mass is
    /// not positive.
    pub fn renormalize(&mut self) -> StakingResult<()> {
        let total: f64 = self.probabilities.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(StakingError::InvalidDistribution(format!(
                "total probability mass must be positive, got {total}"
            )));
        }

        for p in &mut self.probabilities {
            *p /= total;
        }

        let last = self.probabilities.len() - 1;
        let head: f64 = self.probabilities[..last].iter().sum();
        let residual = 1.0 - head;
        if residual < -PROBABILITY_SUM_TOLERANCE {
            return Err(StakingError::InvalidDistribution(format!(
                "normalization left a negative residual {residual}"
            )));
        }
        self.probabilities[last] = residual.max(0.0);

        Ok(())
    }

    /// Returns the number of support points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns `true` if the distribution has no support points.
    ///
    /// Always `false` for a constructed distribution; present for API
    /// completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Returns the redemption sizes.
    #[must_use]
    pub fn sizes(&self) -> &[f64] {
        &self.sizes
    }

    /// Returns the probabilities, summing to exactly 1.0.
    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Returns the probability of the `i`-th support point.
    #[must_use]
    pub fn probability(&self, i: usize) -> f64 {
        self.probabilities[i]
    }

    /// Iterates over `(size, probability)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.sizes
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
    }

    /// Computes `E[f(R)] = Σᵢ P(R = rᵢ)·f(rᵢ)`.
    ///
    /// This is the single query the tracking-error pipeline needs: it is
    /// called with `(r − τ)²₊`, `(r − τ₁)₊(r − τ₂)₊` and `(r − τ)₊`.
    #[must_use]
    pub fn expectation(&self, f: impl Fn(f64) -> f64) -> f64 {
        self.iter().map(|(size, p)| p * f(size)).sum()
    }

    /// Expected redemption size `E[R]`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.expectation(|r| r)
    }

    /// Variance of the redemption size `E[R²] − E[R]²`.
    #[must_use]
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.expectation(|r| r * r) - mean * mean
    }
}

/// Redemption behavior: episode frequency plus the size distribution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RedemptionParams {
    /// Expected redemption episodes per year (λ).
    pub expected_per_year: f64,

    /// Distribution of redemption sizes.
    pub distribution: RedemptionDistribution,
}

impl RedemptionParams {
    /// Creates validated redemption parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidDistribution`] if λ is negative or
    /// not finite.
    pub fn new(
        expected_per_year: f64,
        distribution: RedemptionDistribution,
    ) -> StakingResult<Self> {
        if expected_per_year < 0.0 || !expected_per_year.is_finite() {
            return Err(StakingError::InvalidDistribution(format!(
                "expected_per_year must be non-negative, got {expected_per_year}"
            )));
        }

        Ok(Self {
            expected_per_year,
            distribution,
        })
    }
}
