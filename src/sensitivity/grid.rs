//! Rectangular grid scan over per-asset staking levels.
//!
//! Every grid cell is an independent pipeline evaluation sharing only the
//! cached k-factors, so the scan is embarrassingly parallel: with the
//! `parallel` feature cells are distributed across rayon workers, and the
//! serial and parallel scans produce identical results.

use crate::types::error::{StakingError, StakingResult};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inclusive staking-level range scanned for one asset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridAxis {
    /// Lowest staking level scanned (typically the baseline).
    pub min: f64,
    /// Highest staking level scanned (typically 1.0).
    pub max: f64,
}

impl GridAxis {
    /// Creates a validated axis.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidStakingConfig`] if the bounds lie
    /// outside [0, 1] or are inverted.
    pub fn new(min: f64, max: f64) -> StakingResult<Self> {
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            return Err(StakingError::InvalidStakingConfig(format!(
                "grid axis must satisfy 0 <= min <= max <= 1, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    /// The `step`-th of `count` evenly spaced levels on this axis.
    fn level(&self, step: usize, count: usize) -> f64 {
        if count <= 1 {
            return self.min;
        }
        self.min + (self.max - self.min) * step as f64 / (count - 1) as f64
    }
}

/// Pipeline outputs for one staking-level combination.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridCell {
    /// Annualized tracking error at this combination.
    pub tracking_error: f64,
    /// Total yield benefit at this combination.
    pub yield_benefit: f64,
    /// Expected shortfall at this combination (non-positive).
    pub expected_shortfall: f64,
    /// Net benefit in basis points.
    pub net_benefit_bps: f64,
}

/// One scanned grid point: the staking levels plus the pipeline outputs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridPoint {
    /// Per-asset staking levels, in pinned-asset order.
    pub staking_levels: Vec<f64>,
    /// Annualized tracking error.
    pub tracking_error: f64,
    /// Total yield benefit.
    pub yield_benefit: f64,
    /// Expected shortfall (non-positive).
    pub expected_shortfall: f64,
    /// Net benefit in basis points.
    pub net_benefit_bps: f64,
}

/// Completed scan: every grid point plus the benefit-maximizing one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensitivityGrid {
    /// All scanned points, row-major in the first axis.
    pub points: Vec<GridPoint>,
    /// Index of the benefit-maximizing point in `points`.
    pub optimal_index: usize,
}

impl SensitivityGrid {
    /// Returns the benefit-maximizing grid point.
    #[must_use]
    pub fn optimal(&self) -> &GridPoint {
        &self.points[self.optimal_index]
    }
}

/// Scans a rectangular grid of staking levels and locates the
/// benefit-maximizing operating point.
///
/// Exact net-benefit ties are broken toward the lower combined staking
/// level, so coarse sampling over a flat benefit surface never reports a
/// spurious extreme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityGridEngine {
    points_per_axis: usize,
}

impl SensitivityGridEngine {
    /// Default grid resolution per axis (31 points over a 30-percentage-
    /// point range scans in 1% increments).
    pub const DEFAULT_POINTS_PER_AXIS: usize = 31;

    /// Creates an engine with the default resolution.
    #[must_use]
    pub fn default_resolution() -> Self {
        Self {
            points_per_axis: Self::DEFAULT_POINTS_PER_AXIS,
        }
    }

    /// Creates an engine scanning `points_per_axis` levels per asset.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::InvalidStakingConfig`] for fewer than two
    /// points per axis.
    pub fn new(points_per_axis: usize) -> StakingResult<Self> {
        if points_per_axis < 2 {
            return Err(StakingError::InvalidStakingConfig(format!(
                "grid needs at least two points per axis, got {points_per_axis}"
            )));
        }
        Ok(Self { points_per_axis })
    }

    /// Returns the grid resolution per axis.
    #[must_use]
    pub fn points_per_axis(&self) -> usize {
        self.points_per_axis
    }

    /// Evaluates `eval` over the full cartesian grid and returns every
    /// point plus the benefit-maximizing one.
    ///
    /// `eval` receives the per-asset staking levels in axis order. Cells
    /// are independent; no state is shared during the scan.
    pub fn scan<F>(&self, axes: &[GridAxis], eval: F) -> StakingResult<SensitivityGrid>
    where
        F: Fn(&[f64]) -> GridCell + Sync,
    {
        if axes.is_empty() {
            return Err(StakingError::InvalidStakingConfig(
                "grid scan needs at least one axis".to_string(),
            ));
        }

        let combos = self.level_combinations(axes);

        #[cfg(feature = "parallel")]
        let cells: Vec<GridCell> = combos.par_iter().map(|levels| eval(levels)).collect();

        #[cfg(not(feature = "parallel"))]
        let cells: Vec<GridCell> = combos.iter().map(|levels| eval(levels)).collect();

        let points: Vec<GridPoint> = combos
            .into_iter()
            .zip(cells)
            .map(|(staking_levels, cell)| GridPoint {
                staking_levels,
                tracking_error: cell.tracking_error,
                yield_benefit: cell.yield_benefit,
                expected_shortfall: cell.expected_shortfall,
                net_benefit_bps: cell.net_benefit_bps,
            })
            .collect();

        let optimal_index = Self::argmax(&points);

        tracing::debug!(
            "sensitivity scan over {} points, optimum {:?} at {:.3} bps",
            points.len(),
            points[optimal_index].staking_levels,
            points[optimal_index].net_benefit_bps
        );

        Ok(SensitivityGrid {
            points,
            optimal_index,
        })
    }

    /// Row-major cartesian product of the axis levels.
    fn level_combinations(&self, axes: &[GridAxis]) -> Vec<Vec<f64>> {
        let n = self.points_per_axis;
        let mut combos: Vec<Vec<f64>> = vec![Vec::new()];

        for axis in axes {
            let mut next = Vec::with_capacity(combos.len() * n);
            for prefix in &combos {
                for step in 0..n {
                    let mut levels = prefix.clone();
                    levels.push(axis.level(step, n));
                    next.push(levels);
                }
            }
            combos = next;
        }

        combos
    }

    /// Benefit-maximizing point; exact ties go to the lower combined
    /// staking level, then to the earlier point.
    fn argmax(points: &[GridPoint]) -> usize {
        let mut best = 0;
        for (index, point) in points.iter().enumerate().skip(1) {
            let current = &points[best];
            if point.net_benefit_bps > current.net_benefit_bps {
                best = index;
            } else if point.net_benefit_bps == current.net_benefit_bps {
                let combined: f64 = point.staking_levels.iter().sum();
                let best_combined: f64 = current.staking_levels.iter().sum();
                if combined < best_combined {
                    best = index;
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_levels() {
        let axis = GridAxis::new(0.70, 1.00).unwrap();
        assert!((axis.level(0, 31) - 0.70).abs() < 1e-12);
        assert!((axis.level(11, 31) - 0.81).abs() < 1e-12);
        assert!((axis.level(30, 31) - 1.00).abs() < 1e-12);
    }

    #[test]
    fn test_axis_validation() {
        assert!(GridAxis::new(0.9, 0.7).is_err());
        assert!(GridAxis::new(-0.1, 0.9).is_err());
        assert!(GridAxis::new(0.7, 1.1).is_err());
    }

    #[test]
    fn test_scan_covers_full_grid() {
        let engine = SensitivityGridEngine::new(3).unwrap();
        let axes = [
            GridAxis::new(0.0, 1.0).unwrap(),
            GridAxis::new(0.0, 0.5).unwrap(),
        ];

        let grid = engine
            .scan(&axes, |levels| GridCell {
                tracking_error: 0.0,
                yield_benefit: levels[0],
                expected_shortfall: 0.0,
                net_benefit_bps: levels[0] + levels[1],
            })
            .unwrap();

        assert_eq!(grid.points.len(), 9);
        // Row-major: the first axis varies slowest.
        assert_eq!(grid.points[0].staking_levels, vec![0.0, 0.0]);
        assert_eq!(grid.points[1].staking_levels, vec![0.0, 0.25]);
        assert_eq!(grid.points[3].staking_levels, vec![0.5, 0.0]);
        assert_eq!(grid.optimal().staking_levels, vec![1.0, 0.5]);
    }

    #[test]
    fn test_tie_breaks_toward_lower_combined_staking() {
        let engine = SensitivityGridEngine::new(3).unwrap();
        let axes = [GridAxis::new(0.70, 1.00).unwrap()];

        // Flat surface: every point ties, the lowest level wins.
        let grid = engine
            .scan(&axes, |_| GridCell {
                tracking_error: 0.0,
                yield_benefit: 0.0,
                expected_shortfall: 0.0,
                net_benefit_bps: 1.5,
            })
            .unwrap();

        assert_eq!(grid.optimal().staking_levels, vec![0.70]);
    }

    #[test]
    fn test_single_axis_is_a_ladder() {
        let engine = SensitivityGridEngine::new(5).unwrap();
        let axes = [GridAxis::new(0.0, 1.0).unwrap()];

        let grid = engine
            .scan(&axes, |levels| GridCell {
                tracking_error: 0.0,
                yield_benefit: 0.0,
                expected_shortfall: 0.0,
                // Peak in the interior.
                net_benefit_bps: -(levels[0] - 0.75).abs(),
            })
            .unwrap();

        assert_eq!(grid.points.len(), 5);
        assert_eq!(grid.optimal().staking_levels, vec![0.75]);
    }

    #[test]
    fn test_rejects_degenerate_configs() {
        assert!(SensitivityGridEngine::new(1).is_err());

        let engine = SensitivityGridEngine::new(3).unwrap();
        let result = engine.scan(&[], |_| GridCell {
            tracking_error: 0.0,
            yield_benefit: 0.0,
            expected_shortfall: 0.0,
            net_benefit_bps: 0.0,
        });
        assert!(result.is_err());
    }
}
