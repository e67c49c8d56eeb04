//! Sensitivity scanning over staking levels.

mod grid;

pub use grid::{GridAxis, GridCell, GridPoint, SensitivityGrid, SensitivityGridEngine};
