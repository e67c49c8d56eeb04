//! Sensitivity Surface Example
//!
//! Scans the ETH×SOL staking grid and prints a coarse net-benefit
//! surface plus the 1D ladder along the diagonal.
//!
//! Run with: `cargo run --example sensitivity_surface`
//! (add `--features parallel` to distribute the scan across cores)

use staking_analytics_rs::prelude::*;
use std::collections::HashMap;

fn main() -> StakingResult<()> {
    let assets: Vec<AssetId> = ["BTC", "ETH", "XRP", "SOL", "ADA", "XLM"]
        .iter()
        .map(|s| AssetId::new(*s))
        .collect();
    let correlations =
        CorrelationMatrix::grouped(assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60)?;
    let market = MarketParameters::new(
        assets,
        vec![0.7869, 0.1049, 0.0549, 0.0387, 0.0119, 0.0027],
        vec![0.039, 0.048, 0.053, 0.071, 0.055, 0.051],
        correlations,
    )?;

    let mut staking = HashMap::new();
    staking.insert(AssetId::new("ETH"), StakingConfig::new(0.90, 10, 0.030, 0.70)?);
    staking.insert(AssetId::new("SOL"), StakingConfig::new(0.90, 2, 0.073, 0.70)?);

    let distribution = RedemptionDistribution::from_counts(&[
        (0.05, 12),
        (0.10, 3),
        (0.20, 2),
        (0.30, 1),
    ])?;
    let redemption = RedemptionParams::new(18.0, distribution)?;
    let fund = FundConfig::new(500_000_000.0, 0.0143, 0.015)?;

    let calculator = TrackingErrorCalculator::new(market, staking, redemption, fund)?;

    // Coarse 7x7 surface for display; compute() uses the full 31x31.
    let engine = SensitivityGridEngine::new(7)?;
    let grid = calculator.sensitivity_grid(&engine)?;

    println!("Net benefit (bps), ETH levels down, SOL levels across:\n");
    print!("         ");
    for step in 0..7 {
        print!("  SOL {:>3.0}%", level(step));
    }
    println!();

    for row in 0..7 {
        print!("ETH {:>3.0}%  ", level(row));
        for col in 0..7 {
            let point = &grid.points[row * 7 + col];
            print!("  {:+8.2}", point.net_benefit_bps);
        }
        println!();
    }

    let optimal = grid.optimal();
    println!(
        "\nOptimum: ETH {:.0}%, SOL {:.0}% at {:+.2} bps (TE {:.3}%)",
        optimal.staking_levels[0] * 100.0,
        optimal.staking_levels[1] * 100.0,
        optimal.net_benefit_bps,
        optimal.tracking_error * 100.0
    );

    println!("\nDiagonal ladder (both assets at the same level):\n");
    println!("Level    TE        Yield     Shortfall   Net (bps)");
    for point in grid
        .points
        .iter()
        .enumerate()
        .filter(|&(index, _)| index / 7 == index % 7)
        .map(|(_, p)| p)
    {
        println!(
            "{:>4.0}%   {:.4}%   {:.4}%   {:+.4}%   {:+8.2}",
            point.staking_levels[0] * 100.0,
            point.tracking_error * 100.0,
            point.yield_benefit * 100.0,
            point.expected_shortfall * 100.0,
            point.net_benefit_bps
        );
    }

    Ok(())
}

fn level(step: usize) -> f64 {
    (0.70 + 0.30 * step as f64 / 6.0) * 100.0
}
