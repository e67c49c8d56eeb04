//! Basic Tracking-Error Analysis Example
//!
//! This example runs the full pipeline for a six-asset benchmark with
//! ETH and SOL partially staked: tracking-error decomposition, net
//! benefit and the optimal staking levels.
//!
//! Run with: `cargo run --example basic_analysis`

use staking_analytics_rs::prelude::*;
use std::collections::HashMap;

fn main() -> StakingResult<()> {
    println!("=== Staking Tracking-Error Analysis ===\n");

    let assets: Vec<AssetId> = ["BTC", "ETH", "XRP", "SOL", "ADA", "XLM"]
        .iter()
        .map(|s| AssetId::new(*s))
        .collect();

    // BTC-ETH correlate at 0.70, every other pair at 0.60.
    let correlations =
        CorrelationMatrix::grouped(assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60)?;

    let market = MarketParameters::new(
        assets.clone(),
        vec![0.7869, 0.1049, 0.0549, 0.0387, 0.0119, 0.0027],
        vec![0.039, 0.048, 0.053, 0.071, 0.055, 0.051],
        correlations,
    )?;

    // ETH: 90% staked, 10-day unbonding, 3% yield.
    // SOL: 90% staked, 2-day unbonding, 7.3% yield.
    let mut staking = HashMap::new();
    staking.insert(AssetId::new("ETH"), StakingConfig::new(0.90, 10, 0.030, 0.70)?);
    staking.insert(AssetId::new("SOL"), StakingConfig::new(0.90, 2, 0.073, 0.70)?);

    // Historical episode schedule: twelve 5% redemptions, three 10%,
    // two 20%, one 30%. 18 episodes per year.
    let distribution = RedemptionDistribution::from_counts(&[
        (0.05, 12),
        (0.10, 3),
        (0.20, 2),
        (0.30, 1),
    ])?;
    let redemption = RedemptionParams::new(18.0, distribution)?;

    let fund = FundConfig::new(500_000_000.0, 0.0143, 0.015)?;

    let result = compute(market, staking, redemption, fund)?;

    print_decomposition(&result);
    print_net_benefit(&result);
    print_optimum(&result);

    Ok(())
}

fn print_decomposition(result: &CalculationResult) {
    let d = &result.decomposition;
    println!("--- Tracking-Error Decomposition ---");
    println!("Annual tracking error:   {:.4}%", d.tracking_error * 100.0);
    for (asset, te) in result.staked_assets.iter().zip(&d.per_asset_te) {
        println!("{asset}-only tracking error: {:.4}%", te * 100.0);
    }
    println!(
        "Independence approx:     {:.4}%",
        d.independence_approx * 100.0
    );
    println!(
        "Correlation cost:        {:.4}% ({:+.1}%)",
        d.correlation_cost * 100.0,
        d.correlation_cost_pct
    );
    println!();
}

fn print_net_benefit(result: &CalculationResult) {
    let nb = &result.net_benefit;
    println!("--- Net Benefit ---");
    for (asset, benefit) in result.staked_assets.iter().zip(&nb.per_asset) {
        println!(
            "{asset}: baseline {:.3}% + marginal {:.4}% = {:.3}%",
            benefit.baseline * 100.0,
            benefit.marginal * 100.0,
            benefit.total * 100.0
        );
    }
    println!("Total yield benefit:     {:.3}%", nb.total_yield_benefit * 100.0);
    println!("Expected shortfall:      {:.3}%", nb.expected_shortfall * 100.0);
    println!("TD budget / deficit:     {:.3}% / {:.3}%",
        nb.tracking_difference_budget * 100.0,
        nb.budget_deficit * 100.0
    );
    println!("Net benefit:             {:+.2} bps", nb.net_benefit_bps);
    println!();
}

fn print_optimum(result: &CalculationResult) {
    println!("--- Optimal Staking Levels ---");
    for (asset, level) in result.staked_assets.iter().zip(&result.optimal_staking_levels) {
        println!("{asset}: {:.0}%", level * 100.0);
    }
}
