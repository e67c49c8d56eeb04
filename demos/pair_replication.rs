//! Two-Asset Replication Example
//!
//! Finds the BTC/ETH split that best replicates the full six-asset
//! benchmark and compares it with the proportional split.
//!
//! Run with: `cargo run --example pair_replication`

use staking_analytics_rs::prelude::*;
use staking_analytics_rs::tracking::pair_replication_tracking_error;

fn main() -> StakingResult<()> {
    let assets: Vec<AssetId> = ["BTC", "ETH", "XRP", "SOL", "ADA", "XLM"]
        .iter()
        .map(|s| AssetId::new(*s))
        .collect();
    let correlations =
        CorrelationMatrix::grouped(assets.clone(), (&assets[0], &assets[1]), 0.70, 0.60)?;
    let market = MarketParameters::new(
        assets.clone(),
        vec![0.7869, 0.1049, 0.0549, 0.0387, 0.0119, 0.0027],
        vec![0.039, 0.048, 0.053, 0.071, 0.055, 0.051],
        correlations,
    )?;

    let btc = &assets[0];
    let eth = &assets[1];

    let optimal = optimal_pair_replication(&market, btc, eth)?;
    println!(
        "Optimal split    : BTC {:.2}% | ETH {:.2}%",
        optimal.weight_a * 100.0,
        optimal.weight_b * 100.0
    );
    println!(
        "Tracking error   : {:.4}% daily ≈ {:.2}% annual",
        optimal.daily_tracking_error * 100.0,
        optimal.annual_tracking_error * 100.0
    );

    // Proportional split: benchmark weights rescaled to the pair.
    let proportional_x = 0.7869 / (0.7869 + 0.1049);
    let proportional = pair_replication_tracking_error(&market, btc, eth, proportional_x)?;
    println!(
        "\nProportional     : BTC {:.2}% | ETH {:.2}%",
        proportional.weight_a * 100.0,
        proportional.weight_b * 100.0
    );
    println!(
        "Tracking error   : {:.4}% daily ≈ {:.2}% annual",
        proportional.daily_tracking_error * 100.0,
        proportional.annual_tracking_error * 100.0
    );

    println!(
        "\nThe optimum saves {:.2}% of annual tracking error.",
        (proportional.annual_tracking_error - optimal.annual_tracking_error) * 100.0
    );

    Ok(())
}
