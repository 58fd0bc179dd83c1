//! Basic usage example for the doe-rsm library.
//!
//! This example walks through a two-factor process study: a central
//! composite design, simulated yield and cost responses, effect and ANOVA
//! analysis, the fitted response surface and a desirability search.
//!
//! Run with `RUST_LOG=debug` to see the library's tracing output.

use doe_rsm::prelude::*;
use doe_rsm::simulate::simulate_into;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("doe-rsm - Basic Usage Example\n");

    // Temperature 150-190 °C, time 30-90 min
    let ranges = [FactorRange::new(150.0, 190.0)?, FactorRange::new(30.0, 90.0)?];

    let ccd = CcdBuilder::new()
        .factors(2)
        .names(&["Temp", "Time"])
        .variant(CcdVariant::Circumscribed)
        .center_points(5)
        .build()?;

    println!("Central composite design ({} runs):", ccd.runs());
    println!("{ccd}");

    let mut table = ResponseTable::new(ccd);
    let mut rng = StdRng::seed_from_u64(2024);
    simulate_into(
        &mut table,
        "Yield",
        |x| 82.0 + 3.0 * x[0] + 1.5 * x[1] - 2.5 * x[0] * x[0] - 1.8 * x[1] * x[1] + 0.6 * x[0] * x[1],
        0.4,
        &mut rng,
    )?;
    simulate_into(
        &mut table,
        "Cost",
        |x| 40.0 + 4.0 * x[0] + 2.5 * x[1],
        0.3,
        &mut rng,
    )?;

    // Effects and ANOVA
    let config = AnalysisConfig::default();
    let yield_analysis = analyze(&table, "Yield", &config)?;

    println!("Grand mean yield: {:.2}\n", yield_analysis.grand_mean);
    println!("Effects:");
    for effect in &yield_analysis.effects {
        println!("  {:>2}. {:<10} {:+.3}", effect.rank, effect.name, effect.estimate);
    }
    println!("\nANOVA:\n{}\n", yield_analysis.anova);

    // Response surface
    let yield_model = fit_quadratic_least_squares(table.design(), table.response("Yield")?)?;
    let cost_model = fit_quadratic_least_squares(table.design(), table.response("Cost")?)?;
    println!("Yield surface: {:?}", yield_model.coefficients);

    let peak = yield_model.stationary_point();
    println!("Stationary point: {} at ({:.3}, {:.3})", peak.kind, peak.x1, peak.x2);
    if !peak.is_degenerate() {
        let (temp, time) = peak.to_natural(&ranges);
        println!(
            "  natural units: Temp = {temp:.1} °C, Time = {time:.1} min, predicted yield {:.2}",
            peak.predicted
        );
    }

    // Trade yield off against cost
    let grid = GridSpec::covering(table.design(), 81);
    let best = optimize_desirability(
        &[
            (yield_model, DesirabilityGoal::maximize(78.0, 84.0)),
            (cost_model, DesirabilityGoal::minimize(35.0, 45.0).with_weight(0.5)),
        ],
        &grid,
    )?;
    let (temp, time) = (ranges[0].decode(best.x1), ranges[1].decode(best.x2));
    println!(
        "\nBest compromise: Temp = {temp:.1} °C, Time = {time:.1} min (D = {:.3})",
        best.desirability
    );
    println!(
        "  predicted yield {:.2}, cost {:.2}",
        best.predictions[0], best.predictions[1]
    );

    Ok(())
}
