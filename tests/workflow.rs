//! End-to-end checks across design generation, analysis and optimization.

use std::collections::HashSet;

use approx::assert_relative_eq;
use doe_rsm::design::{code_value, decode_value, rotatable_alpha, Generator};
use doe_rsm::prelude::*;

#[test]
fn full_factorial_rows_are_distinct_corners() {
    for k in 1..=10 {
        let design = full_factorial(k, None).unwrap();
        assert_eq!(design.runs(), 1 << k);
        assert_eq!(design.factors(), k);
        assert!(design.points().iter().all(|&v| v == 1.0 || v == -1.0));

        let distinct: HashSet<Vec<i8>> = design
            .points()
            .rows()
            .into_iter()
            .map(|r| r.iter().map(|&v| v as i8).collect())
            .collect();
        assert_eq!(distinct.len(), design.runs());
        assert!(design.balance_report().is_balanced());
    }
}

#[test]
fn factor_count_outside_range_is_rejected() {
    for k in [0, 11, 20] {
        let err = full_factorial(k, None).unwrap_err();
        assert!(matches!(err, Error::InvalidFactorCount { .. }));
        assert!(err.to_string().contains("between 1 and 10"));
    }
}

#[test]
fn composite_run_count_and_alpha() {
    for k in 2..=6 {
        for center in [0, 1, 5] {
            let ccd = central_composite(k, CcdVariant::Circumscribed, center).unwrap();
            assert_eq!(ccd.runs(), (1 << k) + 2 * k + center);
            assert_relative_eq!(ccd.alpha().unwrap(), ((1 << k) as f64).powf(0.25));
            assert_relative_eq!(rotatable_alpha(k), ((1 << k) as f64).powf(0.25));
        }
    }

    let err = central_composite(1, CcdVariant::Circumscribed, 5).unwrap_err();
    assert!(err.to_string().contains("CCD requires at least 2 factors"));
}

#[test]
fn main_effect_of_two_by_two() {
    let design = full_factorial(2, None).unwrap();
    let y = [30.0, 45.0, 50.0, 65.0];
    assert_relative_eq!(main_effect(&design, &y, "A").unwrap(), 15.0);
    assert_relative_eq!(main_effect(&design, &y, "B").unwrap(), 20.0);
}

#[test]
fn anova_partitions_total_sum_of_squares() {
    for k in 2..=6 {
        let design = full_factorial(k, None).unwrap();
        let y: Vec<f64> = design
            .points()
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, r)| 20.0 + 4.0 * r[0] - 2.0 * r[1] + ((i * 7919) % 13) as f64 * 0.3)
            .collect();

        let table = perform_anova(&design, &y, &AnovaConfig::default()).unwrap();
        assert_relative_eq!(
            table.total_ss,
            table.model_ss + table.error_ss,
            epsilon = 1e-8,
            max_relative = 1e-10
        );
    }
}

#[test]
fn desirability_properties() {
    assert_eq!(target_desirability(5.0, 5.0, 1.0), 1.0);
    assert_eq!(target_desirability(6.0, 5.0, 1.0), 0.0);
    assert_eq!(target_desirability(3.0, 5.0, 1.0), 0.0);
    assert_relative_eq!(overall_desirability(&[0.5, 0.8]), (0.5_f64 * 0.8).sqrt());
    assert_eq!(overall_desirability(&[0.0, 0.9]), 0.0);
}

#[test]
fn flat_surface_is_degenerate() {
    let sp = find_stationary_point(&Coefficients {
        b0: 10.0,
        b1: 1.0,
        b2: -1.0,
        ..Coefficients::default()
    });
    assert_eq!(sp.kind, SurfaceKind::Degenerate);
    assert!(sp.x1.is_nan());
}

#[test]
fn coding_round_trip() {
    let coded = code_value(30.0, 25.0, 6.0);
    assert_relative_eq!(coded, 5.0 / 6.0);
    assert_relative_eq!(decode_value(0.833, 25.0, 6.0), 30.0, epsilon = 0.01);
    assert_relative_eq!(decode_value(coded, 25.0, 6.0), 30.0, epsilon = 1e-12);
}

#[test]
fn fractional_factorial_with_analysis() {
    let half = fractional_factorial(3, &[Generator::parse("ABC").unwrap()], None).unwrap();
    assert_eq!(half.resolution(), Some(4));
    assert_eq!(half.design().runs(), 8);

    // D is aliased with ABC, so an AB-free linear response is recovered exactly
    let y: Vec<f64> = half
        .design()
        .points()
        .rows()
        .into_iter()
        .map(|r| 60.0 + 3.0 * r[0] + 1.0 * r[3])
        .collect();
    let effects = estimate_effects(half.design(), &y).unwrap();
    let d = effects.iter().find(|e| e.name == "D").unwrap();
    assert_relative_eq!(d.estimate, 2.0, epsilon = 1e-12);
    assert_eq!(effects.iter().find(|e| e.name == "A").unwrap().rank, 1);
}

#[test]
fn ccd_to_optimum() {
    let ccd = CcdBuilder::new()
        .factors(2)
        .names(&["Temp", "Time"])
        .center_points(5)
        .build()
        .unwrap();

    // True optimum at coded (0.4, -0.25)
    let truth = |x1: f64, x2: f64| 90.0 - 2.0 * (x1 - 0.4).powi(2) - 3.0 * (x2 + 0.25).powi(2);
    let y: Vec<f64> = ccd
        .points()
        .rows()
        .into_iter()
        .map(|r| truth(r[0], r[1]))
        .collect();

    let mut table = ResponseTable::new(ccd);
    table.add_response("Yield", y).unwrap();

    let analysis = analyze(&table, "Yield", &AnalysisConfig::default()).unwrap();
    let heuristic = analysis.surface.unwrap();
    assert_eq!(heuristic.factors, ["Temp".to_string(), "Time".to_string()]);
    // Center mean minus factorial mean, halved, on both quadratic terms
    let factorial_mean = (0..4).map(|i| table.response("Yield").unwrap()[i]).sum::<f64>() / 4.0;
    let expected = (90.0 - 2.0 * 0.16 - 3.0 * 0.0625 - factorial_mean) / 2.0;
    assert_relative_eq!(heuristic.coefficients.b11, expected, epsilon = 1e-10);
    assert_relative_eq!(heuristic.coefficients.b22, expected, epsilon = 1e-10);
    assert_relative_eq!(expected, 2.5, epsilon = 1e-10);

    let model = fit_quadratic_least_squares(table.design(), table.response("Yield").unwrap()).unwrap();
    let peak = model.stationary_point();
    assert_eq!(peak.kind, SurfaceKind::Maximum);
    assert_relative_eq!(peak.x1, 0.4, epsilon = 1e-8);
    assert_relative_eq!(peak.x2, -0.25, epsilon = 1e-8);
    assert_relative_eq!(peak.predicted, 90.0, epsilon = 1e-8);

    let ranges = [
        FactorRange::new(150.0, 190.0).unwrap(),
        FactorRange::new(30.0, 90.0).unwrap(),
    ];
    let (temp, time) = peak.to_natural(&ranges);
    assert_relative_eq!(temp, 178.0, epsilon = 1e-6);
    assert_relative_eq!(time, 52.5, epsilon = 1e-6);

    let best = optimize_desirability(
        &[(model, DesirabilityGoal::maximize(80.0, 90.0))],
        &GridSpec::new(1.0, 81),
    )
    .unwrap();
    assert_relative_eq!(best.x1, 0.4, epsilon = 1e-9);
    assert_relative_eq!(best.x2, -0.25, epsilon = 1e-9);
    assert_relative_eq!(best.desirability, 1.0, epsilon = 1e-9);
}
