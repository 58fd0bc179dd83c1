use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use doe_rsm::analysis::{perform_anova, AnovaConfig};
use doe_rsm::design::{central_composite, full_factorial, CcdVariant};
use doe_rsm::desirability::{optimize_desirability, DesirabilityGoal, GridSpec};
use doe_rsm::rsm::{fit_quadratic_least_squares, Coefficients, QuadraticModel};

fn response_for(design: &doe_rsm::Design) -> Vec<f64> {
    design
        .points()
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, r)| 50.0 + r.sum() * 3.0 + (i % 7) as f64 * 0.1)
        .collect()
}

fn bench_full_factorial(c: &mut Criterion) {
    let mut group = c.benchmark_group("FullFactorial");

    for k in [3, 6, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| full_factorial(black_box(k), None).unwrap());
        });
    }
    group.finish();
}

fn bench_ccd(c: &mut Criterion) {
    let mut group = c.benchmark_group("CentralComposite");

    for k in [2, 4, 6] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| central_composite(black_box(k), CcdVariant::Circumscribed, 5).unwrap());
        });
    }
    group.finish();
}

fn bench_anova(c: &mut Criterion) {
    let mut group = c.benchmark_group("Anova");

    for k in [3, 5, 8] {
        let design = full_factorial(k, None).unwrap();
        let y = response_for(&design);
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, _| {
            b.iter(|| perform_anova(&design, black_box(&y), &AnovaConfig::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_least_squares(c: &mut Criterion) {
    let ccd = central_composite(2, CcdVariant::Circumscribed, 5).unwrap();
    let y = response_for(&ccd);

    c.bench_function("LeastSquaresQuadratic", |b| {
        b.iter(|| fit_quadratic_least_squares(&ccd, black_box(&y)).unwrap());
    });
}

fn bench_desirability(c: &mut Criterion) {
    let mut group = c.benchmark_group("DesirabilityGrid");
    let factors = ["A".to_string(), "B".to_string()];
    let responses = [
        (
            QuadraticModel::new(
                factors.clone(),
                Coefficients {
                    b0: 80.0,
                    b1: 3.0,
                    b2: -1.0,
                    b11: -2.0,
                    b22: -1.5,
                    b12: 0.5,
                },
            ),
            DesirabilityGoal::maximize(70.0, 85.0),
        ),
        (
            QuadraticModel::new(
                factors,
                Coefficients {
                    b0: 40.0,
                    b1: 2.0,
                    b2: 4.0,
                    ..Coefficients::default()
                },
            ),
            DesirabilityGoal::minimize(30.0, 50.0),
        ),
    ];

    for steps in [41, 201] {
        let grid = GridSpec::new(1.414, steps);
        group.bench_with_input(BenchmarkId::new("sequential", steps), &grid, |b, grid| {
            b.iter(|| optimize_desirability(&responses, grid).unwrap());
        });
        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", steps), &grid, |b, grid| {
            b.iter(|| doe_rsm::par_optimize_desirability(&responses, grid).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_full_factorial,
    bench_ccd,
    bench_anova,
    bench_least_squares,
    bench_desirability
);
criterion_main!(benches);
