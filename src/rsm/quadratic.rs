//! Fitting the two-factor quadratic model.

use ndarray::{Array1, Array2};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::stationary::{find_stationary_point, StationaryPoint};
use crate::analysis::effects::{term_effect, validate_data};
use crate::analysis::Term;
use crate::design::{Design, PointKind};
use crate::error::{Error, Result};

/// Number of factors the quadratic model handles.
const MODEL_FACTORS: usize = 2;
/// Number of coefficients in the full quadratic model.
const MODEL_TERMS: usize = 6;

/// Coefficients of the two-factor quadratic model in coded units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coefficients {
    /// Intercept.
    pub b0: f64,
    /// Linear term of the first factor.
    pub b1: f64,
    /// Linear term of the second factor.
    pub b2: f64,
    /// Quadratic term of the first factor.
    pub b11: f64,
    /// Quadratic term of the second factor.
    pub b22: f64,
    /// Interaction term.
    pub b12: f64,
}

impl Coefficients {
    /// Evaluate the model at coded point (x1, x2).
    #[must_use]
    pub fn predict(&self, x1: f64, x2: f64) -> f64 {
        self.b0
            + self.b1 * x1
            + self.b2 * x2
            + self.b11 * x1 * x1
            + self.b22 * x2 * x2
            + self.b12 * x1 * x2
    }

    /// Gradient (∂ŷ/∂x1, ∂ŷ/∂x2) at (x1, x2).
    #[must_use]
    pub fn gradient(&self, x1: f64, x2: f64) -> [f64; 2] {
        [
            self.b1 + 2.0 * self.b11 * x1 + self.b12 * x2,
            self.b2 + self.b12 * x1 + 2.0 * self.b22 * x2,
        ]
    }

    fn from_vector(b: &Array1<f64>) -> Self {
        Self {
            b0: b[0],
            b1: b[1],
            b2: b[2],
            b11: b[3],
            b22: b[4],
            b12: b[5],
        }
    }
}

/// A fitted quadratic surface over two named factors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadraticModel {
    /// Names of the two factors, as (x1, x2).
    pub factors: [String; 2],
    /// Model coefficients.
    pub coefficients: Coefficients,
}

impl QuadraticModel {
    /// Create a model from known coefficients.
    #[must_use]
    pub fn new(factors: [String; 2], coefficients: Coefficients) -> Self {
        Self {
            factors,
            coefficients,
        }
    }

    /// Predicted response at coded point (x1, x2).
    #[must_use]
    pub fn predict(&self, x1: f64, x2: f64) -> f64 {
        self.coefficients.predict(x1, x2)
    }

    /// Stationary point of the surface.
    #[must_use]
    pub fn stationary_point(&self) -> StationaryPoint {
        find_stationary_point(&self.coefficients)
    }

    /// Coefficient of determination of this model over a design's runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the design does not have exactly two factors or the
    /// response does not match it.
    pub fn r_squared(&self, design: &Design, response: &[f64]) -> Result<f64> {
        check_two_factors(design)?;
        validate_data(design, response)?;

        let mean = response.iter().sum::<f64>() / response.len() as f64;
        let (mut ss_res, mut ss_tot) = (0.0, 0.0);
        for (row, &y) in design.points().rows().into_iter().zip(response) {
            let fitted = self.predict(row[0], row[1]);
            ss_res += (y - fitted).powi(2);
            ss_tot += (y - mean).powi(2);
        }

        Ok(if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 })
    }
}

fn check_two_factors(design: &Design) -> Result<()> {
    if design.factors() != MODEL_FACTORS {
        return Err(Error::UnsupportedFactorCount {
            expected: MODEL_FACTORS,
            actual: design.factors(),
        });
    }
    Ok(())
}

fn model_factors(design: &Design) -> [String; 2] {
    let names = design.factor_names();
    [names[0].clone(), names[1].clone()]
}

fn mean_over(response: &[f64], rows: &[usize]) -> Option<f64> {
    if rows.is_empty() {
        None
    } else {
        Some(rows.iter().map(|&r| response[r]).sum::<f64>() / rows.len() as f64)
    }
}

/// Approximate the quadratic model from effects and center-point curvature.
///
/// With the factorial block at ±c in coded units (c = 1 except for an
/// inscribed composite design):
///
/// - b1, b2 are the A and B effects divided by 2c, b12 the AB effect by 2c²
/// - b11 = b22 = (center-point mean − factorial-point mean) / 2c²
/// - b0 is the center-point mean
///
/// Without center points the curvature terms are zero and b0 is the grand
/// mean. This is a shortcut, not a least-squares fit: both quadratic terms
/// share one curvature estimate, and a response that bends down away from
/// the center gets positive quadratic terms. Use
/// [`fit_quadratic_least_squares`] to classify the surface.
///
/// # Errors
///
/// - [`Error::UnsupportedFactorCount`] unless the design has exactly two factors
/// - [`Error::EmptyData`] / [`Error::DimensionMismatch`] for bad inputs
/// - [`Error::EmptyLevel`] if a factor has no factorial runs at one of its levels
///
/// # Example
///
/// ```
/// use doe_rsm::design::{central_composite, CcdVariant};
/// use doe_rsm::rsm::fit_quadratic;
///
/// let ccd = central_composite(2, CcdVariant::Circumscribed, 3).unwrap();
/// // Factorial runs, then axial runs, then three center runs
/// let y = [76.0, 79.0, 78.0, 80.0, 77.0, 79.5, 76.5, 79.0, 84.0, 84.5, 83.5];
///
/// let model = fit_quadratic(&ccd, &y).unwrap();
/// // Center mean 84, factorial mean 78.25
/// assert!((model.coefficients.b11 - 2.875).abs() < 1e-12);
/// assert_eq!(model.coefficients.b11, model.coefficients.b22);
/// assert!((model.coefficients.b0 - 84.0).abs() < 1e-12);
/// ```
pub fn fit_quadratic(design: &Design, response: &[f64]) -> Result<QuadraticModel> {
    check_two_factors(design)?;
    validate_data(design, response)?;

    let effect_a = term_effect(design, response, Term::Main(0))?;
    let effect_b = term_effect(design, response, Term::Main(1))?;
    let effect_ab = term_effect(design, response, Term::Interaction(0, 1))?;

    let cube = design.cube_level();
    let center_mean = mean_over(response, &design.rows_of_kind(PointKind::Center));
    let factorial_mean = mean_over(response, &design.cube_rows());

    let (b0, curvature) = match (center_mean, factorial_mean) {
        (Some(center), Some(factorial)) => (center, (center - factorial) / (2.0 * cube * cube)),
        _ => (response.iter().sum::<f64>() / response.len() as f64, 0.0),
    };

    let coefficients = Coefficients {
        b0,
        b1: effect_a / (2.0 * cube),
        b2: effect_b / (2.0 * cube),
        b11: curvature,
        b22: curvature,
        b12: effect_ab / (2.0 * cube * cube),
    };
    debug!(?coefficients, cube, "fitted quadratic surface from effects");

    Ok(QuadraticModel::new(model_factors(design), coefficients))
}

/// Fit the quadratic model by ordinary least squares.
///
/// Solves the normal equations (XᵀX)b = Xᵀy for the six model terms.
///
/// # Errors
///
/// - [`Error::UnsupportedFactorCount`] unless the design has exactly two factors
/// - [`Error::InvalidParams`] with fewer than six runs
/// - [`Error::SingularSystem`] when the design cannot separate the terms
///   (for example a plain 2² factorial, where x1² and x2² coincide)
pub fn fit_quadratic_least_squares(design: &Design, response: &[f64]) -> Result<QuadraticModel> {
    check_two_factors(design)?;
    validate_data(design, response)?;
    if design.runs() < MODEL_TERMS {
        return Err(Error::invalid_params(format!(
            "least-squares quadratic fit needs at least {MODEL_TERMS} runs, got {}",
            design.runs()
        )));
    }

    let x = Array2::from_shape_fn((design.runs(), MODEL_TERMS), |(r, c)| {
        let x1 = design.points()[[r, 0]];
        let x2 = design.points()[[r, 1]];
        match c {
            0 => 1.0,
            1 => x1,
            2 => x2,
            3 => x1 * x1,
            4 => x2 * x2,
            _ => x1 * x2,
        }
    });
    let y = Array1::from(response.to_vec());

    let xtx = x.t().dot(&x);
    let xty = x.t().dot(&y);
    let b = solve_linear_system(xtx, xty)?;

    let coefficients = Coefficients::from_vector(&b);
    debug!(?coefficients, "fitted quadratic surface by least squares");

    Ok(QuadraticModel::new(model_factors(design), coefficients))
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[[i, col]]
                    .abs()
                    .partial_cmp(&a[[j, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if a[[pivot, col]].abs() < 1e-10 * scale {
            return Err(Error::singular(format!(
                "normal equations are rank deficient at column {col}"
            )));
        }

        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}
