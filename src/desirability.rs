//! Derringer–Suich desirability functions for multi-response optimization.
//!
//! Each response is mapped onto a desirability in [0, 1] by one of three
//! shapes, and the individual scores are combined with a geometric mean so
//! that a single unacceptable response (d = 0) makes the whole setting
//! unacceptable.
//!
//! ## Example
//!
//! ```
//! use doe_rsm::desirability::{larger_is_better, overall_desirability, target_desirability};
//!
//! let d_yield = larger_is_better(82.0, 70.0, 90.0);
//! let d_purity = target_desirability(98.5, 99.0, 2.0);
//!
//! assert!((d_yield - 0.6).abs() < 1e-12);
//! assert!((d_purity - 0.75).abs() < 1e-12);
//!
//! let overall = overall_desirability(&[d_yield, d_purity]);
//! assert!((overall - (0.6_f64 * 0.75).sqrt()).abs() < 1e-12);
//! ```

use std::cmp::Ordering;

use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rsm::QuadraticModel;

/// Two-sided desirability around a target.
///
/// Equals 1 at the target and falls linearly to 0 at `tolerance` away from it.
/// A non-positive tolerance makes the function 1 at the target and 0 elsewhere.
#[must_use]
pub fn target_desirability(y: f64, target: f64, tolerance: f64) -> f64 {
    let deviation = (y - target).abs();
    if tolerance <= 0.0 {
        return if deviation == 0.0 { 1.0 } else { 0.0 };
    }
    if deviation >= tolerance {
        0.0
    } else {
        1.0 - deviation / tolerance
    }
}

/// One-sided desirability for a response to maximize.
///
/// 0 at or below `lower`, 1 at or above `upper`, linear in between.
#[must_use]
pub fn larger_is_better(y: f64, lower: f64, upper: f64) -> f64 {
    if y >= upper {
        1.0
    } else if y <= lower {
        0.0
    } else {
        (y - lower) / (upper - lower)
    }
}

/// One-sided desirability for a response to minimize.
///
/// 1 at or below `lower`, 0 at or above `upper`, linear in between.
#[must_use]
pub fn smaller_is_better(y: f64, lower: f64, upper: f64) -> f64 {
    if y <= lower {
        1.0
    } else if y >= upper {
        0.0
    } else {
        (upper - y) / (upper - lower)
    }
}

/// Geometric mean of individual desirabilities.
///
/// Returns 0 for an empty slice or when any component is ≤ 0.
#[must_use]
pub fn overall_desirability(desirabilities: &[f64]) -> f64 {
    if desirabilities.is_empty() || desirabilities.iter().any(|&d| d <= 0.0 || d.is_nan()) {
        return 0.0;
    }
    let log_sum: f64 = desirabilities.iter().map(|d| d.ln()).sum();
    (log_sum / desirabilities.len() as f64).exp()
}

/// Weighted geometric mean: Π dᵢ^(rᵢ / Σr).
///
/// `importance` gives the relative importance rᵢ of each response.
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] if the slices differ in length
/// - [`Error::InvalidParams`] if any importance is not a positive finite number
pub fn weighted_overall_desirability(desirabilities: &[f64], importance: &[f64]) -> Result<f64> {
    if desirabilities.len() != importance.len() {
        return Err(Error::length_mismatch(desirabilities.len(), importance.len()));
    }
    if let Some(&r) = importance.iter().find(|&&r| !(r.is_finite() && r > 0.0)) {
        return Err(Error::invalid_params(format!(
            "importance must be positive, got {r}"
        )));
    }
    if desirabilities.is_empty() || desirabilities.iter().any(|&d| d <= 0.0 || d.is_nan()) {
        return Ok(0.0);
    }

    let total: f64 = importance.iter().sum();
    let log_sum: f64 = desirabilities
        .iter()
        .zip(importance)
        .map(|(d, r)| r * d.ln())
        .sum();
    Ok((log_sum / total).exp())
}

/// Shape of an individual desirability function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DesirabilityShape {
    /// Hit a target value; see [`target_desirability`].
    Target {
        /// Ideal value.
        target: f64,
        /// Deviation at which desirability reaches 0.
        tolerance: f64,
    },
    /// Maximize; see [`larger_is_better`].
    LargerIsBetter {
        /// Unacceptable at or below.
        lower: f64,
        /// Fully satisfactory at or above.
        upper: f64,
    },
    /// Minimize; see [`smaller_is_better`].
    SmallerIsBetter {
        /// Fully satisfactory at or below.
        lower: f64,
        /// Unacceptable at or above.
        upper: f64,
    },
}

impl DesirabilityShape {
    /// Unweighted desirability of `y`.
    #[must_use]
    pub fn evaluate(&self, y: f64) -> f64 {
        match *self {
            Self::Target { target, tolerance } => target_desirability(y, target, tolerance),
            Self::LargerIsBetter { lower, upper } => larger_is_better(y, lower, upper),
            Self::SmallerIsBetter { lower, upper } => smaller_is_better(y, lower, upper),
        }
    }
}

/// A desirability shape with a Derringer–Suich weight.
///
/// The weight is an exponent applied to the linear ramp: values above 1
/// demand closeness to the ideal, values below 1 are more lenient.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesirabilityGoal {
    /// Shape of the function.
    pub shape: DesirabilityShape,
    /// Exponent (default: 1.0).
    pub weight: f64,
}

impl DesirabilityGoal {
    /// Goal with weight 1.
    #[must_use]
    pub fn new(shape: DesirabilityShape) -> Self {
        Self { shape, weight: 1.0 }
    }

    /// Maximize between `lower` and `upper`.
    #[must_use]
    pub fn maximize(lower: f64, upper: f64) -> Self {
        Self::new(DesirabilityShape::LargerIsBetter { lower, upper })
    }

    /// Minimize between `lower` and `upper`.
    #[must_use]
    pub fn minimize(lower: f64, upper: f64) -> Self {
        Self::new(DesirabilityShape::SmallerIsBetter { lower, upper })
    }

    /// Hit `target` within `tolerance`.
    #[must_use]
    pub fn target(target: f64, tolerance: f64) -> Self {
        Self::new(DesirabilityShape::Target { target, tolerance })
    }

    /// Set the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Weighted desirability of `y`.
    #[must_use]
    pub fn evaluate(&self, y: f64) -> f64 {
        let d = self.shape.evaluate(y);
        if d.is_nan() {
            0.0
        } else {
            d.powf(self.weight)
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(Error::invalid_params(format!(
                "desirability weight must be positive, got {}",
                self.weight
            )));
        }
        let (a, b, what) = match self.shape {
            DesirabilityShape::Target { target, tolerance } => (target, tolerance, "target"),
            DesirabilityShape::LargerIsBetter { lower, upper }
            | DesirabilityShape::SmallerIsBetter { lower, upper } => {
                if lower >= upper {
                    return Err(Error::invalid_params(format!(
                        "desirability bounds must satisfy lower < upper, got [{lower}, {upper}]"
                    )));
                }
                (lower, upper, "bounds")
            }
        };
        if !(a.is_finite() && b.is_finite()) {
            return Err(Error::invalid_params(format!(
                "desirability {what} must be finite"
            )));
        }
        Ok(())
    }
}

/// Largest number of points per axis a [`GridSpec`] accepts.
pub const MAX_GRID_STEPS: usize = 4096;

/// Square grid over the coded region searched by [`optimize_desirability`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridSpec {
    /// Half-width of the square: each factor ranges over [−bound, bound] (default: 1.0).
    pub bound: f64,
    /// Points per axis, including both ends (default: 41).
    pub steps: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            bound: 1.0,
            steps: 41,
        }
    }
}

impl GridSpec {
    /// Grid spanning [−bound, bound] with `steps` points per axis.
    #[must_use]
    pub fn new(bound: f64, steps: usize) -> Self {
        Self { bound, steps }
    }

    /// Grid reaching the axial points of a design (±α), or ±1 without them.
    #[must_use]
    pub fn covering(design: &crate::design::Design, steps: usize) -> Self {
        Self::new(design.alpha().map_or(1.0, f64::abs).max(1.0), steps)
    }

    /// Coordinates along one axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] for fewer than two or more than
    /// [`MAX_GRID_STEPS`] steps, or a non-positive bound.
    pub fn axis(&self) -> Result<Vec<f64>> {
        if !(2..=MAX_GRID_STEPS).contains(&self.steps) {
            return Err(Error::invalid_params(format!(
                "grid needs between 2 and {MAX_GRID_STEPS} steps per axis, got {}",
                self.steps
            )));
        }
        if !(self.bound.is_finite() && self.bound > 0.0) {
            return Err(Error::invalid_params(format!(
                "grid bound must be positive, got {}",
                self.bound
            )));
        }
        let span = (self.steps - 1) as f64;
        Ok((0..self.steps)
            .map(|i| -self.bound + 2.0 * self.bound * i as f64 / span)
            .collect())
    }
}

/// Best setting found by a desirability search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesirabilityOptimum {
    /// Names of the two factors.
    pub factors: [String; 2],
    /// Coded level of the first factor.
    pub x1: f64,
    /// Coded level of the second factor.
    pub x2: f64,
    /// Overall desirability at the point.
    pub desirability: f64,
    /// Predicted value of each response.
    pub predictions: Vec<f64>,
    /// Weighted individual desirability of each response.
    pub individual: Vec<f64>,
}

/// Validate the inputs of a search and return the axis coordinates.
pub(crate) fn prepare_search(
    responses: &[(QuadraticModel, DesirabilityGoal)],
    grid: &GridSpec,
) -> Result<Vec<f64>> {
    let Some((first, _)) = responses.first() else {
        return Err(Error::EmptyData);
    };
    if let Some((model, _)) = responses.iter().find(|(m, _)| m.factors != first.factors) {
        return Err(Error::invalid_params(format!(
            "all models must share factors {:?}, found {:?}",
            first.factors, model.factors
        )));
    }
    for (_, goal) in responses {
        goal.validate()?;
    }
    grid.axis()
}

/// Overall desirability at a coded point.
pub(crate) fn score_at(responses: &[(QuadraticModel, DesirabilityGoal)], x1: f64, x2: f64) -> f64 {
    let individual: Vec<f64> = responses
        .iter()
        .map(|(model, goal)| goal.evaluate(model.predict(x1, x2)))
        .collect();
    overall_desirability(&individual)
}

/// Order candidates `(index, score)` by score, preferring the lower index on ties.
pub(crate) fn compare_candidates(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.0.cmp(&a.0))
}

/// Expand the winning flat grid index into a full optimum.
pub(crate) fn optimum_at(
    responses: &[(QuadraticModel, DesirabilityGoal)],
    axis: &[f64],
    index: usize,
) -> DesirabilityOptimum {
    let x1 = axis[index / axis.len()];
    let x2 = axis[index % axis.len()];

    let predictions: Vec<f64> = responses
        .iter()
        .map(|(model, _)| model.predict(x1, x2))
        .collect();
    let individual: Vec<f64> = responses
        .iter()
        .zip(&predictions)
        .map(|((_, goal), &y)| goal.evaluate(y))
        .collect();
    let desirability = overall_desirability(&individual);

    if desirability == 0.0 {
        warn!("no grid point satisfies every response goal");
    }
    debug!(x1, x2, desirability, "desirability optimum");

    DesirabilityOptimum {
        factors: responses[0].0.factors.clone(),
        x1,
        x2,
        desirability,
        predictions,
        individual,
    }
}

/// Grid search for the coded setting that maximizes overall desirability.
///
/// Every model must be fitted over the same two factors. Ties go to the first
/// grid point in row-major order (x1 outer, x2 inner).
///
/// # Errors
///
/// - [`Error::EmptyData`] when no responses are given
/// - [`Error::InvalidParams`] for mismatched factors, invalid goals or an invalid grid
///
/// # Example
///
/// ```
/// use doe_rsm::desirability::{optimize_desirability, DesirabilityGoal, GridSpec};
/// use doe_rsm::rsm::{Coefficients, QuadraticModel};
///
/// let factors = ["Temp".to_string(), "Time".to_string()];
/// // Peak at (0.5, 0)
/// let model = QuadraticModel::new(
///     factors,
///     Coefficients { b0: 80.0, b1: 4.0, b2: 0.0, b11: -4.0, b22: -2.0, b12: 0.0 },
/// );
///
/// let best = optimize_desirability(
///     &[(model, DesirabilityGoal::maximize(60.0, 81.0))],
///     &GridSpec::new(1.0, 21),
/// )
/// .unwrap();
///
/// assert!((best.x1 - 0.5).abs() < 1e-12);
/// assert!(best.x2.abs() < 1e-12);
/// assert!((best.desirability - 1.0).abs() < 1e-12);
/// ```
pub fn optimize_desirability(
    responses: &[(QuadraticModel, DesirabilityGoal)],
    grid: &GridSpec,
) -> Result<DesirabilityOptimum> {
    let axis = prepare_search(responses, grid)?;
    let n = axis.len();

    let best = (0..n * n)
        .map(|i| (i, score_at(responses, axis[i / n], axis[i % n])))
        .max_by(compare_candidates)
        .map_or(0, |(i, _)| i);

    Ok(optimum_at(responses, &axis, best))
}
