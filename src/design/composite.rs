//! Central composite designs for fitting second-order models.
//!
//! A central composite design (CCD) combines three blocks of runs:
//!
//! | Block | Runs | Levels |
//! |-------|------|--------|
//! | Factorial | 2^k | every factor at ±1 |
//! | Axial | 2k | one factor at ±α, others at 0 |
//! | Center | n₀ | every factor at 0 |
//!
//! The rotatable axial distance is α = (2^k)^(1/4), which gives equal
//! prediction variance at equal distance from the center.
//!
//! ## Example
//!
//! ```
//! use doe_rsm::design::{CcdBuilder, CcdVariant};
//!
//! let ccd = CcdBuilder::new()
//!     .factors(2)
//!     .variant(CcdVariant::Circumscribed)
//!     .center_points(5)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(ccd.runs(), 4 + 4 + 5);
//! assert!((ccd.alpha().unwrap() - 2f64.sqrt()).abs() < 1e-12);
//! ```

use ndarray::Array2;
use std::fmt;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::factorial::{check_factor_count, standard_level};
use super::{resolve_names, Design, PointKind};
use crate::error::{Error, Result};

/// Smallest number of factors a CCD accepts.
const MIN_CCD_FACTORS: usize = 2;

/// Default number of replicated center points.
pub const DEFAULT_CENTER_POINTS: usize = 5;

/// Placement of the axial and factorial blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CcdVariant {
    /// Factorial points at ±1, axial points at the rotatable ±α outside the cube.
    #[default]
    Circumscribed,
    /// Factorial points scaled to ±1/α so axial points sit at ±1.
    Inscribed,
    /// Axial points on the cube faces (α = 1).
    FaceCentered,
}

impl CcdVariant {
    /// Short label, as used by common DOE software.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circumscribed => "ccc",
            Self::Inscribed => "cci",
            Self::FaceCentered => "ccf",
        }
    }
}

impl fmt::Display for CcdVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rotatable axial distance α = (2^k)^(1/4).
#[must_use]
pub fn rotatable_alpha(k: usize) -> f64 {
    (2f64.powi(k as i32)).powf(0.25)
}

/// Generate a central composite design.
///
/// # Arguments
///
/// * `k` - Number of factors, 2 through 10
/// * `variant` - Placement of the axial points
/// * `center_points` - Number of replicated center runs
///
/// # Errors
///
/// Returns [`Error::TooFewFactors`] when `k < 2` and
/// [`Error::InvalidFactorCount`] when `k > 10`.
pub fn central_composite(k: usize, variant: CcdVariant, center_points: usize) -> Result<Design> {
    build_ccd(k, None, variant, center_points)
}

fn build_ccd(
    k: usize,
    names: Option<&[&str]>,
    variant: CcdVariant,
    center_points: usize,
) -> Result<Design> {
    if k < MIN_CCD_FACTORS {
        return Err(Error::TooFewFactors {
            factors: k,
            min: MIN_CCD_FACTORS,
            design: "CCD",
        });
    }
    check_factor_count(k)?;
    let names = resolve_names(k, names)?;

    let rotatable = rotatable_alpha(k);
    let (cube, axial) = match variant {
        CcdVariant::Circumscribed => (1.0, rotatable),
        CcdVariant::Inscribed => (1.0 / rotatable, 1.0),
        CcdVariant::FaceCentered => (1.0, 1.0),
    };

    let factorial_runs = 1usize << k;
    let axial_runs = 2 * k;
    let runs = factorial_runs + axial_runs + center_points;

    let mut points = Array2::zeros((runs, k));
    let mut kinds = Vec::with_capacity(runs);

    for i in 0..factorial_runs {
        for j in 0..k {
            points[[i, j]] = cube * standard_level(i, j);
        }
        kinds.push(PointKind::Factorial);
    }

    for j in 0..k {
        let row = factorial_runs + 2 * j;
        points[[row, j]] = -axial;
        points[[row + 1, j]] = axial;
        kinds.push(PointKind::Axial);
        kinds.push(PointKind::Axial);
    }

    // Center rows are already zero.
    kinds.extend(std::iter::repeat(PointKind::Center).take(center_points));

    debug!(
        factors = k,
        %variant,
        alpha = axial,
        runs,
        "generated central composite design"
    );

    Ok(Design::from_parts(names, points, kinds, Some(axial)))
}

/// Builder for central composite designs.
///
/// Defaults: circumscribed (rotatable) variant and five center points.
#[derive(Debug, Clone, Default)]
pub struct CcdBuilder {
    factors: Option<usize>,
    names: Option<Vec<String>>,
    variant: CcdVariant,
    center_points: Option<usize>,
}

impl CcdBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of factors.
    #[must_use]
    pub fn factors(mut self, factors: usize) -> Self {
        self.factors = Some(factors);
        self
    }

    /// Set factor names; the factor count follows from their number.
    #[must_use]
    pub fn names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.names = Some(names.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    /// Set the design variant.
    #[must_use]
    pub fn variant(mut self, variant: CcdVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the number of center points.
    #[must_use]
    pub fn center_points(mut self, n: usize) -> Self {
        self.center_points = Some(n);
        self
    }

    /// Build the design.
    ///
    /// # Errors
    ///
    /// Returns an error if neither factors nor names were set, if they
    /// disagree, or if the factor count is invalid for a CCD.
    pub fn build(self) -> Result<Design> {
        let k = match (&self.names, self.factors) {
            (Some(names), Some(k)) if names.len() != k => {
                return Err(Error::DimensionMismatch {
                    expected: format!("{k} factor names"),
                    actual: format!("{} factor names", names.len()),
                });
            }
            (Some(names), _) => names.len(),
            (None, Some(k)) => k,
            (None, None) => {
                return Err(Error::invalid_params("factors or names must be specified"));
            }
        };

        let names: Option<Vec<&str>> = self
            .names
            .as_ref()
            .map(|n| n.iter().map(String::as_str).collect());

        build_ccd(
            k,
            names.as_deref(),
            self.variant,
            self.center_points.unwrap_or(DEFAULT_CENTER_POINTS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ccd_run_counts() {
        for k in 2..=10 {
            for &n0 in &[0, 1, 5] {
                let ccd = central_composite(k, CcdVariant::Circumscribed, n0).unwrap();
                assert_eq!(ccd.runs(), (1 << k) + 2 * k + n0);
                assert_relative_eq!(
                    ccd.alpha().unwrap(),
                    (2f64.powi(k as i32)).powf(0.25),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_ccd_blocks() {
        let ccd = central_composite(3, CcdVariant::Circumscribed, 2).unwrap();
        let alpha = ccd.alpha().unwrap();
        assert_relative_eq!(alpha, 8f64.powf(0.25), epsilon = 1e-12);

        assert_eq!(ccd.rows_of_kind(PointKind::Factorial).len(), 8);
        assert_eq!(ccd.rows_of_kind(PointKind::Axial).len(), 6);
        assert_eq!(ccd.rows_of_kind(PointKind::Center).len(), 2);

        // Axial pair for factor B: rows 10 and 11
        let low = ccd.point(10);
        let high = ccd.point(11);
        assert_eq!(low.get("B"), Some(-alpha));
        assert_eq!(high.get("B"), Some(alpha));
        assert_eq!(low.get("A"), Some(0.0));
        assert_eq!(high.get("C"), Some(0.0));

        // Center rows are all zero
        for row in ccd.rows_of_kind(PointKind::Center) {
            assert!(ccd.points().row(row).iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_ccd_variants() {
        let face = central_composite(2, CcdVariant::FaceCentered, 1).unwrap();
        assert_eq!(face.alpha(), Some(1.0));
        assert!(face.points().iter().all(|&x| x.abs() <= 1.0));

        let inscribed = central_composite(2, CcdVariant::Inscribed, 1).unwrap();
        assert_eq!(inscribed.alpha(), Some(1.0));
        assert_relative_eq!(
            inscribed.points()[[0, 0]].abs(),
            1.0 / 2f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_ccd_too_few_factors() {
        let err = central_composite(1, CcdVariant::Circumscribed, 3).unwrap_err();
        assert!(matches!(err, Error::TooFewFactors { factors: 1, min: 2, .. }));
        assert!(central_composite(11, CcdVariant::Circumscribed, 3).is_err());
    }

    #[test]
    fn test_builder() {
        let ccd = CcdBuilder::new()
            .names(&["Temp", "Time"])
            .center_points(3)
            .build()
            .unwrap();
        assert_eq!(ccd.runs(), 11);
        assert_eq!(ccd.factor_names()[1], "Time");

        let ccd = CcdBuilder::new().factors(3).build().unwrap();
        assert_eq!(ccd.runs(), 8 + 6 + DEFAULT_CENTER_POINTS);

        assert!(CcdBuilder::new().build().is_err());
        assert!(CcdBuilder::new().factors(3).names(&["A", "B"]).build().is_err());
    }
}
