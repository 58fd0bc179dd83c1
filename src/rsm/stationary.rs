//! Stationary point and canonical analysis of a quadratic surface.

use std::fmt;

use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::quadratic::Coefficients;
use crate::design::FactorRange;

/// Determinant magnitude below which the surface is treated as degenerate.
pub const DEGENERATE_THRESHOLD: f64 = 1e-10;

/// Shape of the surface around its stationary point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurfaceKind {
    /// Both canonical curvatures negative.
    Maximum,
    /// Both canonical curvatures positive.
    Minimum,
    /// Curvatures of opposite sign.
    Saddle,
    /// No unique stationary point (ridge or plane).
    Degenerate,
}

impl SurfaceKind {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
            Self::Saddle => "saddle",
            Self::Degenerate => "degenerate",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stationary point of a two-factor quadratic surface, in coded units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationaryPoint {
    /// Coded level of the first factor (NaN when degenerate).
    pub x1: f64,
    /// Coded level of the second factor (NaN when degenerate).
    pub x2: f64,
    /// Predicted response at the point (NaN when degenerate).
    pub predicted: f64,
    /// Classification.
    pub kind: SurfaceKind,
    /// Eigenvalues of the quadratic-form matrix, largest first.
    pub eigenvalues: [f64; 2],
}

impl StationaryPoint {
    /// Whether a unique point exists.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.kind == SurfaceKind::Degenerate
    }

    /// Euclidean distance from the design center in coded units.
    #[must_use]
    pub fn distance_from_center(&self) -> f64 {
        self.x1.hypot(self.x2)
    }

    /// Convert the point to natural units.
    #[must_use]
    pub fn to_natural(&self, ranges: &[FactorRange; 2]) -> (f64, f64) {
        (ranges[0].decode(self.x1), ranges[1].decode(self.x2))
    }
}

/// Canonical curvatures: eigenvalues of [[b11, b12/2], [b12/2, b22]].
fn canonical_eigenvalues(c: &Coefficients) -> [f64; 2] {
    let mid = (c.b11 + c.b22) / 2.0;
    let radius = ((c.b11 - c.b22) / 2.0).hypot(c.b12 / 2.0);
    [mid + radius, mid - radius]
}

/// Locate and classify the stationary point of a quadratic surface.
///
/// Setting the gradient to zero gives
///
/// ```text
/// [2·b11   b12 ] [x1]   [-b1]
/// [ b12   2·b22] [x2] = [-b2]
/// ```
///
/// When |det| < [`DEGENERATE_THRESHOLD`] there is no unique solution and the
/// result is [`SurfaceKind::Degenerate`] with NaN coordinates. Otherwise a
/// positive determinant gives a maximum (negative trace) or minimum, and a
/// negative determinant a saddle.
///
/// # Example
///
/// ```
/// use doe_rsm::rsm::{find_stationary_point, Coefficients, SurfaceKind};
///
/// // ŷ = 10 + 2·x1 - x1² - x2²  peaks at (1, 0)
/// let c = Coefficients { b0: 10.0, b1: 2.0, b2: 0.0, b11: -1.0, b22: -1.0, b12: 0.0 };
/// let sp = find_stationary_point(&c);
///
/// assert_eq!(sp.kind, SurfaceKind::Maximum);
/// assert!((sp.x1 - 1.0).abs() < 1e-12);
/// assert!((sp.predicted - 11.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn find_stationary_point(coefficients: &Coefficients) -> StationaryPoint {
    let c = coefficients;
    let eigenvalues = canonical_eigenvalues(c);
    let det = 4.0 * c.b11 * c.b22 - c.b12 * c.b12;

    if det.abs() < DEGENERATE_THRESHOLD {
        warn!(det, "quadratic surface has no unique stationary point");
        return StationaryPoint {
            x1: f64::NAN,
            x2: f64::NAN,
            predicted: f64::NAN,
            kind: SurfaceKind::Degenerate,
            eigenvalues,
        };
    }

    let x1 = (c.b12 * c.b2 - 2.0 * c.b22 * c.b1) / det;
    let x2 = (c.b12 * c.b1 - 2.0 * c.b11 * c.b2) / det;
    let trace = 2.0 * (c.b11 + c.b22);

    let kind = if det < 0.0 {
        SurfaceKind::Saddle
    } else if trace < 0.0 {
        SurfaceKind::Maximum
    } else {
        SurfaceKind::Minimum
    };

    StationaryPoint {
        x1,
        x2,
        predicted: c.predict(x1, x2),
        kind,
        eigenvalues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn coeffs(b1: f64, b2: f64, b11: f64, b22: f64, b12: f64) -> Coefficients {
        Coefficients {
            b0: 50.0,
            b1,
            b2,
            b11,
            b22,
            b12,
        }
    }

    #[test]
    fn test_maximum() {
        let c = coeffs(2.0, -4.0, -1.0, -2.0, 0.0);
        let sp = find_stationary_point(&c);
        assert_eq!(sp.kind, SurfaceKind::Maximum);
        assert_relative_eq!(sp.x1, 1.0, epsilon = 1e-12);
        assert_relative_eq!(sp.x2, -1.0, epsilon = 1e-12);
        assert_relative_eq!(sp.predicted, 50.0 + 1.0 + 2.0, epsilon = 1e-12);
        assert_eq!(sp.eigenvalues, [-1.0, -2.0]);

        let grad = c.gradient(sp.x1, sp.x2);
        assert_relative_eq!(grad[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(grad[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_minimum_and_saddle() {
        let sp = find_stationary_point(&coeffs(1.0, 1.0, 2.0, 3.0, 1.0));
        assert_eq!(sp.kind, SurfaceKind::Minimum);
        assert!(sp.eigenvalues.iter().all(|&l| l > 0.0));

        let sp = find_stationary_point(&coeffs(1.0, 1.0, 2.0, -3.0, 0.0));
        assert_eq!(sp.kind, SurfaceKind::Saddle);
        assert!(sp.eigenvalues[0] > 0.0 && sp.eigenvalues[1] < 0.0);
    }

    #[test]
    fn test_interaction_only_is_saddle() {
        // ŷ = x1·x2
        let sp = find_stationary_point(&coeffs(0.0, 0.0, 0.0, 0.0, 1.0));
        assert_eq!(sp.kind, SurfaceKind::Saddle);
        assert_relative_eq!(sp.x1, 0.0);
        assert_relative_eq!(sp.x2, 0.0);
        assert_relative_eq!(sp.eigenvalues[0], 0.5);
        assert_relative_eq!(sp.eigenvalues[1], -0.5);
    }

    #[test]
    fn test_degenerate_surface() {
        let sp = find_stationary_point(&coeffs(1.0, 2.0, 0.0, 0.0, 0.0));
        assert_eq!(sp.kind, SurfaceKind::Degenerate);
        assert!(sp.is_degenerate());
        assert!(sp.x1.is_nan() && sp.x2.is_nan() && sp.predicted.is_nan());

        // Ridge: 4·b11·b22 = b12²
        let sp = find_stationary_point(&coeffs(1.0, 1.0, -1.0, -1.0, 2.0));
        assert_eq!(sp.kind, SurfaceKind::Degenerate);
    }

    #[test]
    fn test_to_natural() {
        let sp = find_stationary_point(&coeffs(2.0, -4.0, -1.0, -2.0, 0.0));
        let ranges = [
            FactorRange::new(100.0, 200.0).unwrap(),
            FactorRange::new(10.0, 20.0).unwrap(),
        ];
        let (t, p) = sp.to_natural(&ranges);
        assert_relative_eq!(t, 200.0);
        assert_relative_eq!(p, 10.0);
        assert_relative_eq!(sp.distance_from_center(), 2.0_f64.sqrt());
    }

    #[test]
    fn test_display() {
        assert_eq!(SurfaceKind::Saddle.to_string(), "saddle");
    }
}
