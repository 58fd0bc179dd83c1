//! Conversion between natural units and coded levels.
//!
//! A factor run between `low` and `high` is coded so that `low` maps to −1,
//! `high` to +1 and the midpoint to 0.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Code a natural value: `(value - center) / half_range`.
///
/// # Example
///
/// ```
/// use doe_rsm::design::{code_value, decode_value};
///
/// let coded = code_value(30.0, 25.0, 6.0);
/// assert!((coded - 0.8333).abs() < 1e-4);
/// assert!((decode_value(coded, 25.0, 6.0) - 30.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn code_value(value: f64, center: f64, half_range: f64) -> f64 {
    (value - center) / half_range
}

/// Decode a coded level: `center + coded * half_range`.
#[must_use]
pub fn decode_value(coded: f64, center: f64, half_range: f64) -> f64 {
    center + coded * half_range
}

/// Natural-unit range of a factor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorRange {
    low: f64,
    high: f64,
}

impl FactorRange {
    /// Create a range from the low and high settings.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is not finite or `low >= high`.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(Error::invalid_params("factor range bounds must be finite"));
        }
        if low >= high {
            return Err(Error::invalid_params(format!(
                "factor range low {low} must be below high {high}"
            )));
        }
        Ok(Self { low, high })
    }

    /// Natural value coded as −1.
    #[must_use]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Natural value coded as +1.
    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Midpoint, coded as 0.
    #[must_use]
    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    /// Half the width of the range.
    #[must_use]
    pub fn half_range(&self) -> f64 {
        (self.high - self.low) / 2.0
    }

    /// Code a natural value.
    #[must_use]
    pub fn code(&self, value: f64) -> f64 {
        code_value(value, self.center(), self.half_range())
    }

    /// Decode a coded level.
    #[must_use]
    pub fn decode(&self, coded: f64) -> f64 {
        decode_value(coded, self.center(), self.half_range())
    }
}
