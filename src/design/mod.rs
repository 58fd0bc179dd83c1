//! Experimental designs in coded units.
//!
//! This module provides the data structure shared by every generator and
//! analysis routine in the crate.
//!
//! ## Overview
//!
//! - [`Design`]: a runs × factors matrix of coded levels with factor names
//! - [`DesignPoint`]: one row viewed as a mapping from factor name to level
//! - [`PointKind`]: whether a row is a factorial, axial (star) or center point
//!
//! ## Generators
//!
//! - [`full_factorial`]: all 2^k combinations of ±1
//! - [`fractional_factorial`]: a 2^(k−p) fraction defined by generators
//! - [`central_composite`] / [`CcdBuilder`]: factorial + axial + center points
//!
//! Coded levels are normally −1, 0 and +1; axial points of a central
//! composite design sit at ±α on a single axis.

mod coding;
mod composite;
mod factorial;

pub use coding::{code_value, decode_value, FactorRange};
pub use composite::{
    central_composite, rotatable_alpha, CcdBuilder, CcdVariant, DEFAULT_CENTER_POINTS,
};
pub use factorial::{fractional_factorial, full_factorial, FractionalDesign, Generator};

use ndarray::{Array2, ArrayView1};
use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum number of factors any generator accepts.
pub const MIN_FACTORS: usize = 1;
/// Maximum number of factors any generator accepts (2^10 runs).
pub const MAX_FACTORS: usize = 10;

/// Tolerance used when matching a coded value against a nominal level.
pub(crate) const LEVEL_TOLERANCE: f64 = 1e-9;

/// Whether `value` equals the coded `level` within [`LEVEL_TOLERANCE`].
#[inline]
pub(crate) fn at_level(value: f64, level: f64) -> bool {
    (value - level).abs() <= LEVEL_TOLERANCE
}

/// Role of a run within a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointKind {
    /// Corner of the factorial cube (every factor at ±1).
    Factorial,
    /// Star point on one axis, all other factors at 0.
    Axial,
    /// Every factor at 0.
    Center,
}

impl PointKind {
    /// Infer the kind of a row from its coded levels.
    #[must_use]
    pub fn infer(levels: &[f64]) -> Self {
        if levels.iter().all(|&x| at_level(x, 0.0)) {
            Self::Center
        } else if levels.iter().all(|&x| at_level(x.abs(), 1.0)) {
            Self::Factorial
        } else {
            Self::Axial
        }
    }

    /// Short lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Factorial => "factorial",
            Self::Axial => "axial",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single run of a design.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignPoint {
    /// Role of the run.
    pub kind: PointKind,
    /// Coded level per factor, in design column order.
    pub levels: Vec<(String, f64)>,
}

impl DesignPoint {
    /// Coded level of the named factor.
    #[must_use]
    pub fn get(&self, factor: &str) -> Option<f64> {
        self.levels
            .iter()
            .find(|(name, _)| name == factor)
            .map(|&(_, v)| v)
    }
}

/// Counts of high and low runs per factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    /// Factor names, in design column order.
    pub factors: Vec<String>,
    /// Number of runs at +1 for each factor.
    pub high_counts: Vec<usize>,
    /// Number of runs at −1 for each factor.
    pub low_counts: Vec<usize>,
}

impl BalanceReport {
    /// True when every factor has as many +1 runs as −1 runs, and at least one of each.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.first_unbalanced().is_none()
    }

    /// Index of the first factor that fails the balance check.
    #[must_use]
    pub fn first_unbalanced(&self) -> Option<usize> {
        self.high_counts
            .iter()
            .zip(&self.low_counts)
            .position(|(&h, &l)| h != l || h == 0)
    }
}

/// An experimental design in coded units.
///
/// The matrix has one row per run and one column per factor. Every row
/// carries a [`PointKind`]; designs produced by the central composite
/// generator also remember their axial distance.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Design {
    factor_names: Vec<String>,
    points: Array2<f64>,
    kinds: Vec<PointKind>,
    alpha: Option<f64>,
}

impl Design {
    pub(crate) fn from_parts(
        factor_names: Vec<String>,
        points: Array2<f64>,
        kinds: Vec<PointKind>,
        alpha: Option<f64>,
    ) -> Self {
        debug_assert_eq!(factor_names.len(), points.ncols());
        debug_assert_eq!(kinds.len(), points.nrows());
        Self {
            factor_names,
            points,
            kinds,
            alpha,
        }
    }

    /// Build a design from user-supplied rows of coded levels.
    ///
    /// Point kinds are inferred from the levels. An empty row set is accepted
    /// here; analysis routines reject it with [`Error::EmptyData`].
    ///
    /// # Errors
    ///
    /// Returns an error if there are no factor names, names repeat, or any
    /// row length differs from the number of names.
    ///
    /// # Example
    ///
    /// ```
    /// use doe_rsm::design::{Design, PointKind};
    ///
    /// let design = Design::from_rows(
    ///     &["Temp", "Time"],
    ///     &[vec![-1.0, -1.0], vec![1.0, 1.0], vec![0.0, 0.0]],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(design.runs(), 3);
    /// assert_eq!(design.kinds()[2], PointKind::Center);
    /// ```
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: &[Vec<f64>]) -> Result<Self> {
        let factor_names = validate_names(names)?;
        let k = factor_names.len();

        let mut data = Vec::with_capacity(rows.len() * k);
        let mut kinds = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != k {
                return Err(Error::DimensionMismatch {
                    expected: format!("{k} levels in row {}", i + 1),
                    actual: format!("{} levels", row.len()),
                });
            }
            kinds.push(PointKind::infer(row));
            data.extend_from_slice(row);
        }

        let points = Array2::from_shape_vec((rows.len(), k), data)
            .map_err(|e| Error::invalid_params(e.to_string()))?;

        Ok(Self::from_parts(factor_names, points, kinds, None))
    }

    /// Number of runs (rows).
    #[must_use]
    pub fn runs(&self) -> usize {
        self.points.nrows()
    }

    /// Number of factors (columns).
    #[must_use]
    pub fn factors(&self) -> usize {
        self.points.ncols()
    }

    /// Whether the design has no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs() == 0
    }

    /// Factor names in column order.
    #[must_use]
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Column index of the named factor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFactor`] if no factor has this name.
    pub fn factor_index(&self, name: &str) -> Result<usize> {
        self.factor_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::UnknownFactor(name.to_string()))
    }

    /// The coded matrix, shape (runs, factors).
    #[must_use]
    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    /// Point kind for every run.
    #[must_use]
    pub fn kinds(&self) -> &[PointKind] {
        &self.kinds
    }

    /// Axial distance, if the design has axial points.
    #[must_use]
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    /// Coded levels of the named factor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFactor`] if no factor has this name.
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self.factor_index(name)?;
        Ok(self.points.column(idx))
    }

    /// Coded level of `name` in run `row`.
    ///
    /// # Errors
    ///
    /// Returns an error if the factor is unknown or the row is out of range.
    pub fn level(&self, row: usize, name: &str) -> Result<f64> {
        let col = self.factor_index(name)?;
        self.points
            .get([row, col])
            .copied()
            .ok_or_else(|| Error::invalid_params(format!("row {row} out of range")))
    }

    /// View run `row` as a [`DesignPoint`].
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn point(&self, row: usize) -> DesignPoint {
        let levels = self
            .factor_names
            .iter()
            .zip(self.points.row(row))
            .map(|(name, &v)| (name.clone(), v))
            .collect();
        DesignPoint {
            kind: self.kinds[row],
            levels,
        }
    }

    /// Iterate over the runs as [`DesignPoint`]s.
    pub fn iter_points(&self) -> impl Iterator<Item = DesignPoint> + '_ {
        (0..self.runs()).map(move |row| self.point(row))
    }

    /// Row indices of runs with the given kind.
    #[must_use]
    pub fn rows_of_kind(&self, kind: PointKind) -> Vec<usize> {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, &k)| k == kind)
            .map(|(i, _)| i)
            .collect()
    }

    /// Half-width of the factorial block in coded units.
    ///
    /// 1 for factorial, circumscribed and face-centred designs; 1/α for an
    /// inscribed composite design. Designs without factorial runs report 1.
    #[must_use]
    pub fn cube_level(&self) -> f64 {
        self.kinds
            .iter()
            .position(|&k| k == PointKind::Factorial)
            .filter(|_| self.factors() > 0)
            .map(|row| self.points[[row, 0]].abs())
            .filter(|&c| c.is_finite() && c > 0.0)
            .unwrap_or(1.0)
    }

    /// Coded matrix on the two-level scale used for effect estimation.
    ///
    /// When the factorial block already sits at ±1 this is the design itself.
    /// Otherwise factorial runs are rescaled to ±1 and every other run is
    /// zeroed, so only the factorial block carries low and high levels.
    pub(crate) fn two_level_points(&self) -> Cow<'_, Array2<f64>> {
        let cube = self.cube_level();
        if at_level(cube, 1.0) {
            return Cow::Borrowed(&self.points);
        }

        let mut scaled = Array2::zeros(self.points.raw_dim());
        for (row, kind) in self.kinds.iter().enumerate() {
            if *kind == PointKind::Factorial {
                for (j, &v) in self.points.row(row).iter().enumerate() {
                    scaled[[row, j]] = v / cube;
                }
            }
        }
        Cow::Owned(scaled)
    }

    /// Row indices where every factor sits at its low or high level.
    ///
    /// The factorial block of an inscribed design counts as ±1.
    #[must_use]
    pub fn cube_rows(&self) -> Vec<usize> {
        self.two_level_points()
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|&x| at_level(x.abs(), 1.0)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Count low and high runs for every factor, on the same scale as [`Design::cube_rows`].
    #[must_use]
    pub fn balance_report(&self) -> BalanceReport {
        let mut high_counts = Vec::with_capacity(self.factors());
        let mut low_counts = Vec::with_capacity(self.factors());

        for column in self.two_level_points().columns() {
            high_counts.push(column.iter().filter(|&&x| at_level(x, 1.0)).count());
            low_counts.push(column.iter().filter(|&&x| at_level(x, -1.0)).count());
        }

        BalanceReport {
            factors: self.factor_names.clone(),
            high_counts,
            low_counts,
        }
    }

    /// Convert the coded matrix to natural units.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `ranges` does not have one
    /// entry per factor.
    pub fn decode(&self, ranges: &[FactorRange]) -> Result<Array2<f64>> {
        if ranges.len() != self.factors() {
            return Err(Error::DimensionMismatch {
                expected: format!("{} factor ranges", self.factors()),
                actual: format!("{} factor ranges", ranges.len()),
            });
        }

        let mut natural = self.points.clone();
        for (mut column, range) in natural.columns_mut().into_iter().zip(ranges) {
            column.mapv_inplace(|c| range.decode(c));
        }
        Ok(natural)
    }
}

/// Validate factor names: non-empty, unique.
pub(crate) fn validate_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    if names.is_empty() {
        return Err(Error::invalid_params("at least one factor name is required"));
    }

    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(Error::invalid_params("factor names must not be empty"));
        }
        if out.iter().any(|n| n == name) {
            return Err(Error::invalid_params(format!(
                "duplicate factor name '{name}'"
            )));
        }
        out.push(name.to_string());
    }
    Ok(out)
}

/// Resolve optional user names, defaulting to `A`, `B`, `C`, ...
pub(crate) fn resolve_names(k: usize, names: Option<&[&str]>) -> Result<Vec<String>> {
    match names {
        Some(names) => {
            if names.len() != k {
                return Err(Error::DimensionMismatch {
                    expected: format!("{k} factor names"),
                    actual: format!("{} factor names", names.len()),
                });
            }
            validate_names(names)
        }
        None => Ok(default_names(k)),
    }
}

/// Letter names `A`, `B`, ... for `k` factors.
#[must_use]
pub fn default_names(k: usize) -> Vec<String> {
    (b'A'..=b'Z')
        .take(k)
        .map(|c| char::from(c).to_string())
        .collect()
}

impl fmt::Debug for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Design({} runs, factors {:?}) with data {:?}",
            self.runs(),
            self.factor_names,
            self.points
        )
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>4} {:>9}", "run", "type")?;
        for name in &self.factor_names {
            write!(f, " {name:>8}")?;
        }
        writeln!(f)?;

        for (i, row) in self.points.rows().into_iter().enumerate() {
            write!(f, "{:>4} {:>9}", i + 1, self.kinds[i])?;
            for v in row {
                write!(f, " {v:>8.3}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
