//! Statistical analysis of two-level and composite experiments.
//!
//! This module provides:
//! - Main and two-factor interaction effects
//! - ANOVA with optional pooling of small terms
//! - Confidence intervals for effects
//! - A one-call pipeline, [`analyze`], over a [`ResponseTable`]
//!
//! ## Quick Start
//!
//! ```rust
//! use doe_rsm::analysis::{analyze, AnalysisConfig, ResponseTable};
//! use doe_rsm::design::full_factorial;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let design = full_factorial(3, Some(&["Temp", "Time", "Conc"]))?;
//!
//! let mut table = ResponseTable::new(design);
//! table.add_response("Yield", vec![45.0, 71.0, 48.0, 65.0, 68.0, 60.0, 80.0, 65.0])?;
//!
//! let result = analyze(&table, "Yield", &AnalysisConfig::default())?;
//!
//! println!("Grand mean: {:.2}", result.grand_mean);
//! for effect in &result.effects {
//!     println!("{:>2}. {:<10} {:+.3}", effect.rank, effect.name, effect.estimate);
//! }
//! println!("{}", result.anova);
//! # Ok(())
//! # }
//! ```
//!
//! ## Effects
//!
//! An effect is the change in mean response when a factor moves from −1 to
//! +1. Only runs at exactly ±1 count, so the axial and center runs of a
//! composite design do not bias the estimates.
//!
//! ## ANOVA
//!
//! Each term carries one degree of freedom. The error term is the residual
//! of the total sum of squares, so a saturated design has no error degrees
//! of freedom and reports no F ratios.

mod anova;
pub(crate) mod effects;
mod stats;
mod types;

pub use anova::perform_anova;
pub use effects::{estimate_effects, interaction_effect, main_effect};
pub use stats::{
    f_distribution_p_value, ln_gamma, regularized_incomplete_beta, student_t_cdf, t_value,
};
pub use types::{
    Analysis, AnalysisConfig, AnovaConfig, AnovaEntry, AnovaTable, ConfidenceInterval, Effect,
    Term,
};

use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::design::{Design, DesignPoint};
use crate::error::{Error, Result};
use crate::rsm::fit_quadratic;

/// A design together with one or more named response columns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResponseTable {
    design: Design,
    responses: Vec<(String, Vec<f64>)>,
}

/// One run of a [`ResponseTable`]: its design point and measured responses.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResponseRow {
    /// Factor settings of the run.
    pub point: DesignPoint,
    /// Response values, in the order the columns were added.
    pub responses: Vec<(String, f64)>,
}

impl ResponseRow {
    /// Value of the named response.
    #[must_use]
    pub fn get(&self, response: &str) -> Option<f64> {
        self.responses
            .iter()
            .find(|(name, _)| name == response)
            .map(|&(_, v)| v)
    }
}

impl ResponseTable {
    /// Create a table with no response columns yet.
    #[must_use]
    pub fn new(design: Design) -> Self {
        Self {
            design,
            responses: Vec::new(),
        }
    }

    /// The underlying design.
    #[must_use]
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Names of the response columns.
    pub fn response_names(&self) -> impl Iterator<Item = &str> {
        self.responses.iter().map(|(name, _)| name.as_str())
    }

    /// Add or replace a response column.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParams`] for an empty name
    /// - [`Error::DimensionMismatch`] if `values` has a different length than the design
    pub fn add_response(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_params("response name cannot be empty"));
        }
        if values.len() != self.design.runs() {
            return Err(Error::length_mismatch(self.design.runs(), values.len()));
        }

        match self.responses.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.responses.push((name, values)),
        }
        Ok(())
    }

    /// Values of the named response column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResponse`] if no such column exists.
    pub fn response(&self, name: &str) -> Result<&[f64]> {
        self.responses
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| Error::UnknownResponse(name.to_string()))
    }

    /// Iterate over the runs with their responses.
    pub fn rows(&self) -> impl Iterator<Item = ResponseRow> + '_ {
        self.design.iter_points().enumerate().map(move |(row, point)| {
            let responses = self
                .responses
                .iter()
                .map(|(name, values)| (name.clone(), values[row]))
                .collect();
            ResponseRow { point, responses }
        })
    }
}

/// Run the complete analysis of one response column.
///
/// Computes the grand mean, ranked effects, the ANOVA table and effect
/// confidence intervals. For two-factor designs with
/// [`AnalysisConfig::fit_surface`] set, a quadratic surface is fitted as well;
/// a failed fit is logged and leaves [`Analysis::surface`] empty.
///
/// # Errors
///
/// - [`Error::UnknownResponse`] if the column does not exist
/// - [`Error::InvalidParams`] for a confidence level outside (0, 1)
/// - any error from [`estimate_effects`] or [`perform_anova`]
pub fn analyze(table: &ResponseTable, response: &str, config: &AnalysisConfig) -> Result<Analysis> {
    let y = table.response(response)?;
    let design = table.design();

    if !(config.confidence_level > 0.0 && config.confidence_level < 1.0) {
        return Err(Error::invalid_params(format!(
            "confidence level must be in (0, 1), got {}",
            config.confidence_level
        )));
    }
    effects::validate_data(design, y)?;

    let grand_mean = y.iter().sum::<f64>() / y.len() as f64;

    let terms = Term::all(design.factors(), config.anova.include_interactions);
    let effects = effects::estimate_terms(design, y, &terms)?;
    let anova = perform_anova(design, y, &config.anova)?;

    let effect_intervals = effects
        .iter()
        .filter_map(|e| {
            anova
                .effect_interval(&e.name, config.confidence_level)
                .map(|ci| (e.name.clone(), ci))
        })
        .collect();

    let surface = if config.fit_surface && design.factors() == 2 {
        match fit_quadratic(design, y) {
            Ok(model) => {
                let sp = model.stationary_point();
                let bound = design.alpha().map_or(1.0, f64::abs).max(1.0);
                if !sp.is_degenerate() && (sp.x1.abs() > bound || sp.x2.abs() > bound) {
                    warn!(
                        x1 = sp.x1,
                        x2 = sp.x2,
                        bound,
                        "stationary point lies outside the explored region"
                    );
                }
                Some(model)
            }
            Err(err) => {
                warn!(%err, "skipping quadratic surface");
                None
            }
        }
    } else {
        None
    };

    debug!(
        response,
        grand_mean,
        r_squared = anova.r_squared(),
        "analysis complete"
    );
    info!(response, runs = design.runs(), terms = effects.len(), "analyzed response");

    Ok(Analysis {
        response: response.to_string(),
        grand_mean,
        effects,
        anova,
        effect_intervals,
        surface,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{central_composite, full_factorial, CcdVariant, PointKind};
    use approx::assert_relative_eq;

    fn yield_table() -> ResponseTable {
        let design = full_factorial(3, Some(&["Temp", "Time", "Conc"])).unwrap();
        let mut table = ResponseTable::new(design);
        table
            .add_response("Yield", vec![10.0, 30.0, 11.0, 29.0, 10.5, 30.5, 9.5, 31.0])
            .unwrap();
        table
    }

    #[test]
    fn test_response_table() {
        let mut table = yield_table();
        assert_eq!(table.response("Yield").unwrap()[1], 30.0);
        assert_eq!(
            table.response("Cost"),
            Err(Error::UnknownResponse("Cost".into()))
        );
        assert!(matches!(
            table.add_response("Cost", vec![1.0; 3]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(table.add_response(" ", vec![1.0; 8]).is_err());

        table.add_response("Cost", vec![2.0; 8]).unwrap();
        table.add_response("Cost", vec![3.0; 8]).unwrap();
        assert_eq!(table.response_names().collect::<Vec<_>>(), ["Yield", "Cost"]);
        assert_eq!(table.response("Cost").unwrap()[0], 3.0);
    }

    #[test]
    fn test_rows() {
        let mut table = yield_table();
        table.add_response("Cost", vec![5.0; 8]).unwrap();

        let rows: Vec<ResponseRow> = table.rows().collect();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[1].point.get("Temp"), Some(1.0));
        assert_eq!(rows[1].point.get("Time"), Some(-1.0));
        assert_eq!(rows[1].get("Yield"), Some(30.0));
        assert_eq!(rows[1].get("Cost"), Some(5.0));
        assert_eq!(rows[1].get("Purity"), None);
    }

    #[test]
    fn test_analyze_three_factors() {
        let table = yield_table();
        let result = analyze(&table, "Yield", &AnalysisConfig::default()).unwrap();

        assert_relative_eq!(result.grand_mean, 20.1875);
        assert_eq!(result.effects.len(), 6);
        assert_eq!(result.effects[0].rank, 1);

        let temp = result.effects.iter().find(|e| e.name == "Temp").unwrap();
        assert_eq!(temp.rank, 1);
        assert_relative_eq!(temp.estimate, 19.875);

        assert_eq!(result.anova.error_df, 1);
        assert_eq!(result.effect_intervals.len(), 6);
        assert!(result.surface.is_none());
    }

    #[test]
    fn test_analyze_without_interactions() {
        let table = yield_table();
        let config = AnalysisConfig {
            anova: AnovaConfig {
                include_interactions: false,
                ..AnovaConfig::default()
            },
            ..AnalysisConfig::default()
        };
        let result = analyze(&table, "Yield", &config).unwrap();

        assert_eq!(result.effects.len(), 3);
        assert_eq!(result.anova.error_df, 4);
        let (name, ci) = result
            .effect_intervals
            .iter()
            .find(|(n, _)| n == "Temp")
            .unwrap();
        assert_eq!(name, "Temp");
        assert!(ci.excludes_zero());
        assert_relative_eq!(ci.level, 0.95);
    }

    #[test]
    fn test_analyze_fits_surface_for_two_factor_ccd() {
        let ccd = central_composite(2, CcdVariant::Circumscribed, 3).unwrap();
        let y: Vec<f64> = ccd
            .points()
            .rows()
            .into_iter()
            .map(|r| 70.0 + 2.0 * r[0] + r[1] - 1.5 * r[0] * r[0] - 1.5 * r[1] * r[1])
            .collect();

        let mut table = ResponseTable::new(ccd);
        table.add_response("y", y).unwrap();
        let result = analyze(&table, "y", &AnalysisConfig::default()).unwrap();

        let surface = result.surface.unwrap();
        assert_relative_eq!(surface.coefficients.b0, 70.0, epsilon = 1e-10);
        assert_relative_eq!(surface.coefficients.b1, 2.0, epsilon = 1e-10);
        // Center mean 70, factorial mean 67
        assert_relative_eq!(surface.coefficients.b11, 1.5, epsilon = 1e-10);
        assert_eq!(table.design().rows_of_kind(PointKind::Center).len(), 3);
    }

    #[test]
    fn test_analyze_inscribed_composite() {
        let ccd = central_composite(2, CcdVariant::Inscribed, 3).unwrap();
        let y: Vec<f64> = ccd
            .points()
            .rows()
            .into_iter()
            .map(|r| 70.0 + 2.0 * r[0] + r[1] - 1.5 * r[0] * r[0] - 1.5 * r[1] * r[1])
            .collect();

        let mut table = ResponseTable::new(ccd);
        table.add_response("y", y).unwrap();
        let result = analyze(&table, "y", &AnalysisConfig::default()).unwrap();

        let a = result.effects.iter().find(|e| e.name == "A").unwrap();
        assert_relative_eq!(a.estimate, 2.0 * 2.0_f64.sqrt(), epsilon = 1e-10);
        assert_eq!(result.anova.entry("A").unwrap().runs, 4);

        let surface = result.surface.unwrap();
        assert_relative_eq!(surface.coefficients.b0, 70.0, epsilon = 1e-10);
        assert_relative_eq!(surface.coefficients.b1, 2.0, epsilon = 1e-10);
        assert_relative_eq!(surface.coefficients.b2, 1.0, epsilon = 1e-10);
        // Factorial runs sit at ±1/√2, so their mean is 70 - 1.5 = 68.5
        assert_relative_eq!(surface.coefficients.b11, 1.5, epsilon = 1e-10);
    }

    #[test]
    fn test_analyze_rejects_bad_config() {
        let table = yield_table();
        let config = AnalysisConfig {
            confidence_level: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            analyze(&table, "Yield", &config),
            Err(Error::InvalidParams { .. })
        ));
        assert!(analyze(&table, "Missing", &AnalysisConfig::default()).is_err());
    }
}
