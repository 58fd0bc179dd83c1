//! # doe-rsm
//!
//! Two-level factorial designs, central composite designs, effect and ANOVA
//! analysis, second-order response surfaces and desirability optimization.
//!
//! ## Overview
//!
//! Design of experiments (DOE) varies several factors at once and estimates
//! how each one, and each pair, moves a response. Response surface
//! methodology (RSM) then fits a quadratic model near the optimum and locates
//! its stationary point.
//!
//! This library provides:
//! - 2^k full factorial, 2^(k−p) fractional factorial and central composite designs
//! - Main and interaction effects, ANOVA with F tests and effect confidence intervals
//! - Quadratic surface fitting (effect-based and least squares) and canonical analysis
//! - Derringer–Suich desirability functions and a multi-response grid search
//!
//! Every routine works in coded units: −1 / +1 for the factorial levels,
//! 0 for the center and ±α for axial points. [`FactorRange`](design::FactorRange)
//! converts to and from natural units.
//!
//! ## Quick Start
//!
//! ```rust
//! use doe_rsm::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Two factors, rotatable CCD with three center points
//! let ccd = central_composite(2, CcdVariant::Circumscribed, 3)?;
//! assert_eq!(ccd.runs(), 11);
//!
//! let y = [76.0, 79.0, 78.0, 80.0, 77.0, 79.5, 76.5, 79.0, 84.0, 84.5, 83.5];
//! let mut table = ResponseTable::new(ccd);
//! table.add_response("Yield", y.to_vec())?;
//!
//! let result = analyze(&table, "Yield", &AnalysisConfig::default())?;
//! assert!(result.surface.is_some());
//!
//! let model = fit_quadratic_least_squares(table.design(), table.response("Yield")?)?;
//! let peak = model.stationary_point();
//! assert_eq!(peak.kind, SurfaceKind::Maximum);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of designs and results
//! - `parallel`: Enable a parallel desirability search using rayon
//! - `simulate`: Enable synthetic response generation using rand
//! - `python`: Enable Python bindings via PyO3

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod analysis;
pub mod design;
pub mod desirability;
pub mod error;
#[cfg(feature = "python")]
pub mod python;
pub mod rsm;
#[cfg(feature = "simulate")]
pub mod simulate;

#[cfg(feature = "parallel")]
pub mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analysis::{
        analyze, estimate_effects, interaction_effect, main_effect, perform_anova, Analysis,
        AnalysisConfig, AnovaConfig, AnovaEntry, AnovaTable, ConfidenceInterval, Effect,
        ResponseRow, ResponseTable,
    };
    pub use crate::design::{
        central_composite, fractional_factorial, full_factorial, CcdBuilder, CcdVariant, Design,
        DesignPoint, FactorRange, Generator, PointKind,
    };
    pub use crate::desirability::{
        larger_is_better, optimize_desirability, overall_desirability, smaller_is_better,
        target_desirability, DesirabilityGoal, GridSpec,
    };
    pub use crate::error::{Error, Result};
    pub use crate::rsm::{
        find_stationary_point, fit_quadratic, fit_quadratic_least_squares, Coefficients,
        QuadraticModel, StationaryPoint, SurfaceKind,
    };

    #[cfg(feature = "parallel")]
    pub use crate::parallel::par_optimize_desirability;

    #[cfg(feature = "simulate")]
    pub use crate::simulate::simulate_responses;
}

// Re-export commonly used items at crate root
pub use analysis::{analyze, AnalysisConfig, ResponseTable};
pub use design::{central_composite, full_factorial, CcdBuilder, Design};
pub use error::{Error, Result};
pub use rsm::{find_stationary_point, fit_quadratic};

#[cfg(feature = "parallel")]
pub use parallel::par_optimize_desirability;
