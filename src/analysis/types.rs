//! Analysis result types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rsm::QuadraticModel;

/// A model term: a main effect or a two-factor interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Term {
    /// Main effect of the factor at this column.
    Main(usize),
    /// Interaction of two factor columns (first < second).
    Interaction(usize, usize),
}

impl Term {
    /// Human-readable source name, e.g. `A` or `A:B`.
    #[must_use]
    pub fn label(&self, names: &[String]) -> String {
        match *self {
            Self::Main(i) => names[i].clone(),
            Self::Interaction(i, j) => format!("{}:{}", names[i], names[j]),
        }
    }

    /// Main effects for `k` factors followed by every two-factor interaction.
    #[must_use]
    pub fn all(k: usize, interactions: bool) -> Vec<Self> {
        let mut terms: Vec<Self> = (0..k).map(Self::Main).collect();
        if interactions {
            for i in 0..k {
                for j in (i + 1)..k {
                    terms.push(Self::Interaction(i, j));
                }
            }
        }
        terms
    }
}

/// Estimated effect of one term.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Effect {
    /// The term.
    pub term: Term,
    /// Source name, e.g. `Temp` or `Temp:Time`.
    pub name: String,
    /// Change in mean response from the low to the high level.
    pub estimate: f64,
    /// Rank by absolute size (1 = largest).
    pub rank: usize,
}

impl Effect {
    /// Regression coefficient in coded units (half the effect).
    #[must_use]
    pub fn coefficient(&self) -> f64 {
        self.estimate / 2.0
    }
}

/// One row of an ANOVA table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaEntry {
    /// The term this row describes.
    pub term: Term,
    /// Source name.
    pub source: String,
    /// Effect estimate the sum of squares was derived from.
    pub effect: f64,
    /// Number of runs with every factor of the term at ±1.
    pub runs: usize,
    /// Degrees of freedom (always 1 for a two-level term).
    pub degrees_of_freedom: usize,
    /// Sum of squares.
    pub sum_of_squares: f64,
    /// Mean square (SS / df).
    pub mean_square: f64,
    /// F ratio against the error mean square; None if pooled or no error df.
    pub f_ratio: Option<f64>,
    /// Upper-tail probability of the F ratio.
    pub p_value: Option<f64>,
    /// Percent of the total sum of squares.
    pub contribution_percent: f64,
    /// Whether this term was pooled into error.
    pub pooled: bool,
}

/// Complete ANOVA table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaTable {
    /// One entry per term.
    pub entries: Vec<AnovaEntry>,
    /// Sum of squares of the unpooled terms.
    pub model_ss: f64,
    /// Error (residual) sum of squares, including pooled terms.
    pub error_ss: f64,
    /// Error degrees of freedom.
    pub error_df: usize,
    /// Error mean square; zero when there are no error degrees of freedom.
    pub error_ms: f64,
    /// Total sum of squares about the grand mean.
    pub total_ss: f64,
    /// Total degrees of freedom (runs − 1).
    pub total_df: usize,
}

/// Confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Confidence level (e.g., 0.95 for 95%).
    pub level: f64,
}

impl ConfidenceInterval {
    /// Whether the interval excludes zero.
    #[must_use]
    pub fn excludes_zero(&self) -> bool {
        self.lower > 0.0 || self.upper < 0.0
    }
}

/// Configuration for ANOVA.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaConfig {
    /// Include every two-factor interaction as a term (default: true).
    pub include_interactions: bool,
    /// Reject designs whose factors have unequal ±1 counts (default: true).
    pub require_balanced: bool,
    /// Pool terms with small F ratios into error (default: false).
    pub enable_pooling: bool,
    /// F-ratio threshold below which a term is pooled (default: 2.0).
    pub pooling_threshold: f64,
    /// Minimum number of terms left unpooled (default: 1).
    pub min_unpooled_terms: usize,
}

impl Default for AnovaConfig {
    fn default() -> Self {
        Self {
            include_interactions: true,
            require_balanced: true,
            enable_pooling: false,
            pooling_threshold: 2.0,
            min_unpooled_terms: 1,
        }
    }
}

/// Configuration for [`analyze`](super::analyze).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisConfig {
    /// ANOVA settings.
    pub anova: AnovaConfig,
    /// Confidence level for effect intervals (default: 0.95).
    pub confidence_level: f64,
    /// Fit a quadratic surface when the design has two factors (default: true).
    pub fit_surface: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            anova: AnovaConfig::default(),
            confidence_level: 0.95,
            fit_surface: true,
        }
    }
}

/// Complete analysis of one response column.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Analysis {
    /// Name of the analysed response.
    pub response: String,
    /// Mean of every response value.
    pub grand_mean: f64,
    /// Effects ranked by absolute size.
    pub effects: Vec<Effect>,
    /// ANOVA table.
    pub anova: AnovaTable,
    /// Confidence interval per effect, when error degrees of freedom exist.
    pub effect_intervals: Vec<(String, ConfidenceInterval)>,
    /// Quadratic surface, for two-factor designs.
    pub surface: Option<QuadraticModel>,
}

impl fmt::Display for AnovaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:>4} {:>12} {:>12} {:>10} {:>8}",
            "Source", "DF", "SS", "MS", "F", "p"
        )?;
        for e in &self.entries {
            let f_str = e.f_ratio.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
            let p_str = e.p_value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
            let source = if e.pooled {
                format!("({})", e.source)
            } else {
                e.source.clone()
            };
            writeln!(
                f,
                "{:<12} {:>4} {:>12.4} {:>12.4} {:>10} {:>8}",
                source, e.degrees_of_freedom, e.sum_of_squares, e.mean_square, f_str, p_str
            )?;
        }
        writeln!(
            f,
            "{:<12} {:>4} {:>12.4} {:>12.4}",
            "Error", self.error_df, self.error_ss, self.error_ms
        )?;
        write!(f, "{:<12} {:>4} {:>12.4}", "Total", self.total_df, self.total_ss)
    }
}
