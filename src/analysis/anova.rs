//! ANOVA (Analysis of Variance) for two-level designs.
//!
//! Each main effect and two-factor interaction is a single-degree-of-freedom
//! term whose sum of squares follows from its effect estimate:
//!
//! ```text
//! SS_term = n · effect² / 4
//! ```
//!
//! where n is the number of runs the effect was estimated from. The residual
//! is what remains of the total sum of squares. The decomposition assumes a
//! balanced design, which is checked unless [`AnovaConfig::require_balanced`]
//! is switched off.

use tracing::{debug, trace};

use super::effects::{term_effect, validate_data};
use super::stats::{f_distribution_p_value, t_value};
use super::types::{AnovaConfig, AnovaEntry, AnovaTable, ConfidenceInterval, Term};
use crate::design::{at_level, Design};
use crate::error::{Error, Result};

/// Number of runs where every factor of `term` sits at ±1.
fn runs_for_term(design: &Design, term: Term) -> usize {
    let cols: Vec<usize> = match term {
        Term::Main(i) => vec![i],
        Term::Interaction(i, j) => vec![i, j],
    };
    design
        .two_level_points()
        .rows()
        .into_iter()
        .filter(|row| cols.iter().all(|&c| at_level(row[c].abs(), 1.0)))
        .count()
}

/// Fail with [`Error::UnbalancedDesign`] for the first factor whose ±1 counts differ.
fn check_balance(design: &Design) -> Result<()> {
    let report = design.balance_report();
    if let Some(i) = report.first_unbalanced() {
        return Err(Error::UnbalancedDesign {
            factor: report.factors[i].clone(),
            high: report.high_counts[i],
            low: report.low_counts[i],
        });
    }
    Ok(())
}

/// Build the ANOVA table for a response measured on a two-level design.
///
/// # Algorithm
/// 1. Total SS = Σ(yᵢ − ȳ)² over every run
/// 2. Term SS = n · effect² / 4 for each main effect (and interaction)
/// 3. Error SS = Total SS − Σ term SS, with (N − 1) − terms degrees of freedom
/// 4. Optional pooling of terms with F below the threshold into error
/// 5. F = MS_term / MS_error and p-values from the F distribution
///
/// # Errors
///
/// - [`Error::EmptyData`] / [`Error::DimensionMismatch`] for bad inputs
/// - [`Error::UnbalancedDesign`] when balance is required and missing
/// - [`Error::EmptyLevel`] when a term has no runs at one of its levels
///
/// # Example
///
/// ```
/// use doe_rsm::analysis::{perform_anova, AnovaConfig};
/// use doe_rsm::design::full_factorial;
///
/// let design = full_factorial(3, None).unwrap();
/// let y = [45.0, 71.0, 48.0, 65.0, 68.0, 60.0, 80.0, 65.0];
///
/// let table = perform_anova(&design, &y, &AnovaConfig::default()).unwrap();
/// assert_eq!(table.entries.len(), 6);
/// assert_eq!(table.error_df, 1);
/// assert!((table.total_ss - (table.model_ss + table.error_ss)).abs() < 1e-9);
/// ```
pub fn perform_anova(design: &Design, response: &[f64], config: &AnovaConfig) -> Result<AnovaTable> {
    validate_data(design, response)?;
    if config.require_balanced {
        check_balance(design)?;
    }

    let n = response.len();
    let grand_mean = response.iter().sum::<f64>() / n as f64;
    let total_ss: f64 = response.iter().map(|y| (y - grand_mean).powi(2)).sum();
    let total_df = n - 1;

    let names = design.factor_names();
    let terms = Term::all(design.factors(), config.include_interactions);

    let mut entries = Vec::with_capacity(terms.len());
    for term in terms {
        let effect = term_effect(design, response, term)?;
        let runs = runs_for_term(design, term);
        let ss = runs as f64 * effect * effect / 4.0;
        let source = term.label(names);
        trace!(%source, effect, ss, "anova term");

        entries.push(AnovaEntry {
            term,
            source,
            effect,
            runs,
            degrees_of_freedom: 1,
            sum_of_squares: ss,
            mean_square: ss,
            f_ratio: None,
            p_value: None,
            contribution_percent: 0.0,
            pooled: false,
        });
    }

    let term_ss: f64 = entries.iter().map(|e| e.sum_of_squares).sum();
    let term_df: usize = entries.iter().map(|e| e.degrees_of_freedom).sum();
    let mut error_ss = (total_ss - term_ss).max(0.0);
    let mut error_df = total_df.saturating_sub(term_df);

    if config.enable_pooling && error_df > 0 {
        pool_terms(
            &mut entries,
            &mut error_ss,
            &mut error_df,
            config.pooling_threshold,
            config.min_unpooled_terms,
        );
    }

    let error_ms = if error_df > 0 {
        error_ss / error_df as f64
    } else {
        0.0
    };

    for entry in &mut entries {
        if !entry.pooled && error_ms > 0.0 {
            let f_ratio = entry.mean_square / error_ms;
            entry.f_ratio = Some(f_ratio);
            entry.p_value = Some(f_distribution_p_value(
                f_ratio,
                entry.degrees_of_freedom,
                error_df,
            ));
        }

        entry.contribution_percent = if total_ss > 0.0 {
            entry.sum_of_squares / total_ss * 100.0
        } else {
            0.0
        };
    }

    let model_ss: f64 = entries
        .iter()
        .filter(|e| !e.pooled)
        .map(|e| e.sum_of_squares)
        .sum();

    debug!(
        runs = n,
        terms = entries.len(),
        total_ss,
        error_ss,
        error_df,
        "anova complete"
    );

    Ok(AnovaTable {
        entries,
        model_ss,
        error_ss,
        error_df,
        error_ms,
        total_ss,
        total_df,
    })
}

/// Pool terms with low F ratios into error, smallest F first, until none is
/// below the threshold or only `min_unpooled` terms remain.
fn pool_terms(
    entries: &mut [AnovaEntry],
    error_ss: &mut f64,
    error_df: &mut usize,
    threshold: f64,
    min_unpooled: usize,
) {
    loop {
        if *error_df == 0 {
            break;
        }
        let error_ms = *error_ss / *error_df as f64;
        if error_ms <= 0.0 {
            break;
        }

        if entries.iter().filter(|e| !e.pooled).count() <= min_unpooled {
            break;
        }

        let candidate = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.pooled)
            .map(|(i, e)| (i, e.mean_square / error_ms))
            .filter(|&(_, f)| f < threshold)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match candidate {
            Some((idx, f)) => {
                trace!(source = %entries[idx].source, f, "pooling term into error");
                *error_ss += entries[idx].sum_of_squares;
                *error_df += entries[idx].degrees_of_freedom;
                entries[idx].pooled = true;
            }
            None => break,
        }
    }
}

impl AnovaTable {
    /// Look up an entry by source name.
    #[must_use]
    pub fn entry(&self, source: &str) -> Option<&AnovaEntry> {
        self.entries.iter().find(|e| e.source == source)
    }

    /// Sum of the unpooled term and error sums of squares.
    #[must_use]
    pub fn explained_plus_error(&self) -> f64 {
        self.model_ss + self.error_ss
    }

    /// Fraction of the total sum of squares explained by unpooled terms.
    #[must_use]
    pub fn r_squared(&self) -> f64 {
        if self.total_ss > 0.0 {
            self.model_ss / self.total_ss
        } else {
            0.0
        }
    }

    /// Confidence interval for an effect: `effect ± t · 2 · sqrt(MS_error / n)`.
    ///
    /// Returns `None` for an unknown source or when the table has no error
    /// degrees of freedom.
    #[must_use]
    pub fn effect_interval(&self, source: &str, confidence: f64) -> Option<ConfidenceInterval> {
        let entry = self.entry(source)?;
        if self.error_df == 0 || self.error_ms <= 0.0 || entry.runs == 0 {
            return None;
        }

        let se = 2.0 * (self.error_ms / entry.runs as f64).sqrt();
        let t = t_value(confidence, self.error_df);
        if !t.is_finite() {
            return None;
        }

        Some(ConfidenceInterval {
            lower: entry.effect - t * se,
            upper: entry.effect + t * se,
            level: confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{central_composite, full_factorial, CcdVariant};
    use approx::assert_relative_eq;

    fn no_interactions() -> AnovaConfig {
        AnovaConfig {
            include_interactions: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_anova_two_by_two_saturated() {
        let design = full_factorial(2, None).unwrap();
        let y = [30.0, 45.0, 50.0, 65.0];

        let table = perform_anova(&design, &y, &AnovaConfig::default()).unwrap();

        // SST: mean 47.5 -> 306.25 + 6.25 + 6.25 + 306.25
        assert_relative_eq!(table.total_ss, 625.0, epsilon = 1e-10);
        // SS_A = 4 * 15² / 4 = 225, SS_B = 400, SS_AB = 0
        assert_relative_eq!(table.entry("A").unwrap().sum_of_squares, 225.0, epsilon = 1e-10);
        assert_relative_eq!(table.entry("B").unwrap().sum_of_squares, 400.0, epsilon = 1e-10);
        assert_relative_eq!(table.entry("A:B").unwrap().sum_of_squares, 0.0, epsilon = 1e-10);

        // Saturated: no error df, no F ratios
        assert_eq!(table.error_df, 0);
        assert!(table.entries.iter().all(|e| e.f_ratio.is_none()));
        assert!(table.effect_interval("A", 0.95).is_none());
    }

    #[test]
    fn test_anova_sum_of_squares_identity() {
        for k in 2..=5 {
            let design = full_factorial(k, None).unwrap();
            let y: Vec<f64> = (0..design.runs())
                .map(|i| ((i * 37 + 11) % 17) as f64 + 0.5 * i as f64)
                .collect();

            for config in [AnovaConfig::default(), no_interactions()] {
                let table = perform_anova(&design, &y, &config).unwrap();
                assert_relative_eq!(
                    table.total_ss,
                    table.model_ss + table.error_ss,
                    epsilon = 1e-8
                );
                assert_eq!(table.total_df, design.runs() - 1);
            }
        }
    }

    #[test]
    fn test_anova_f_ratios() {
        let design = full_factorial(3, None).unwrap();
        // Strong A effect, noise elsewhere
        let y = [10.0, 30.0, 11.0, 29.0, 10.5, 30.5, 9.5, 31.0];

        let table = perform_anova(&design, &y, &no_interactions()).unwrap();
        assert_eq!(table.error_df, 4);

        let a = table.entry("A").unwrap();
        let b = table.entry("B").unwrap();
        assert!(a.f_ratio.unwrap() > 100.0);
        assert!(a.p_value.unwrap() < 0.001);
        assert!(b.p_value.unwrap() > a.p_value.unwrap());

        let ci = table.effect_interval("A", 0.95).unwrap();
        assert!(ci.excludes_zero());
        assert_relative_eq!((ci.lower + ci.upper) / 2.0, a.effect, epsilon = 1e-10);
        assert!(table.r_squared() > 0.99);
    }

    #[test]
    fn test_anova_pooling() {
        let design = full_factorial(3, None).unwrap();
        let y = [10.0, 30.0, 11.0, 29.0, 10.5, 30.5, 9.5, 31.0];
        let config = AnovaConfig {
            enable_pooling: true,
            pooling_threshold: 2.0,
            min_unpooled_terms: 1,
            ..no_interactions()
        };

        let table = perform_anova(&design, &y, &config).unwrap();
        let unpooled: Vec<&str> = table
            .entries
            .iter()
            .filter(|e| !e.pooled)
            .map(|e| e.source.as_str())
            .collect();

        assert!(unpooled.contains(&"A"));
        assert!(table.error_df > 4);
        assert!(table.entries.iter().filter(|e| e.pooled).all(|e| e.f_ratio.is_none()));
        assert_relative_eq!(table.total_ss, table.explained_plus_error(), epsilon = 1e-8);
    }

    #[test]
    fn test_anova_unbalanced_rejected() {
        let design = Design::from_rows(
            &["A", "B"],
            &[
                vec![-1.0, -1.0],
                vec![1.0, -1.0],
                vec![1.0, 1.0],
                vec![1.0, 1.0],
            ],
        )
        .unwrap();
        let y = [1.0, 2.0, 3.0, 4.0];

        let err = perform_anova(&design, &y, &AnovaConfig::default()).unwrap_err();
        assert_eq!(
            err,
            Error::UnbalancedDesign {
                factor: "A".into(),
                high: 3,
                low: 1
            }
        );

        let relaxed = AnovaConfig {
            require_balanced: false,
            include_interactions: false,
            ..Default::default()
        };
        assert!(perform_anova(&design, &y, &relaxed).is_ok());
    }

    #[test]
    fn test_anova_on_composite_design() {
        let ccd = central_composite(2, CcdVariant::Circumscribed, 3).unwrap();
        let y: Vec<f64> = ccd
            .points()
            .rows()
            .into_iter()
            .map(|r| 80.0 + 2.0 * r[0] + 3.0 * r[1] - r[0] * r[0])
            .collect();

        let table = perform_anova(&ccd, &y, &AnovaConfig::default()).unwrap();
        assert_eq!(table.entry("A").unwrap().runs, 4);
        assert_relative_eq!(table.entry("B").unwrap().effect, 6.0, epsilon = 1e-10);
        assert_eq!(table.total_df, ccd.runs() - 1);
    }

    #[test]
    fn test_anova_on_inscribed_composite() {
        let ccd = central_composite(2, CcdVariant::Inscribed, 3).unwrap();
        let y: Vec<f64> = ccd
            .points()
            .rows()
            .into_iter()
            .map(|r| 80.0 + 2.0 * r[0] + 3.0 * r[1])
            .collect();

        let table = perform_anova(&ccd, &y, &AnovaConfig::default()).unwrap();
        let cube = ccd.cube_level();
        assert_eq!(table.entry("A").unwrap().runs, 4);
        assert_relative_eq!(table.entry("A").unwrap().effect, 4.0 * cube, epsilon = 1e-10);
        assert_relative_eq!(table.entry("B").unwrap().effect, 6.0 * cube, epsilon = 1e-10);
        assert_relative_eq!(table.total_ss, table.explained_plus_error(), epsilon = 1e-8);
    }

    #[test]
    fn test_anova_empty() {
        let design = full_factorial(2, None).unwrap();
        assert_eq!(
            perform_anova(&design, &[], &AnovaConfig::default()),
            Err(Error::EmptyData)
        );
    }

    #[test]
    fn test_anova_display() {
        let design = full_factorial(2, None).unwrap();
        let table = perform_anova(&design, &[1.0, 2.0, 3.0, 5.0], &AnovaConfig::default()).unwrap();
        let shown = table.to_string();
        assert!(shown.contains("Source"));
        assert!(shown.contains("A:B"));
        assert!(shown.contains("Total"));
    }
}
