//! Main and interaction effect estimation for two-level factors.
//!
//! Only runs where a factor sits at its low or high level contribute to its
//! effect; axial and center runs of a composite design are ignored. The
//! factorial block of an inscribed design is read on the ±1 scale.

use ndarray::ArrayView1;
use tracing::trace;

use super::types::{Effect, Term};
use crate::design::{at_level, Design};
use crate::error::{Error, Result};

/// Check that the design and response are non-empty and the same length.
pub(crate) fn validate_data(design: &Design, response: &[f64]) -> Result<()> {
    if design.is_empty() || response.is_empty() {
        return Err(Error::EmptyData);
    }
    if response.len() != design.runs() {
        return Err(Error::length_mismatch(design.runs(), response.len()));
    }
    Ok(())
}

/// Rows from `rows` where `column` sits at `level`.
fn rows_at_level(column: ArrayView1<'_, f64>, rows: &[usize], level: f64) -> Vec<usize> {
    rows.iter()
        .copied()
        .filter(|&r| at_level(column[r], level))
        .collect()
}

fn mean_of(response: &[f64], rows: &[usize]) -> f64 {
    rows.iter().map(|&r| response[r]).sum::<f64>() / rows.len() as f64
}

/// mean(y | +1) − mean(y | −1) for factor column `col`, restricted to `rows`.
fn effect_within(design: &Design, response: &[f64], rows: &[usize], col: usize) -> Result<f64> {
    let points = design.two_level_points();
    let column = points.column(col);
    let high = rows_at_level(column, rows, 1.0);
    let low = rows_at_level(column, rows, -1.0);

    for (slice, level) in [(&high, 1.0), (&low, -1.0)] {
        if slice.is_empty() {
            return Err(Error::EmptyLevel {
                factor: design.factor_names()[col].clone(),
                level,
            });
        }
    }

    Ok(mean_of(response, &high) - mean_of(response, &low))
}

fn all_rows(design: &Design) -> Vec<usize> {
    (0..design.runs()).collect()
}

fn main_effect_at(design: &Design, response: &[f64], col: usize) -> Result<f64> {
    effect_within(design, response, &all_rows(design), col)
}

fn interaction_effect_at(
    design: &Design,
    response: &[f64],
    first: usize,
    second: usize,
) -> Result<f64> {
    let rows = all_rows(design);
    let points = design.two_level_points();
    let column = points.column(first);

    let mut slice_effects = [0.0; 2];
    for (slot, level) in slice_effects.iter_mut().zip([1.0, -1.0]) {
        let slice = rows_at_level(column, &rows, level);
        if slice.is_empty() {
            return Err(Error::EmptyLevel {
                factor: design.factor_names()[first].clone(),
                level,
            });
        }
        *slot = effect_within(design, response, &slice, second)?;
    }

    Ok((slice_effects[0] - slice_effects[1]) / 2.0)
}

/// Effect of a single term. Inputs must already be validated.
pub(crate) fn term_effect(design: &Design, response: &[f64], term: Term) -> Result<f64> {
    match term {
        Term::Main(i) => main_effect_at(design, response, i),
        Term::Interaction(i, j) => interaction_effect_at(design, response, i, j),
    }
}

/// Main effect of a factor: mean response at +1 minus mean response at −1.
///
/// # Errors
///
/// - [`Error::EmptyData`] if the design or response is empty
/// - [`Error::DimensionMismatch`] if the response length differs from the run count
/// - [`Error::UnknownFactor`] if the factor does not exist
/// - [`Error::EmptyLevel`] if no run has the factor at +1 (or −1)
///
/// # Example
///
/// ```
/// use doe_rsm::analysis::main_effect;
/// use doe_rsm::design::full_factorial;
///
/// let design = full_factorial(2, None).unwrap();
/// let y = [30.0, 45.0, 50.0, 65.0];
///
/// assert_eq!(main_effect(&design, &y, "A").unwrap(), 15.0);
/// assert_eq!(main_effect(&design, &y, "B").unwrap(), 20.0);
/// ```
pub fn main_effect(design: &Design, response: &[f64], factor: &str) -> Result<f64> {
    validate_data(design, response)?;
    let col = design.factor_index(factor)?;
    main_effect_at(design, response, col)
}

/// Two-factor interaction effect.
///
/// Computed as half the difference between the effect of `second` among runs
/// with `first` at +1 and its effect among runs with `first` at −1.
///
/// # Errors
///
/// As [`main_effect`], plus [`Error::InvalidParams`] when both names are the same.
pub fn interaction_effect(
    design: &Design,
    response: &[f64],
    first: &str,
    second: &str,
) -> Result<f64> {
    validate_data(design, response)?;
    let i = design.factor_index(first)?;
    let j = design.factor_index(second)?;
    if i == j {
        return Err(Error::invalid_params(format!(
            "interaction requires two different factors, got '{first}' twice"
        )));
    }
    interaction_effect_at(design, response, i, j)
}

/// Estimate every main effect and two-factor interaction, ranked by size.
///
/// # Errors
///
/// As [`main_effect`].
pub fn estimate_effects(design: &Design, response: &[f64]) -> Result<Vec<Effect>> {
    estimate_terms(design, response, &Term::all(design.factors(), true))
}

pub(crate) fn estimate_terms(
    design: &Design,
    response: &[f64],
    terms: &[Term],
) -> Result<Vec<Effect>> {
    validate_data(design, response)?;
    let names = design.factor_names();

    let mut effects = terms
        .iter()
        .map(|&term| {
            let estimate = term_effect(design, response, term)?;
            let name = term.label(names);
            trace!(term = %name, estimate, "estimated effect");
            Ok(Effect {
                term,
                name,
                estimate,
                rank: 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<usize> = (0..effects.len()).collect();
    order.sort_by(|&a, &b| {
        effects[b]
            .estimate
            .abs()
            .partial_cmp(&effects[a].estimate.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (rank, idx) in order.into_iter().enumerate() {
        effects[idx].rank = rank + 1;
    }

    Ok(effects)
}
