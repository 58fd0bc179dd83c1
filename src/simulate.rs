//! Synthetic responses for demonstrations and tests.
//!
//! Enable with the `simulate` feature flag. Randomness is always supplied by
//! the caller, so seeding an [`StdRng`](rand::rngs::StdRng) makes a run
//! reproducible.
//!
//! ```
//! use doe_rsm::design::{central_composite, CcdVariant};
//! use doe_rsm::simulate::simulate_responses;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let ccd = central_composite(2, CcdVariant::Circumscribed, 5).unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let y = simulate_responses(&ccd, |x| 80.0 + 2.0 * x[0] - x[1] * x[1], 0.5, &mut rng).unwrap();
//! assert_eq!(y.len(), ccd.runs());
//! ```

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::analysis::ResponseTable;
use crate::design::Design;
use crate::error::{Error, Result};

/// Evaluate `truth` at every run and add Gaussian noise with standard deviation `noise_sd`.
///
/// `truth` receives the coded levels of one run, in factor column order.
///
/// # Errors
///
/// Returns [`Error::InvalidParams`] if `noise_sd` is negative or not finite.
pub fn simulate_responses<F, R>(
    design: &Design,
    truth: F,
    noise_sd: f64,
    rng: &mut R,
) -> Result<Vec<f64>>
where
    F: Fn(&[f64]) -> f64,
    R: Rng + ?Sized,
{
    if !(noise_sd.is_finite() && noise_sd >= 0.0) {
        return Err(Error::invalid_params(format!(
            "noise standard deviation must be finite and non-negative, got {noise_sd}"
        )));
    }
    let noise = Normal::new(0.0, noise_sd)
        .map_err(|e| Error::invalid_params(format!("invalid noise distribution: {e}")))?;

    let values: Vec<f64> = design
        .points()
        .rows()
        .into_iter()
        .map(|row| {
            let levels = row.to_vec();
            truth(&levels) + noise.sample(rng)
        })
        .collect();

    debug!(runs = values.len(), noise_sd, "simulated responses");
    Ok(values)
}

/// Simulate a response column and add it to `table` under `name`.
///
/// # Errors
///
/// As [`simulate_responses`] and [`ResponseTable::add_response`].
pub fn simulate_into<F, R>(
    table: &mut ResponseTable,
    name: &str,
    truth: F,
    noise_sd: f64,
    rng: &mut R,
) -> Result<()>
where
    F: Fn(&[f64]) -> f64,
    R: Rng + ?Sized,
{
    let values = simulate_responses(table.design(), truth, noise_sd, rng)?;
    table.add_response(name, values)
}
