//! Parallel desirability search.
//!
//! This module provides a parallel version of
//! [`optimize_desirability`](crate::desirability::optimize_desirability) using Rayon.
//! Enable with the `parallel` feature flag.
//!
//! # Usage
//!
//! ```
//! use doe_rsm::desirability::{DesirabilityGoal, GridSpec};
//! use doe_rsm::parallel::par_optimize_desirability;
//! use doe_rsm::rsm::{Coefficients, QuadraticModel};
//!
//! # fn main() -> Result<(), doe_rsm::Error> {
//! let model = QuadraticModel::new(
//!     ["Temp".to_string(), "Time".to_string()],
//!     Coefficients {
//!         b0: 80.0,
//!         b11: -2.0,
//!         b22: -1.0,
//!         ..Coefficients::default()
//!     },
//! );
//!
//! let best = par_optimize_desirability(
//!     &[(model, DesirabilityGoal::maximize(60.0, 80.0))],
//!     &GridSpec::new(1.414, 401),
//! )?;
//! assert!(best.x1.abs() < 1e-9 && best.x2.abs() < 1e-9);
//! assert!((best.desirability - 1.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! # Performance
//!
//! Worth it for fine grids or many responses. For the default 41 × 41 grid
//! the sequential search is usually faster due to parallelization overhead.
//! Both searches return the same point, ties included.

use rayon::prelude::*;

use crate::desirability::{
    compare_candidates, optimum_at, prepare_search, score_at, DesirabilityGoal,
    DesirabilityOptimum, GridSpec,
};
use crate::error::Result;
use crate::rsm::QuadraticModel;

/// Grid search for maximum overall desirability, evaluating grid points in parallel.
///
/// # Errors
///
/// Same as [`optimize_desirability`](crate::desirability::optimize_desirability).
pub fn par_optimize_desirability(
    responses: &[(QuadraticModel, DesirabilityGoal)],
    grid: &GridSpec,
) -> Result<DesirabilityOptimum> {
    let axis = prepare_search(responses, grid)?;
    let n = axis.len();

    let best = (0..n * n)
        .into_par_iter()
        .map(|i| (i, score_at(responses, axis[i / n], axis[i % n])))
        .max_by(compare_candidates)
        .map_or(0, |(i, _)| i);

    Ok(optimum_at(responses, &axis, best))
}
