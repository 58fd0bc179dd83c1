//! Second-order response surfaces in two coded factors.
//!
//! The model is
//!
//! ```text
//! ŷ = b0 + b1·x1 + b2·x2 + b11·x1² + b22·x2² + b12·x1·x2
//! ```
//!
//! - [`fit_quadratic`]: quick estimate from effects and a center-point
//!   curvature contrast
//! - [`fit_quadratic_least_squares`]: ordinary least squares over all six terms
//! - [`find_stationary_point`]: critical point and its classification

mod quadratic;
mod stationary;

pub use quadratic::{fit_quadratic, fit_quadratic_least_squares, Coefficients, QuadraticModel};
pub use stationary::{find_stationary_point, StationaryPoint, SurfaceKind, DEGENERATE_THRESHOLD};
