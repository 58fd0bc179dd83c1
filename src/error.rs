//! Error types for the doe-rsm library.
//!
//! Every failure in this crate is an argument-validation failure: the
//! computation that raised it cannot continue and the caller is expected to
//! report the message to the user. Variants are grouped by the stage that
//! produces them.

use thiserror::Error;

/// The main error type for the doe-rsm library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Design Generation Errors ============
    /// The number of factors is outside the supported range.
    #[error("number of factors must be between {min} and {max}, got {factors}")]
    InvalidFactorCount {
        /// Requested number of factors.
        factors: usize,
        /// Minimum allowed factors.
        min: usize,
        /// Maximum allowed factors.
        max: usize,
    },

    /// The design type needs more factors than were requested.
    #[error("{design} requires at least {min} factors, got {factors}")]
    TooFewFactors {
        /// Requested number of factors.
        factors: usize,
        /// Minimum number of factors for this design.
        min: usize,
        /// Short name of the design type.
        design: &'static str,
    },

    /// A fractional factorial generator is malformed.
    #[error("invalid generator: {message}")]
    InvalidGenerator {
        /// Description of what is wrong with the generator.
        message: String,
    },

    // ============ Data Errors ============
    /// No rows or no response values were supplied.
    #[error("data cannot be empty")]
    EmptyData,

    /// A factor name does not exist in the design.
    #[error("unknown factor '{0}'")]
    UnknownFactor(String),

    /// A response name does not exist in the table.
    #[error("unknown response '{0}'")]
    UnknownResponse(String),

    /// A requested coded level has no matching rows.
    #[error("no runs with factor '{factor}' at coded level {level}")]
    EmptyLevel {
        /// Factor whose level slice is empty.
        factor: String,
        /// The coded level that was requested.
        level: f64,
    },

    /// A factor has different numbers of high and low runs.
    #[error("design is unbalanced for factor '{factor}': {high} runs at +1, {low} runs at -1")]
    UnbalancedDesign {
        /// Factor that failed the balance check.
        factor: String,
        /// Number of runs at +1.
        high: usize,
        /// Number of runs at -1.
        low: usize,
    },

    // ============ Model Errors ============
    /// The model only handles a fixed number of factors.
    #[error("this implementation supports {expected} factors only, got {actual}")]
    UnsupportedFactorCount {
        /// Number of factors the model handles.
        expected: usize,
        /// Number of factors in the supplied design.
        actual: usize,
    },

    /// A linear system could not be solved.
    #[error("singular system: {message}")]
    SingularSystem {
        /// Description of the system that failed.
        message: String,
    },

    // ============ Parameter Validation Errors ============
    /// Invalid parameters.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// Dimensions of two inputs disagree.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },
}

/// A specialized `Result` type for doe-rsm operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a new `InvalidGenerator` error.
    #[must_use]
    pub fn invalid_generator(message: impl Into<String>) -> Self {
        Self::InvalidGenerator {
            message: message.into(),
        }
    }

    /// Create a new `SingularSystem` error.
    #[must_use]
    pub fn singular(message: impl Into<String>) -> Self {
        Self::SingularSystem {
            message: message.into(),
        }
    }

    /// Create a `DimensionMismatch` for a response column of the wrong length.
    #[must_use]
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{expected} values"),
            actual: format!("{actual} values"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFactorCount {
            factors: 11,
            min: 1,
            max: 10,
        };
        assert!(err.to_string().contains("between 1 and 10"));
        assert!(err.to_string().contains("11"));

        assert_eq!(Error::EmptyData.to_string(), "data cannot be empty");

        let err = Error::TooFewFactors {
            factors: 1,
            min: 2,
            design: "CCD",
        };
        assert!(err.to_string().starts_with("CCD requires at least 2 factors"));

        let err = Error::UnsupportedFactorCount {
            expected: 2,
            actual: 3,
        };
        assert!(err.to_string().contains("supports 2 factors only"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = Error::UnknownFactor("A".into());
        let err2 = Error::UnknownFactor("A".into());
        let err3 = Error::UnknownFactor("B".into());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
        assert_eq!(
            Error::length_mismatch(4, 3),
            Error::DimensionMismatch {
                expected: "4 values".into(),
                actual: "3 values".into(),
            }
        );
    }
}
