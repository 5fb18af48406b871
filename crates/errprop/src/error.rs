//! Error types for error-propagation operations.
//!
//! Floating-point special values (NaN, ±inf) produced by out-of-domain inputs
//! are ordinary results and never appear here. Errors only describe operands
//! that cannot be combined at all.

use thiserror::Error;

/// Errors that can occur while building or combining measurements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    /// Operand shapes are not compatible.
    ///
    /// Raised when two operands cannot be broadcast together, when the right
    /// operand of an in-place call cannot be broadcast into the left one, or
    /// when a value array and its variance array differ in shape.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape
        actual: String,
    },

    /// Interpolation table is malformed.
    #[error("Invalid interpolation table: {reason}")]
    InvalidTable {
        /// Description of the problem
        reason: String,
    },

    /// Invalid validation configuration.
    #[error("Invalid configuration for {parameter} = {value}: {reason}")]
    InvalidConfiguration {
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
        /// Description of the configuration error
        reason: String,
    },

    /// A numerical validation check did not pass.
    #[error("Validation of {operation} failed: max relative error {max_error:e} exceeds {tolerance:e}")]
    ValidationFailed {
        /// Operation under test
        operation: String,
        /// Largest relative error observed
        max_error: f64,
        /// Tolerance that was not met
        tolerance: f64,
    },
}

impl PropagationError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a ShapeMismatch error from two `(rows, cols)` shapes.
    pub fn shapes(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::shape_mismatch(
            format!("({}, {})", expected.0, expected.1),
            format!("({}, {})", actual.0, actual.1),
        )
    }

    /// Create an InvalidTable error with a custom reason.
    pub fn invalid_table<S: Into<String>>(reason: S) -> Self {
        Self::InvalidTable {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(parameter: S1, value: S2, reason: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a ValidationFailed error.
    pub fn validation_failed<S: Into<String>>(operation: S, max_error: f64, tolerance: f64) -> Self {
        Self::ValidationFailed {
            operation: operation.into(),
            max_error,
            tolerance,
        }
    }
}

/// Result type alias for error-propagation operations.
pub type Result<T> = std::result::Result<T, PropagationError>;
