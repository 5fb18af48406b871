//! First-order error propagation for arrays of measurements.
//!
//! A measured quantity is a pair of arrays: its values and the variance of
//! each value. This crate computes the values and variances of quantities
//! derived from measurements through elementary arithmetic, transcendental
//! functions and piecewise-linear interpolation, assuming independent,
//! normally-approximated uncertainties and linearized propagation.
//!
//! # Modules
//!
//! - [`types`]: Scalar trait and matrix aliases
//! - [`error`]: Error types
//! - [`measured`]: The value/variance pair
//! - [`broadcast`]: NumPy-style broadcasting of operands
//! - [`ops`]: Out-of-place operators
//! - [`inplace`]: In-place operators that reuse the first operand's storage
//! - [`interp`]: Linear interpolation into a table of measurements
//! - [`validation`]: Finite-difference and in-place equivalence checks
//!
//! # Example
//!
//! ```
//! use errprop::prelude::*;
//!
//! let x = Measured::<f64>::scalar(6.0, 0.04);
//! let y = Measured::<f64>::scalar(2.0, 0.01);
//! let z = div(&x, &y).unwrap();
//! assert_eq!(z.value()[(0, 0)], 3.0);
//! assert!((z.variance()[(0, 0)] - 0.0325).abs() < 1e-15);
//! ```

pub mod broadcast;
pub mod error;
pub mod inplace;
pub mod interp;
pub mod measured;
pub mod ops;
pub mod types;
pub mod validation;

// Re-export commonly used items at the crate root
pub use error::{PropagationError, Result};
pub use measured::Measured;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{PropagationError, Result};
    pub use crate::inplace::{
        add_inplace, div_inplace, mul_inplace, pow2_inplace, pow_inplace, sub_inplace,
    };
    pub use crate::interp::{interp, Table};
    pub use crate::measured::Measured;
    pub use crate::ops::{
        add, arccos, arcsin, arctan, arctan2, cos, div, exp, log, mul, pow, pow2, sin, sub, tan,
        Exponent,
    };
    pub use crate::types::{DMatrix, DVector, Scalar};
    pub use crate::validation::{NumericalValidator, ValidationConfig, VarianceCheck};
}
