//! Type definitions and aliases for error propagation.
//!
//! This module provides the scalar trait shared by every operator and the
//! matrix aliases used to store values and variances.

use nalgebra::{Dyn, OMatrix, OVector, Scalar as NalgebraScalar};
use num_traits::{Float, NumAssign};
use std::fmt::{Debug, Display};

/// Trait for scalar types carried by measurements (f32 or f64).
///
/// Only floating-point element types implement it, so in-place operators can
/// never truncate a fractional result into integer storage.
pub trait Scalar:
    NalgebraScalar + Float + NumAssign + Display + Debug + Default + Copy + Send + Sync + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default relative tolerance when comparing propagated variances.
    const DEFAULT_TOLERANCE: Self;

    /// Default relative step for central finite differences.
    const DEFAULT_STEP: Self;

    /// Convert to f64 (for error reporting).
    fn to_f64(self) -> f64 {
        num_traits::cast(self).unwrap_or(f64::NAN)
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-3;
    const DEFAULT_STEP: Self = 1e-3;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-6;
    const DEFAULT_STEP: Self = 1e-6;
}

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Shape of a matrix as `(rows, cols)`.
pub type Shape = (usize, usize);

/// Returns the shape of a matrix.
pub fn shape_of<T: Scalar>(m: &DMatrix<T>) -> Shape {
    (m.nrows(), m.ncols())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f64() {
        assert_eq!(Scalar::to_f64(2.0f32), 2.0);
        assert_eq!(Scalar::to_f64(0.25f64), 0.25);
    }

    #[test]
    fn test_shape_of() {
        let m = DMatrix::<f64>::zeros(3, 4);
        assert_eq!(shape_of(&m), (3, 4));
    }
}
