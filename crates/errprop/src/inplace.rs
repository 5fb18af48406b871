//! In-place propagation operators.
//!
//! Each function computes the same result as its counterpart in
//! [`crate::ops`] but writes it into the first operand's value and variance
//! storage instead of allocating new matrices. The right operand is broadcast
//! into the left operand's shape; the left operand is never resized.
//!
//! Because the result overwrites an input, each operator fixes its own
//! evaluation order per element so that nothing is read after it has been
//! overwritten.
//!
//! On a shape error the left operand is left untouched.

use crate::broadcast::{Broadcast, MeasuredView};
use crate::error::Result;
use crate::measured::Measured;
use crate::ops::Exponent;
use crate::types::Scalar;

/// Applies `f(x, var_x, y, var_y)` to every element of `x`, with `y` broadcast.
fn binary_inplace<'a, T, F>(
    x: &'a mut Measured<T>,
    y: &Measured<T>,
    f: F,
) -> Result<&'a mut Measured<T>>
where
    T: Scalar,
    F: Fn(&mut T, &mut T, T, T),
{
    let (rows, cols) = x.shape();
    let rhs = MeasuredView::to(y, (rows, cols))?;
    let (value, variance) = x.parts_mut();
    for j in 0..cols {
        for i in 0..rows {
            let (b, var_b) = rhs.at(i, j);
            f(&mut value[(i, j)], &mut variance[(i, j)], b, var_b);
        }
    }
    Ok(x)
}

/// In-place addition with error propagation.
pub fn add_inplace<'a, T: Scalar>(
    x: &'a mut Measured<T>,
    y: &Measured<T>,
) -> Result<&'a mut Measured<T>> {
    binary_inplace(x, y, |a, var_a, b, var_b| {
        *a += b;
        *var_a += var_b;
    })
}

/// In-place subtraction with error propagation.
pub fn sub_inplace<'a, T: Scalar>(
    x: &'a mut Measured<T>,
    y: &Measured<T>,
) -> Result<&'a mut Measured<T>> {
    binary_inplace(x, y, |a, var_a, b, var_b| {
        *a -= b;
        *var_a += var_b;
    })
}

/// In-place multiplication with error propagation.
pub fn mul_inplace<'a, T: Scalar>(
    x: &'a mut Measured<T>,
    y: &Measured<T>,
) -> Result<&'a mut Measured<T>> {
    binary_inplace(x, y, |a, var_a, b, var_b| {
        // The variance needs the original X, so it goes first.
        *var_a *= b * b;
        *var_a += *a * *a * var_b;
        *a *= b;
    })
}

/// In-place division with error propagation.
pub fn div_inplace<'a, T: Scalar>(
    x: &'a mut Measured<T>,
    y: &Measured<T>,
) -> Result<&'a mut Measured<T>> {
    binary_inplace(x, y, |a, var_a, b, var_b| {
        *a /= b; // a = Z
        *var_a += var_b * *a * *a; // varX + varY·Z²
        *var_a /= b * b;
    })
}

fn pow_element_inplace<T: Scalar>(a: &mut T, var_a: &mut T, n: T) {
    *var_a /= *a;
    *var_a /= *a; // varX/X²
    *a = a.powf(n); // a = Z
    *var_a *= *a;
    *var_a *= *a;
    *var_a *= n * n;
}

/// In-place `Xⁿ` with error propagation.
///
/// An elementwise exponent must broadcast into `X`'s shape.
pub fn pow_inplace<'a, T, E>(x: &'a mut Measured<T>, n: E) -> Result<&'a mut Measured<T>>
where
    T: Scalar,
    E: Into<Exponent<T>>,
{
    match n.into() {
        Exponent::Uniform(n) => {
            let (value, variance) = x.parts_mut();
            for (a, var_a) in value.iter_mut().zip(variance.iter_mut()) {
                pow_element_inplace(a, var_a, n);
            }
        }
        Exponent::Elementwise(n) => {
            let (rows, cols) = x.shape();
            let exponent = Broadcast::to(&n, (rows, cols))?;
            let (value, variance) = x.parts_mut();
            for j in 0..cols {
                for i in 0..rows {
                    let n = exponent.get(i, j);
                    pow_element_inplace(&mut value[(i, j)], &mut variance[(i, j)], n);
                }
            }
        }
    }
    Ok(x)
}

/// In-place `X^Y` with error propagation.
pub fn pow2_inplace<'a, T: Scalar>(
    x: &'a mut Measured<T>,
    y: &Measured<T>,
) -> Result<&'a mut Measured<T>> {
    binary_inplace(x, y, |a, var_a, b, var_b| {
        *var_a /= *a;
        *var_a *= b;
        *var_a = *var_a * *var_a; // (Y·varX/X)²
        let mut t = a.ln();
        t *= var_b;
        t = t * t;
        *var_a += t; // still needs the original X for ln
        *a = a.powf(b); // a = Z
        *var_a *= *a;
        *var_a *= *a;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::types::DMatrix;
    use approx::assert_relative_eq;

    fn operands() -> (Measured<f64>, Measured<f64>) {
        (
            Measured::from_slices(&[1.5, 2.0, 0.7], &[0.01, 0.04, 0.02]).unwrap(),
            Measured::from_slices(&[0.5, 3.0, 1.2], &[0.03, 0.01, 0.05]).unwrap(),
        )
    }

    fn assert_same(a: &Measured<f64>, b: &Measured<f64>) {
        assert_eq!(a.shape(), b.shape());
        for (p, q) in a.value().iter().zip(b.value().iter()) {
            assert_relative_eq!(*p, *q, max_relative = 1e-12);
        }
        for (p, q) in a.variance().iter().zip(b.variance().iter()) {
            assert_relative_eq!(*p, *q, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_mul_inplace_uses_original_x() {
        let (x, y) = operands();
        let mut z = x.clone();
        mul_inplace(&mut z, &y).unwrap();
        assert_same(&z, &ops::mul(&x, &y).unwrap());
    }

    #[test]
    fn test_div_inplace_matches() {
        let (x, y) = operands();
        let mut z = x.clone();
        div_inplace(&mut z, &y).unwrap();
        assert_same(&z, &ops::div(&x, &y).unwrap());
    }

    #[test]
    fn test_pow2_inplace_matches() {
        let (x, y) = operands();
        let mut z = x.clone();
        pow2_inplace(&mut z, &y).unwrap();
        assert_same(&z, &ops::pow2(&x, &y).unwrap());
    }

    #[test]
    fn test_pow_inplace_uniform_and_elementwise() {
        let (x, _) = operands();
        let mut z = x.clone();
        pow_inplace(&mut z, 3.0).unwrap();
        assert_same(&z, &ops::pow(&x, 3.0).unwrap());

        let n = DMatrix::from_column_slice(3, 1, &[2.0, -1.0, 0.5]);
        let mut z = x.clone();
        pow_inplace(&mut z, &n).unwrap();
        assert_same(&z, &ops::pow(&x, &n).unwrap());
    }

    #[test]
    fn test_returns_first_operand() {
        let (mut x, y) = operands();
        let ptr = x.value().as_ptr();
        let z = add_inplace(&mut x, &y).unwrap();
        assert_eq!(z.value().as_ptr(), ptr);
        assert_relative_eq!(z.value()[(1, 0)], 5.0);
        let z = sub_inplace(z, &y).unwrap();
        assert_relative_eq!(z.value()[(1, 0)], 2.0);
        assert_relative_eq!(z.variance()[(1, 0)], 0.06, epsilon = 1e-15);
    }

    #[test]
    fn test_scalar_rhs_broadcasts_into_x() {
        let (mut x, _) = operands();
        mul_inplace(&mut x, &Measured::<f64>::scalar(2.0, 0.0)).unwrap();
        assert_eq!(x.shape(), (3, 1));
        assert_relative_eq!(x.value()[(0, 0)], 3.0);
        assert_relative_eq!(x.variance()[(0, 0)], 0.04);
    }

    #[test]
    fn test_shape_error_leaves_x_untouched() {
        let mut x = Measured::<f64>::scalar(2.0, 0.1);
        let before = x.clone();
        let (y, _) = operands();
        // A 3x1 operand cannot be broadcast into a 1x1 result
        assert!(div_inplace(&mut x, &y).is_err());
        assert!(pow_inplace(&mut x, DMatrix::from_element(3, 1, 2.0)).is_err());
        assert_eq!(x, before);
    }
}
