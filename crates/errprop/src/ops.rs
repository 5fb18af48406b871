//! Out-of-place propagation operators.
//!
//! Every operator here applies first-order (linearized) propagation
//! elementwise, treating its operands as statistically independent:
//!
//! ```text
//! Z = f(X, Y)
//! varZ ≈ (∂f/∂X)² varX + (∂f/∂Y)² varY
//! ```
//!
//! Inputs are never modified and results are always freshly allocated.
//! Out-of-domain inputs (division by zero, logarithm of a non-positive value,
//! inverse trigonometry outside [-1, 1]) yield NaN or ±inf exactly as the
//! underlying floating-point arithmetic does; they are not errors.

use crate::broadcast::{broadcast_shape, Broadcast, MeasuredView};
use crate::error::Result;
use crate::measured::Measured;
use crate::types::{DMatrix, Scalar, Shape};

/// Exponent accepted by [`pow`] and [`crate::inplace::pow_inplace`].
#[derive(Debug, Clone, PartialEq)]
pub enum Exponent<T: Scalar> {
    /// The same exponent for every element.
    Uniform(T),
    /// One exponent per element, broadcast against the base.
    Elementwise(DMatrix<T>),
}

impl<T: Scalar> From<T> for Exponent<T> {
    fn from(n: T) -> Self {
        Self::Uniform(n)
    }
}

impl<T: Scalar> From<DMatrix<T>> for Exponent<T> {
    fn from(n: DMatrix<T>) -> Self {
        Self::Elementwise(n)
    }
}

impl<T: Scalar> From<&DMatrix<T>> for Exponent<T> {
    fn from(n: &DMatrix<T>) -> Self {
        Self::Elementwise(n.clone())
    }
}

/// Builds a result of the given shape from a per-element `(value, variance)` function.
fn generate<T, F>(shape: Shape, mut f: F) -> Measured<T>
where
    T: Scalar,
    F: FnMut(usize, usize) -> (T, T),
{
    let (rows, cols) = shape;
    let mut value = DMatrix::zeros(rows, cols);
    let mut variance = DMatrix::zeros(rows, cols);
    for j in 0..cols {
        for i in 0..rows {
            let (z, var_z) = f(i, j);
            value[(i, j)] = z;
            variance[(i, j)] = var_z;
        }
    }
    Measured::from_parts(value, variance)
}

fn unary<T, F>(x: &Measured<T>, f: F) -> Measured<T>
where
    T: Scalar,
    F: Fn(T, T) -> (T, T),
{
    let (value, variance) = (x.value(), x.variance());
    generate(x.shape(), |i, j| f(value[(i, j)], variance[(i, j)]))
}

fn binary<T, F>(x: &Measured<T>, y: &Measured<T>, f: F) -> Result<Measured<T>>
where
    T: Scalar,
    F: Fn(T, T, T, T) -> (T, T),
{
    let shape = broadcast_shape(x.shape(), y.shape())?;
    let lhs = MeasuredView::to(x, shape)?;
    let rhs = MeasuredView::to(y, shape)?;
    Ok(generate(shape, |i, j| {
        let (a, var_a) = lhs.at(i, j);
        let (b, var_b) = rhs.at(i, j);
        f(a, var_a, b, var_b)
    }))
}

/// Addition with error propagation: `X + Y`, `varX + varY`.
pub fn add<T: Scalar>(x: &Measured<T>, y: &Measured<T>) -> Result<Measured<T>> {
    binary(x, y, |a, var_a, b, var_b| (a + b, var_a + var_b))
}

/// Subtraction with error propagation: `X - Y`, `varX + varY`.
pub fn sub<T: Scalar>(x: &Measured<T>, y: &Measured<T>) -> Result<Measured<T>> {
    binary(x, y, |a, var_a, b, var_b| (a - b, var_a + var_b))
}

/// Multiplication with error propagation: `X·Y`, `Y²·varX + X²·varY`.
pub fn mul<T: Scalar>(x: &Measured<T>, y: &Measured<T>) -> Result<Measured<T>> {
    binary(x, y, |a, var_a, b, var_b| (a * b, b * b * var_a + a * a * var_b))
}

/// Division with error propagation.
///
/// With `Z = X/Y`, the variance `(varX/X² + varY/Y²)·Z²` is evaluated as
/// `(varX + varY·Z²)/Y²`, which stays finite when `X` is zero.
pub fn div<T: Scalar>(x: &Measured<T>, y: &Measured<T>) -> Result<Measured<T>> {
    binary(x, y, |a, var_a, b, var_b| {
        let z = a / b;
        (z, (var_a + var_b * z * z) / (b * b))
    })
}

fn pow_element<T: Scalar>(a: T, var_a: T, n: T) -> (T, T) {
    let z = a.powf(n);
    let mut var_z = var_a / a;
    var_z /= a;
    var_z *= z;
    var_z *= z;
    var_z *= n * n;
    (z, var_z)
}

/// `Xⁿ` with error propagation: variance `n²·varX·Z²/X²` where `Z = Xⁿ`.
///
/// The exponent is exact (it carries no variance). It may be a single value
/// or one exponent per element; an elementwise exponent is broadcast against
/// `X`. A zero base gives a NaN variance.
pub fn pow<T, E>(x: &Measured<T>, n: E) -> Result<Measured<T>>
where
    T: Scalar,
    E: Into<Exponent<T>>,
{
    match n.into() {
        Exponent::Uniform(n) => Ok(unary(x, |a, var_a| pow_element(a, var_a, n))),
        Exponent::Elementwise(n) => {
            let n_shape = (n.nrows(), n.ncols());
            let shape = broadcast_shape(x.shape(), n_shape)?;
            let base = MeasuredView::to(x, shape)?;
            let exponent = Broadcast::to(&n, shape)?;
            Ok(generate(shape, |i, j| {
                let (a, var_a) = base.at(i, j);
                pow_element(a, var_a, exponent.get(i, j))
            }))
        }
    }
}

/// `X^Y` with error propagation, both base and exponent measured.
///
/// The variance is `Z²·[(Y·varX/X)² + (ln(X)·varY)²]` with `Z = X^Y`.
/// A non-positive base makes the logarithm term NaN, which propagates.
pub fn pow2<T: Scalar>(x: &Measured<T>, y: &Measured<T>) -> Result<Measured<T>> {
    binary(x, y, |a, var_a, b, var_b| {
        let z = a.powf(b);
        let mut var_z = var_a / a;
        var_z *= b;
        var_z = var_z * var_z;
        let mut t = a.ln();
        t *= var_b;
        t = t * t;
        var_z += t;
        var_z *= z;
        var_z *= z;
        (z, var_z)
    })
}

/// Exponential with error propagation: `eˣ`, `varX·Z²`.
pub fn exp<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| {
        let z = a.exp();
        (z, var_a * z * z)
    })
}

/// Natural logarithm with error propagation: `ln X`, `varX/X²`.
pub fn log<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| (a.ln(), var_a / (a * a)))
}

/// Sine with error propagation: variance `varX·cos²X`.
pub fn sin<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| {
        let c = a.cos();
        (a.sin(), var_a * c * c)
    })
}

/// Cosine with error propagation: variance `varX·sin²X`.
pub fn cos<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| {
        let s = a.sin();
        (a.cos(), var_a * s * s)
    })
}

/// Tangent with error propagation: variance `varX·sec²X`.
pub fn tan<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| {
        let sec = a.cos().recip();
        (a.tan(), var_a * sec * sec)
    })
}

/// Inverse sine with error propagation: variance `varX/(1-X²)`.
pub fn arcsin<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| (a.asin(), var_a / (T::one() - a * a)))
}

/// Inverse cosine with error propagation: variance `varX/(1-X²)`.
pub fn arccos<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| (a.acos(), var_a / (T::one() - a * a)))
}

/// Inverse tangent with error propagation: variance `varX/(1+X²)²`.
pub fn arctan<T: Scalar>(x: &Measured<T>) -> Measured<T> {
    unary(x, |a, var_a| {
        let d = T::one() + a * a;
        (a.atan(), var_a / (d * d))
    })
}

/// Two-argument inverse tangent `atan2(X, Y)` with error propagation.
///
/// The partial derivatives are `Y/(X²+Y²)` and `-X/(X²+Y²)`, so
/// `varZ = (Y²·varX + X²·varY)/(X²+Y²)²`. Where `Y ≠ 0` this equals the
/// variance of `X/Y` divided by `(1+(X/Y)²)²`; unlike that form it stays
/// finite on the `Y = 0` axis. Only the origin gives NaN.
pub fn arctan2<T: Scalar>(x: &Measured<T>, y: &Measured<T>) -> Result<Measured<T>> {
    binary(x, y, |a, var_a, b, var_b| {
        let r2 = a * a + b * b;
        (a.atan2(b), (b * b * var_a + a * a * var_b) / (r2 * r2))
    })
}
