//! Numerical validation utilities for propagation operators.
//!
//! This module provides tools for checking propagated variances against
//! first-order propagation evaluated with central finite differences, and
//! for checking that an in-place operator reproduces its out-of-place
//! counterpart.

use crate::broadcast::MeasuredView;
use crate::error::{PropagationError, Result};
use crate::measured::Measured;
use crate::types::Scalar;

/// Configuration for numerical validation checks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationConfig<T> {
    /// Finite-difference step, relative to `max(|x|, 1)`
    pub step_size: T,
    /// Largest accepted relative error
    pub relative_tolerance: T,
    /// Absolute differences below this count as exact
    pub absolute_tolerance: T,
}

impl<T: Scalar> Default for ValidationConfig<T> {
    fn default() -> Self {
        Self {
            step_size: T::DEFAULT_STEP,
            relative_tolerance: T::DEFAULT_TOLERANCE,
            absolute_tolerance: T::EPSILON,
        }
    }
}

impl<T: Scalar> ValidationConfig<T> {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ValidationConfigBuilder<T> {
        ValidationConfigBuilder::new()
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size > T::zero() && self.step_size < T::one()) {
            return Err(PropagationError::invalid_configuration(
                "step_size",
                self.step_size.to_string(),
                "must lie in (0, 1)",
            ));
        }
        if !(self.relative_tolerance > T::zero()) {
            return Err(PropagationError::invalid_configuration(
                "relative_tolerance",
                self.relative_tolerance.to_string(),
                "must be positive",
            ));
        }
        if !(self.absolute_tolerance >= T::zero()) {
            return Err(PropagationError::invalid_configuration(
                "absolute_tolerance",
                self.absolute_tolerance.to_string(),
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Builder for [`ValidationConfig`].
#[derive(Debug, Clone)]
pub struct ValidationConfigBuilder<T> {
    config: ValidationConfig<T>,
}

impl<T: Scalar> ValidationConfigBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Set the relative finite-difference step.
    pub fn step_size(mut self, step_size: T) -> Self {
        self.config.step_size = step_size;
        self
    }

    /// Set the relative tolerance.
    pub fn relative_tolerance(mut self, tolerance: T) -> Self {
        self.config.relative_tolerance = tolerance;
        self
    }

    /// Set the absolute tolerance.
    pub fn absolute_tolerance(mut self, tolerance: T) -> Self {
        self.config.absolute_tolerance = tolerance;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ValidationConfig<T>> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl<T: Scalar> Default for ValidationConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of comparing computed values against reference values.
#[derive(Debug, Clone)]
pub struct VarianceCheck<T> {
    /// Largest relative error over all elements
    pub max_relative_error: T,
    /// Whether every element is within tolerance
    pub passed: bool,
    /// Relative error of each element, in column-major order
    pub element_errors: Vec<T>,
    tolerance: T,
}

impl<T: Scalar> VarianceCheck<T> {
    fn from_pairs<I>(pairs: I, config: &ValidationConfig<T>) -> Self
    where
        I: IntoIterator<Item = (T, T)>,
    {
        let element_errors: Vec<T> = pairs
            .into_iter()
            .map(|(got, expected)| relative_error(got, expected, config.absolute_tolerance))
            .collect();
        let max_relative_error = element_errors
            .iter()
            .fold(T::zero(), |acc, &e| if e > acc || e.is_nan() { e } else { acc });
        Self {
            passed: max_relative_error <= config.relative_tolerance,
            max_relative_error,
            element_errors,
            tolerance: config.relative_tolerance,
        }
    }

    /// Turn a failed check into a `ValidationFailed` error naming `operation`.
    pub fn into_result(self, operation: &str) -> Result<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(PropagationError::validation_failed(
                operation,
                Scalar::to_f64(self.max_relative_error),
                Scalar::to_f64(self.tolerance),
            ))
        }
    }
}

/// Relative error of `got` against `expected`; matching NaNs count as exact.
fn relative_error<T: Scalar>(got: T, expected: T, absolute_tolerance: T) -> T {
    if got.is_nan() || expected.is_nan() {
        return if got.is_nan() && expected.is_nan() {
            T::zero()
        } else {
            T::infinity()
        };
    }
    if got == expected {
        return T::zero();
    }
    let diff = (got - expected).abs();
    if diff <= absolute_tolerance {
        T::zero()
    } else {
        diff / expected.abs()
    }
}

/// Central finite difference of `f` at `x`.
fn central_difference<T, F>(f: F, x: T, step_size: T) -> T
where
    T: Scalar,
    F: Fn(T) -> T,
{
    let h = step_size * x.abs().max(T::one());
    let two = T::one() + T::one();
    (f(x + h) - f(x - h)) / (two * h)
}

/// Numerical validation tools for propagation operators.
pub struct NumericalValidator;

impl NumericalValidator {
    /// Check a unary operator's variance against `f'(x)²·varX`.
    ///
    /// `op` is the propagation operator and `f` the plain scalar function it
    /// propagates through, e.g. `(ops::exp, f64::exp)`.
    pub fn check_unary<T, Op, F>(
        op: Op,
        f: F,
        x: &Measured<T>,
        config: &ValidationConfig<T>,
    ) -> Result<VarianceCheck<T>>
    where
        T: Scalar,
        Op: Fn(&Measured<T>) -> Measured<T>,
        F: Fn(T) -> T,
    {
        config.validate()?;
        let result = op(x);
        let pairs = x
            .value()
            .iter()
            .zip(x.variance().iter())
            .zip(result.variance().iter())
            .map(|((&a, &var_a), &got)| {
                let d = central_difference(&f, a, config.step_size);
                (got, d * d * var_a)
            });
        Ok(VarianceCheck::from_pairs(pairs, config))
    }

    /// Check a binary operator's variance against `f_x²·varX + f_y²·varY`.
    ///
    /// Operands may broadcast; the reference is evaluated at every element of
    /// the broadcast result.
    pub fn check_binary<T, Op, F>(
        op: Op,
        f: F,
        x: &Measured<T>,
        y: &Measured<T>,
        config: &ValidationConfig<T>,
    ) -> Result<VarianceCheck<T>>
    where
        T: Scalar,
        Op: Fn(&Measured<T>, &Measured<T>) -> Result<Measured<T>>,
        F: Fn(T, T) -> T,
    {
        config.validate()?;
        let result = op(x, y)?;
        let (rows, cols) = result.shape();
        let lhs = MeasuredView::to(x, (rows, cols))?;
        let rhs = MeasuredView::to(y, (rows, cols))?;

        let mut pairs = Vec::with_capacity(rows * cols);
        for j in 0..cols {
            for i in 0..rows {
                let (a, var_a) = lhs.at(i, j);
                let (b, var_b) = rhs.at(i, j);
                let dx = central_difference(|t| f(t, b), a, config.step_size);
                let dy = central_difference(|t| f(a, t), b, config.step_size);
                pairs.push((result.variance()[(i, j)], dx * dx * var_a + dy * dy * var_b));
            }
        }
        Ok(VarianceCheck::from_pairs(pairs, config))
    }

    /// Check that an in-place operator reproduces its out-of-place counterpart.
    ///
    /// The in-place operator runs on a copy of `x`; both value and variance
    /// are compared.
    pub fn check_inplace_equivalence<T, Out, In>(
        out_of_place: Out,
        in_place: In,
        x: &Measured<T>,
        y: &Measured<T>,
        config: &ValidationConfig<T>,
    ) -> Result<VarianceCheck<T>>
    where
        T: Scalar,
        Out: Fn(&Measured<T>, &Measured<T>) -> Result<Measured<T>>,
        In: for<'a> Fn(&'a mut Measured<T>, &Measured<T>) -> Result<&'a mut Measured<T>>,
    {
        config.validate()?;
        let expected = out_of_place(x, y)?;
        let mut copy = x.clone();
        let got = in_place(&mut copy, y)?;
        if got.shape() != expected.shape() {
            return Err(PropagationError::shapes(expected.shape(), got.shape()));
        }

        let values = got.value().iter().zip(expected.value().iter());
        let variances = got.variance().iter().zip(expected.variance().iter());
        let pairs = values.chain(variances).map(|(&g, &e)| (g, e));
        Ok(VarianceCheck::from_pairs(pairs, config))
    }
}
