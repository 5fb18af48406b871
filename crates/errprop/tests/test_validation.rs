//! Finite-difference checks of the propagated variances.
//!
//! Each operator's variance must match `f'(x)²·varX` (or the two-argument
//! analogue) with the derivative taken numerically.

use errprop::ops::{self, arccos, arcsin, arctan, arctan2, cos, exp, log, sin};
use errprop::validation::{NumericalValidator, ValidationConfig};
use errprop::{Measured, PropagationError};
use proptest::prelude::*;

fn measured(values: &[f64], variances: &[f64]) -> Measured<f64> {
    Measured::from_slices(values, variances).unwrap()
}

fn assert_unary<Op, F>(name: &str, op: Op, f: F, x: &Measured<f64>)
where
    Op: Fn(&Measured<f64>) -> Measured<f64>,
    F: Fn(f64) -> f64,
{
    let config = ValidationConfig::default();
    let check = NumericalValidator::check_unary(op, f, x, &config).unwrap();
    assert!(
        check.passed,
        "{}: max relative error {} ({:?})",
        name, check.max_relative_error, check.element_errors
    );
}

fn assert_binary<Op, F>(name: &str, op: Op, f: F, x: &Measured<f64>, y: &Measured<f64>)
where
    Op: Fn(&Measured<f64>, &Measured<f64>) -> errprop::Result<Measured<f64>>,
    F: Fn(f64, f64) -> f64,
{
    let config = ValidationConfig::default();
    let check = NumericalValidator::check_binary(op, f, x, y, &config).unwrap();
    assert!(
        check.passed,
        "{}: max relative error {} ({:?})",
        name, check.max_relative_error, check.element_errors
    );
}

#[test]
fn test_unary_operators_match_finite_differences() {
    let angles = measured(&[-2.0, -0.7, 0.3, 1.2, 2.5], &[0.01, 0.2, 0.05, 0.3, 0.1]);
    let unit = measured(&[-0.8, -0.25, 0.1, 0.45, 0.75], &[0.01, 0.02, 0.03, 0.04, 0.05]);
    let positive = measured(&[0.05, 0.5, 1.0, 7.5, 120.0], &[1e-4, 0.01, 0.1, 0.5, 3.0]);

    assert_unary("exp", exp, f64::exp, &angles);
    assert_unary("log", log, f64::ln, &positive);
    assert_unary("sin", sin, f64::sin, &angles);
    assert_unary("cos", cos, f64::cos, &angles);
    assert_unary("arcsin", arcsin, f64::asin, &unit);
    assert_unary("arccos", arccos, f64::acos, &unit);
    assert_unary("arctan", arctan, f64::atan, &angles);
}

#[test]
fn test_pow_matches_finite_differences() {
    let x = measured(&[0.2, 1.0, 3.5, 10.0], &[0.001, 0.01, 0.1, 0.2]);
    for n in [-2.0, -0.5, 0.5, 2.0, 3.7] {
        assert_unary(
            "pow",
            |x: &Measured<f64>| ops::pow(x, n).unwrap(),
            |a: f64| a.powf(n),
            &x,
        );
    }
}

#[test]
fn test_binary_operators_match_finite_differences() {
    let x = measured(&[-3.0, -0.4, 0.6, 2.0, 8.0], &[0.1, 0.01, 0.02, 0.5, 1.0]);
    let y = measured(&[1.5, 2.0, -0.9, 0.7, 4.0], &[0.05, 0.3, 0.01, 0.02, 0.2]);

    assert_binary("add", ops::add, |a, b| a + b, &x, &y);
    assert_binary("sub", ops::sub, |a, b| a - b, &x, &y);
    assert_binary("mul", ops::mul, |a, b| a * b, &x, &y);
    assert_binary("div", ops::div, |a, b| a / b, &x, &y);
    assert_binary("arctan2", arctan2, f64::atan2, &x, &y);
}

#[test]
fn test_arctan2_on_the_axis() {
    // Y = 0 is where the quotient form of the arctan2 variance breaks down
    let x = measured(&[1.0, -2.0], &[0.1, 0.3]);
    let y = measured(&[0.0, 0.0], &[0.2, 0.05]);
    assert_binary("arctan2", arctan2, f64::atan2, &x, &y);
}

#[test]
fn test_broadcast_operands_are_checked_elementwise() {
    let x = Measured::new(
        errprop::types::DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        errprop::types::DMatrix::from_element(2, 3, 0.1),
    )
    .unwrap();
    let y = Measured::<f64>::scalar(1.5, 0.02);
    let config = ValidationConfig::default();
    let check = NumericalValidator::check_binary(ops::div, |a, b| a / b, &x, &y, &config).unwrap();
    assert!(check.passed);
    assert_eq!(check.element_errors.len(), 6);
}

#[test]
fn test_into_result() {
    let x = measured(&[0.5], &[0.01]);
    let config = ValidationConfig::default();
    let check = NumericalValidator::check_unary(exp, f64::exp, &x, &config).unwrap();
    assert!(check.into_result("exp").is_ok());

    // sin's variance checked against the wrong function fails loudly
    let check = NumericalValidator::check_unary(sin, f64::exp, &x, &config).unwrap();
    let err = check.into_result("sin").unwrap_err();
    assert!(matches!(err, PropagationError::ValidationFailed { ref operation, .. } if operation == "sin"));
    assert!(err.to_string().contains("sin"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ValidationConfig {
        step_size: 0.0,
        ..ValidationConfig::default()
    };
    let x = measured(&[0.5], &[0.01]);
    let err = NumericalValidator::check_unary(exp, f64::exp, &x, &config).unwrap_err();
    assert!(matches!(err, PropagationError::InvalidConfiguration { .. }));
}

#[test]
fn test_looser_config_for_f32() {
    let x = Measured::<f32>::from_slices(&[0.3, 1.1], &[0.01, 0.02]).unwrap();
    let config = ValidationConfig::<f32>::builder()
        .step_size(1e-2)
        .relative_tolerance(1e-2)
        .build()
        .unwrap();
    let check = NumericalValidator::check_unary(exp, f32::exp, &x, &config).unwrap();
    assert!(check.passed, "max relative error {}", check.max_relative_error);
}

proptest! {
    #[test]
    fn prop_exp_and_arctan_match_finite_differences(
        a in -5.0f64..5.0,
        var_a in 1e-6f64..1.0,
    ) {
        let x = measured(&[a], &[var_a]);
        let config = ValidationConfig::default();
        for (name, check) in [
            ("exp", NumericalValidator::check_unary(exp, f64::exp, &x, &config)),
            ("arctan", NumericalValidator::check_unary(arctan, f64::atan, &x, &config)),
        ] {
            let check = check.unwrap();
            prop_assert!(check.passed, "{} at {}: {}", name, a, check.max_relative_error);
        }
    }

    #[test]
    fn prop_mul_matches_finite_differences(
        a in 0.1f64..50.0,
        b in -50.0f64..-0.1,
        var_a in 0.0f64..1.0,
        var_b in 1e-6f64..1.0,
    ) {
        let x = measured(&[a], &[var_a]);
        let y = measured(&[b], &[var_b]);
        let check = NumericalValidator::check_binary(
            ops::mul,
            |p, q| p * q,
            &x,
            &y,
            &ValidationConfig::default(),
        )
        .unwrap();
        prop_assert!(check.passed, "{}", check.max_relative_error);
    }
}
