//! End-to-end rendering scenarios

use crate::{Evaluator, RealError, eval};

const PI_64: &str = "3.1415926535897932384626433832795028841971693993751058209749445923";

#[test]
fn test_pi_to_64_digits() {
    assert_eq!(eval("pi", 64).unwrap(), PI_64);
}

#[test]
fn test_pi_rendering_is_prefix_stable() {
    let long = eval("pi", 64).unwrap();
    let short = eval("pi", 20).unwrap();
    assert!(long.starts_with(&short));
}

#[test]
fn test_sin_of_half_pi_is_one() {
    let expected = format!("1.{}", "0".repeat(64));
    assert_eq!(eval("sin(0.5*pi)", 64).unwrap(), expected);
}

#[test]
fn test_atan_of_tiny_sine_is_zero() {
    let expected = format!("0.{}", "0".repeat(64));
    assert_eq!(eval("atan(sin(1E-100))", 64).unwrap(), expected);
}

#[test]
fn test_one_millionth() {
    assert_eq!(eval("1 / 1000000", 6).unwrap(), "0.000001");
}

#[test]
fn test_sqrt_two_to_ten_digits() {
    assert_eq!(eval("sqrt(2)", 10).unwrap(), "1.4142135624");
}

#[test]
fn test_exp_of_one_hundred() {
    assert_eq!(
        eval("exp(100)", 10).unwrap(),
        "26881171418161354484126255515800135873611118.7737419224"
    );
}

#[test]
fn test_ln_of_exp_thousand() {
    assert_eq!(eval("ln(exp(1000))", 0).unwrap(), "1000");
}

#[test]
fn test_inverse_below_division_limit() {
    assert_eq!(eval("1/1.0E-10000", 8), Err(RealError::DivideByZero));
}

#[test]
fn test_division_limit_is_configurable() {
    // 1e-500 sits far below 2^-1024, so the coarsest limit rejects it.
    let strict = Evaluator::new().digits(4).division_limit(-1024);
    assert_eq!(strict.eval_str("1/1.0E-500"), Err(RealError::DivideByZero));
    // A deep limit accepts the same denominator.
    let lenient = Evaluator::new().digits(0).division_limit(-4096);
    let rendered = lenient.eval_str("1/1.0E-500").unwrap();
    assert_eq!(rendered.len(), 501);
    assert!(rendered.starts_with('1'));
}

#[test]
fn test_hex_rendering_of_composite() {
    let ev = Evaluator::new();
    let expr = ev.parse("3/16").unwrap();
    assert_eq!(expr.to_radix(2, true, &ev.context()).unwrap(), "0.30");
}

#[test]
fn test_zero_digit_rendering_rounds() {
    assert_eq!(eval("2/3", 0).unwrap(), "1");
    assert_eq!(eval("1/3", 0).unwrap(), "0");
    assert_eq!(eval("5/2", 0).unwrap(), "3");
}
