//! Functional and structural identities rendered at fixed precision
//!
//! Integer-valued identities are forced exactly by the one-ulp
//! evaluation contract, so string equality is a sound assertion.

use crate::real::Real;
use crate::{EvalContext, eval};

#[test]
fn test_ln_of_exp_is_identity() {
    let expected = format!("7.{}", "0".repeat(20));
    assert_eq!(eval("ln(exp(7))", 20).unwrap(), expected);
}

#[test]
fn test_exp_of_ln_is_identity() {
    let expected = format!("7.{}", "0".repeat(20));
    assert_eq!(eval("exp(ln(7))", 20).unwrap(), expected);
}

#[test]
fn test_sqrt_squared_is_identity() {
    let expected = format!("7.{}", "0".repeat(20));
    assert_eq!(eval("sqrt(7)^2", 20).unwrap(), expected);
}

#[test]
fn test_pythagorean_identity() {
    let expected = format!("1.{}", "0".repeat(30));
    assert_eq!(eval("sin(1)^2 + cos(1)^2", 30).unwrap(), expected);
}

#[test]
fn test_sin_of_asin_is_identity() {
    let expected = format!("0.30{}", "0".repeat(18));
    assert_eq!(eval("sin(asin(0.3))", 20).unwrap(), expected);
}

#[test]
fn test_atan_of_tan_is_identity() {
    let expected = format!("1.{}", "0".repeat(15));
    assert_eq!(eval("atan(tan(1))", 15).unwrap(), expected);
}

#[test]
fn test_acos_complements_asin() {
    // asin(x) + acos(x) = pi/2. The two sides are distinct graphs, so
    // the very last rendered digit may round apart; everything before
    // it must agree.
    let lhs = eval("asin(0.3) + acos(0.3)", 40).unwrap();
    let rhs = eval("pi/2", 40).unwrap();
    assert_eq!(lhs[..lhs.len() - 1], rhs[..rhs.len() - 1]);
}

#[test]
fn test_double_negation_renders_identically() {
    assert_eq!(eval("-(-(1/3))", 30), eval("1/3", 30));
}

#[test]
fn test_shift_composition() {
    let ctx = EvalContext::new();
    let composed = Real::shift(Real::shift(Real::integer(5), -3), -4);
    let direct = Real::shift(Real::integer(5), -7);
    assert_eq!(
        composed.eval(-20, &ctx).unwrap(),
        direct.eval(-20, &ctx).unwrap()
    );
}

#[test]
fn test_msd_monotonicity() {
    let ctx = EvalContext::new();
    let x = Real::sqrt(Real::integer(2));
    let learned = x.msd(0, &ctx).unwrap();
    assert_eq!(learned, Some(0));
    for bound in [-10, -100, -1000] {
        assert_eq!(x.msd(bound, &ctx).unwrap(), learned);
    }
}

#[test]
fn test_abs_of_negative() {
    let expected = format!("2.5{}", "0".repeat(9));
    assert_eq!(eval("abs(-2.5)", 10).unwrap(), expected);
}

#[test]
fn test_pow_function_matches_integer_power() {
    // pow goes through exp(y ln x); the integer power is exact.
    assert_eq!(eval("pow(2, 10)", 6).unwrap(), "1024.000000");
    assert_eq!(eval("2^10", 6).unwrap(), "1024.000000");
}
