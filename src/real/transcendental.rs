//! Argument reductions and iterative kernels for exp, ln, sin, atan, asin
//!
//! Every transcendental node follows the same two-phase shape: on first
//! evaluation a *reduction* decides whether to rewrite the node into an
//! equivalent subgraph with a smaller argument, or to run the iterative
//! kernel directly. Reductions are built once and memoized on the node.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::core::approx::{Approximation, shift_no_round, shift_rounded};
use crate::core::error::RealError;
use crate::real::context::EvalContext;
use crate::real::{Kind, Real, Reduction};

const CONVERGENCE_BITS: u64 = 30;

/// Run the iterative kernel of a transcendental node whose reduction
/// decided against rewriting.
pub(crate) fn eval_kernel(
    node: &Real,
    p: i64,
    ctx: &EvalContext,
) -> Result<Approximation, RealError> {
    match node.kind() {
        Kind::Exp(arg) => exp_kernel(arg, p, ctx),
        Kind::Ln(arg) => ln_kernel(arg, p, ctx),
        Kind::Sin(arg) => sin_kernel(arg, p, ctx),
        Kind::Atan(arg) => atan_kernel(arg, p, ctx),
        Kind::Asin(arg) => asin_kernel(arg, p, ctx),
        _ => node.eval(p, ctx),
    }
}

// -----------------------------------------------------------------------------
// exp
// -----------------------------------------------------------------------------

/// Reduce the exponential argument into [1, 2]: negate-and-invert,
/// halve-and-square, or borrow a factor of e from the factory.
pub(crate) fn reduce_exp(arg: &Real, ctx: &EvalContext) -> Result<Reduction, RealError> {
    let probe = arg.eval(-10, ctx)?.value;
    if probe.is_negative() {
        return Ok(Reduction::Rewrite(Real::inverse(Real::exp(Real::negate(
            arg.clone(),
        )))));
    }
    if probe > BigInt::from(1 << 11) {
        let half = Real::exp(Real::shift(arg.clone(), -1));
        return Ok(Reduction::Rewrite(Real::mul(half.clone(), half)));
    }
    if probe < BigInt::from(1 << 10) {
        let shifted = Real::exp(Real::add(arg.clone(), Real::integer(1)));
        return Ok(Reduction::Rewrite(Real::mul(shifted, ctx.constants().inv_e())));
    }
    Ok(Reduction::Kernel)
}

/// Factorial series `sum x^k / k!` at a working precision with 64 guard
/// bits.
fn exp_kernel(arg: &Real, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let q = (p - 64).min(-32);
    let x = arg.eval(q, ctx)?.value;
    let mut term = BigInt::one() << ((-q) as u64);
    let mut sum = term.clone();
    let mut k = 1u64;
    while !term.is_zero() {
        if k % 16 == 0 {
            ctx.check_cancelled()?;
        }
        term = shift_no_round(&(&term * &x), q) / BigInt::from(k);
        sum += &term;
        k += 1;
    }
    Ok(Approximation::new(shift_rounded(&sum, q - p), p))
}

// -----------------------------------------------------------------------------
// ln
// -----------------------------------------------------------------------------

/// Reduce the logarithm argument into roughly [1/8, 128]: big arguments
/// via `ln a = 2 ln sqrt(a)`, small ones via `ln a = -ln(1/a)`.
pub(crate) fn reduce_ln(arg: &Real, ctx: &EvalContext) -> Result<Reduction, RealError> {
    if let Some(m) = arg.msd(0, ctx)? {
        if m > 13 {
            return Ok(Reduction::Rewrite(Real::shift(
                Real::ln(Real::sqrt(arg.clone())),
                1,
            )));
        }
    }
    let probe = arg.eval(-5, ctx)?.value;
    if probe.is_negative() {
        return Err(RealError::arithmetic("logarithm of a non-positive value"));
    }
    if probe < BigInt::from(4) {
        return Ok(Reduction::Rewrite(Real::negate(Real::ln(Real::inverse(
            arg.clone(),
        )))));
    }
    if probe > BigInt::from(4096) {
        return Ok(Reduction::Rewrite(Real::shift(
            Real::ln(Real::sqrt(arg.clone())),
            1,
        )));
    }
    Ok(Reduction::Kernel)
}

/// One Newton step for `f(z) = exp(z) - a`:
/// `z <- z - 1 + a * exp(-z)`, carried out at the target scale.
fn ln_step(
    arg: &Real,
    z: &BigInt,
    s: i64,
    ns: i64,
    ctx: &EvalContext,
) -> Result<BigInt, RealError> {
    let zc = Real::shift(Real::integer(z.clone()), s);
    let w = Real::mul(arg.clone(), Real::exp(Real::negate(zc)));
    let wv = w.eval(ns - 2, ctx)?.value;
    Ok(shift_no_round(z, s - ns) - (BigInt::one() << ((-ns) as u64)) + shift_rounded(&wv, -2))
}

/// Newton iteration for the logarithm, seeded from the double-precision
/// logarithm of a 50-bit operand slice.
fn ln_kernel(arg: &Real, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let a0 = arg.eval(-50, ctx)?;
    let a0f = a0
        .value
        .to_f64()
        .ok_or_else(|| RealError::arithmetic("seed conversion failed"))?
        * f64::powi(2.0, -50);
    if a0f <= 0.0 {
        return Err(RealError::arithmetic("logarithm of a non-positive value"));
    }
    let mut z = BigInt::from((a0f.ln() * f64::powi(2.0, 40)).round() as i128);
    let mut s: i64 = -40;

    let final_s = (p - 32).min(-40);
    loop {
        ctx.check_cancelled()?;
        let ns = if s > final_s { (2 * s).max(final_s) } else { s };
        let z_next = ln_step(arg, &z, s, ns, ctx)?;
        let close =
            (&z_next - shift_no_round(&z, s - ns)).magnitude().bits() <= CONVERGENCE_BITS;
        z = z_next;
        s = ns;
        if s <= final_s && close {
            break;
        }
    }
    Ok(Approximation::new(shift_rounded(&z, -31), s + 31))
}

// -----------------------------------------------------------------------------
// sin
// -----------------------------------------------------------------------------

/// Reduce the sine argument: subtract whole multiples of pi (flipping
/// the sign for odd multiples), then apply the triple-angle identity
/// `sin(3x) = 3 sin(x) - 4 sin^3(x)` until the Taylor series converges
/// quickly.
pub(crate) fn reduce_sin(arg: &Real, ctx: &EvalContext) -> Result<Reduction, RealError> {
    let probe = arg.eval(-3, ctx)?.value;
    if probe.abs() >= BigInt::from(24) {
        let n = probe.div_floor(&BigInt::from(24));
        let multiple = Real::mul(Real::integer(n.clone()), ctx.constants().pi());
        let inner = Real::sin(Real::sub(arg.clone(), multiple));
        return Ok(Reduction::Rewrite(if n.is_odd() {
            Real::negate(inner)
        } else {
            inner
        }));
    }
    if probe.abs() >= BigInt::from(4) {
        let third = Real::div(arg.clone(), Real::integer(3));
        let s = Real::sin(third);
        let cube = Real::mul(Real::mul(s.clone(), s.clone()), s.clone());
        return Ok(Reduction::Rewrite(Real::sub(
            Real::mul(Real::integer(3), s),
            Real::shift(cube, 2),
        )));
    }
    Ok(Reduction::Kernel)
}

/// Alternating Taylor series for sine with the recurrence
/// `t <- -t * x^2 / ((2k)(2k+1))`.
fn sin_kernel(arg: &Real, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let q = (2 * p).min(-64);
    let x = arg.eval(q, ctx)?.value;
    let x2 = shift_no_round(&(&x * &x), q);
    let mut term = x.clone();
    let mut sum = x;
    let mut k = 1u64;
    while !term.is_zero() {
        if k % 8 == 0 {
            ctx.check_cancelled()?;
        }
        term = -shift_no_round(&(&term * &x2), q);
        term /= BigInt::from(2 * k * (2 * k + 1));
        sum += &term;
        k += 1;
    }
    Ok(Approximation::new(shift_rounded(&sum, q - p), p))
}

// -----------------------------------------------------------------------------
// atan
// -----------------------------------------------------------------------------

/// Reduce the arctangent argument below 1/2 with
/// `atan(x) = 2 atan(x / (1 + sqrt(1 + x^2)))`.
pub(crate) fn reduce_atan(arg: &Real, ctx: &EvalContext) -> Result<Reduction, RealError> {
    if let Some(m) = arg.msd(-2, ctx)? {
        if m >= -1 {
            let square = Real::mul(arg.clone(), arg.clone());
            let denom = Real::add(
                Real::integer(1),
                Real::sqrt(Real::add(Real::integer(1), square)),
            );
            return Ok(Reduction::Rewrite(Real::shift(
                Real::atan(Real::div(arg.clone(), denom)),
                1,
            )));
        }
    }
    Ok(Reduction::Kernel)
}

/// Alternating Taylor series `sum (-1)^k x^(2k+1) / (2k+1)`; the power
/// recurrence and the per-term division stay separate.
fn atan_kernel(arg: &Real, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let q = (p - 16).min(-16);
    let x = arg.eval(q, ctx)?.value;
    let x2 = shift_no_round(&(&x * &x), q);
    let mut power = x.clone();
    let mut sum = x;
    let mut k = 1u64;
    while !power.is_zero() {
        if k % 8 == 0 {
            ctx.check_cancelled()?;
        }
        power = -shift_no_round(&(&power * &x2), q);
        sum += &power / BigInt::from(2 * k + 1);
        k += 1;
    }
    Ok(Approximation::new(shift_rounded(&sum, q - p), p))
}

// -----------------------------------------------------------------------------
// asin
// -----------------------------------------------------------------------------

/// Reject operands beyond +/-1, and reduce the rest below 1/2 with
/// `asin(x) = 2 asin(x / sqrt(2 + 2 sqrt(1 - x^2)))`.
pub(crate) fn reduce_asin(arg: &Real, ctx: &EvalContext) -> Result<Reduction, RealError> {
    let probe = arg.eval(-5, ctx)?.value;
    if probe.abs() > BigInt::from(33) {
        return Err(RealError::Overflow);
    }
    if let Some(m) = arg.msd(-5, ctx)? {
        if m > -1 {
            let square = Real::mul(arg.clone(), arg.clone());
            let root = Real::sqrt(Real::sub(Real::integer(1), square));
            let denom = Real::sqrt(Real::add(Real::integer(2), Real::shift(root, 1)));
            return Ok(Reduction::Rewrite(Real::shift(
                Real::asin(Real::div(arg.clone(), denom)),
                1,
            )));
        }
    }
    Ok(Reduction::Kernel)
}

/// One Newton step for `f(z) = sin(z) - a`:
/// `z <- z - (sin(z) - a) / cos(z)`.
fn asin_step(
    arg: &Real,
    z: &BigInt,
    s: i64,
    ns: i64,
    ctx: &EvalContext,
) -> Result<BigInt, RealError> {
    let zc = Real::shift(Real::integer(z.clone()), s);
    let numerator = Real::sub(Real::sin(zc.clone()), arg.clone());
    let w = Real::div(numerator, ctx.constants().cos(zc));
    let wv = w.eval(ns - 2, ctx)?.value;
    Ok(shift_no_round(z, s - ns) - shift_rounded(&wv, -2))
}

/// Newton iteration for the arcsine, seeded from the double-precision
/// arcsine of a 50-bit operand slice.
fn asin_kernel(arg: &Real, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let a0 = arg.eval(-50, ctx)?;
    let a0f = (a0
        .value
        .to_f64()
        .ok_or_else(|| RealError::arithmetic("seed conversion failed"))?
        * f64::powi(2.0, -50))
    .clamp(-1.0, 1.0);
    let mut z = BigInt::from((a0f.asin() * f64::powi(2.0, 40)).round() as i128);
    let mut s: i64 = -40;

    let final_s = (p - 32).min(-40);
    loop {
        ctx.check_cancelled()?;
        let ns = if s > final_s { (2 * s).max(final_s) } else { s };
        let z_next = asin_step(arg, &z, s, ns, ctx)?;
        let close =
            (&z_next - shift_no_round(&z, s - ns)).magnitude().bits() <= CONVERGENCE_BITS;
        z = z_next;
        s = ns;
        if s <= final_s && close {
            break;
        }
    }
    Ok(Approximation::new(shift_rounded(&z, -31), s + 31))
}
