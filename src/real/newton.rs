//! Newton iterations for the reciprocal and the square root
//!
//! Both kernels share one shape: a double-precision seed worth a few
//! dozen bits, then iterations that double the number of correct bits,
//! with the operand fetched at a matching scale each step. Convergence
//! is declared once the target bit count is reached and two consecutive
//! approximations agree to within `2^30` at a common scale; the result
//! is published 31 bits coarser than the iteration scale so the
//! one-ulp cache contract holds.

use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::core::approx::{Approximation, div_rounded, shift_no_round, shift_rounded};
use crate::core::error::RealError;
use crate::real::Real;
use crate::real::context::EvalContext;

const SEED_BITS_INV: i64 = 30;
const CONVERGENCE_BITS: u64 = 30;

fn seed_to_bigint(x: f64) -> Result<BigInt, RealError> {
    if x.is_finite() {
        Ok(BigInt::from(x.round() as i128))
    } else {
        Err(RealError::arithmetic("seed out of double range"))
    }
}

/// Reciprocal by Newton iteration on `f(z) = 1/z - a`:
/// `z <- 2z - a z^2`.
///
/// The operand's MSD is probed against the configured division limit;
/// failure to show magnitude there is a division by zero.
pub(crate) fn eval_inverse(
    op: &Real,
    p: i64,
    ctx: &EvalContext,
) -> Result<Approximation, RealError> {
    let op_msd = op
        .msd(ctx.division_limit(), ctx)?
        .ok_or(RealError::DivideByZero)?;

    // ~50 significant operand bits seed ~30 result bits in double
    // precision, at scale -op_msd + 1 - 30.
    let a0 = op.eval(op_msd - 50, ctx)?;
    let a0f = a0
        .value
        .to_f64()
        .ok_or_else(|| RealError::arithmetic("seed conversion failed"))?;
    if a0f == 0.0 {
        return Err(RealError::DivideByZero);
    }
    let mut z = seed_to_bigint((f64::powi(2.0, 49) / a0f) * f64::powi(2.0, 30))?;
    let mut scale = -op_msd + 1 - SEED_BITS_INV;
    let mut bits = SEED_BITS_INV;

    let needed = (op_msd.abs() - p + 32).max(31);
    loop {
        ctx.check_cancelled()?;
        let new_bits = (2 * bits).min(needed);
        let new_scale = -op_msd + 1 - new_bits;
        let op_prec = op_msd - new_bits;
        let a = op.eval(op_prec, ctx)?;

        let zz = shift_no_round(&z, scale - new_scale);
        // a z^2 sits at scale op_prec + 2 * new_scale.
        let azz = &a.value * (&zz * &zz);
        let correction = shift_no_round(&azz, op_prec + new_scale);
        let z_next = (&zz << 1u64) - correction;

        let close = (&z_next - &zz).magnitude().bits() <= CONVERGENCE_BITS;
        z = z_next;
        scale = new_scale;
        bits = new_bits;
        if bits >= needed && close {
            break;
        }
    }

    Ok(Approximation::new(shift_rounded(&z, -31), scale + 31))
}

/// Square root by Newton iteration on `f(z) = z^2 - a`:
/// `z <- (z^2 + a) / (2z)`.
pub(crate) fn eval_sqrt(op: &Real, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let probe_bound = 2 * p - 8;
    let op_msd = match op.msd(probe_bound, ctx)? {
        Some(m) if m >= probe_bound => m,
        _ => return Ok(Approximation::zero(p)),
    };
    let result_msd = op_msd.div_euclid(2);

    // Seed from a ~80-bit operand slice at an even precision, so the
    // double square root lands on an exact half scale.
    let seed_prec = (op_msd - 80) & !1;
    let a0 = op.eval(seed_prec, ctx)?;
    if a0.value.sign() == Sign::Minus {
        return Err(RealError::arithmetic("square root of a negative value"));
    }
    let a0f = a0
        .value
        .to_f64()
        .ok_or_else(|| RealError::arithmetic("seed conversion failed"))?;
    let mut z = seed_to_bigint(a0f.sqrt())?;
    if z.is_zero() {
        return Ok(Approximation::zero(p));
    }
    let mut scale = seed_prec / 2;
    let mut bits: i64 = 40;

    let needed = (result_msd - p + 32).max(31);
    loop {
        ctx.check_cancelled()?;
        let new_bits = (2 * bits - 2).min(needed);
        let new_scale = (result_msd - new_bits).min(scale);
        let a = op.eval(2 * new_scale, ctx)?;

        let zz = shift_no_round(&z, scale - new_scale);
        let numerator = &zz * &zz + &a.value;
        let z_next = div_rounded(&numerator, &(&zz << 1u64));

        let close = (&z_next - &zz).magnitude().bits() <= CONVERGENCE_BITS;
        z = z_next;
        scale = new_scale;
        bits = new_bits;
        if bits >= needed && close {
            break;
        }
    }

    Ok(Approximation::new(shift_rounded(&z, -31), scale + 31))
}
