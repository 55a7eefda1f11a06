//! Shared constants: pi (Brent-Salamin), e (factorial series), 1/e
//!
//! The factory memoizes one node per constant so every evaluation done
//! through the same factory shares one approximation cache.

use std::sync::OnceLock;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::core::approx::{Approximation, div_rounded, shift_no_round, shift_rounded};
use crate::core::error::RealError;
use crate::real::context::EvalContext;
use crate::real::Real;

/// Factory for the process-wide constant nodes and the derived
/// trigonometric compositions that need them.
#[derive(Default)]
pub struct Constants {
    pi: OnceLock<Real>,
    e: OnceLock<Real>,
    inv_e: OnceLock<Real>,
}

impl Constants {
    pub fn new() -> Self {
        Constants::default()
    }

    /// The memoized pi node.
    pub fn pi(&self) -> Real {
        self.pi.get_or_init(Real::pi_node).clone()
    }

    /// The memoized e node.
    pub fn e(&self) -> Real {
        self.e.get_or_init(Real::e_node).clone()
    }

    /// The memoized 1/e node, used by the exponential reduction.
    pub fn inv_e(&self) -> Real {
        self.inv_e
            .get_or_init(|| Real::inverse(self.e()))
            .clone()
    }

    /// `pi / 2`.
    pub fn half_pi(&self) -> Real {
        Real::shift(self.pi(), -1)
    }

    /// `cos(x)`, as `sin(pi/2 - x)`.
    pub fn cos(&self, x: Real) -> Real {
        Real::sin(Real::add(self.half_pi(), Real::negate(x)))
    }

    /// `tan(x)`, as `sin(x) / sqrt(1 - sin(x)^2)`.
    pub fn tan(&self, x: Real) -> Real {
        let s = Real::sin(x);
        let s2 = Real::mul(s.clone(), s.clone());
        Real::div(s, Real::sqrt(Real::sub(Real::integer(1), s2)))
    }

    /// `acos(x)`, as `pi/2 - asin(x)`.
    pub fn acos(&self, x: Real) -> Real {
        Real::sub(self.half_pi(), Real::asin(x))
    }

    /// `x^y`, as `exp(y * ln(x))`.
    pub fn pow(&self, x: Real, y: Real) -> Real {
        Real::exp(Real::mul(y, Real::ln(x)))
    }
}

/// Brent-Salamin iteration for pi.
///
/// All four state variables live at a working precision twice the
/// target; the loop stops once `|A - B| < 2^(target - 8)` and the result
/// `A^2 / T` is published a little coarser than the working scale so the
/// one-ulp contract holds.
pub(crate) fn eval_pi(p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let target = p.min(0);
    let wp = 2 * target - 8;

    let one = BigInt::one() << ((-wp) as u64);
    let mut a = one.clone();
    let mut b = (BigInt::one() << ((-2 * wp - 1) as u64)).sqrt();
    let mut t = BigInt::one() << ((-wp - 2) as u64);
    let mut x = BigInt::one();

    let threshold = BigInt::one() << ((target - 8 - wp) as u64);
    loop {
        ctx.check_cancelled()?;
        let diff = &a - &b;
        if diff.magnitude() < threshold.magnitude() {
            break;
        }
        let y = a.clone();
        a = (&a + &b) >> 1u64;
        b = (&b * &y).sqrt();
        let d = &a - &y;
        t -= &x * shift_no_round(&(&d * &d), wp);
        x <<= 1u64;
    }

    let quotient = div_rounded(&(&a * &a), &t);
    let q = p - 4;
    Ok(Approximation::new(shift_rounded(&quotient, wp - q), q))
}

/// Factorial series for e at a working precision with 64 guard bits.
pub(crate) fn eval_e(p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let q = (2 * p).min(-64);
    let mut term = BigInt::one() << ((-q) as u64);
    let mut sum = term.clone();
    let mut k = 1u64;
    while !term.is_zero() {
        if k % 16 == 0 {
            ctx.check_cancelled()?;
        }
        term /= BigInt::from(k);
        sum += &term;
        k += 1;
    }
    Ok(Approximation::new(shift_rounded(&sum, q - p), p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pi_coarse_value() {
        let ctx = EvalContext::new();
        // round(pi * 2^10) = 3217
        let appr = eval_pi(-10, &ctx).map(|a| a.to_precision(-10));
        assert_eq!(appr.map(|a| a.value), Ok(BigInt::from(3217)));
    }

    #[test]
    fn test_e_coarse_value() {
        let ctx = EvalContext::new();
        // round(e * 2^10) = 2784
        let appr = eval_e(-10, &ctx).map(|a| a.to_precision(-10));
        assert_eq!(appr.map(|a| a.value), Ok(BigInt::from(2784)));
    }

    #[test]
    fn test_factory_memoizes_nodes() {
        let c = Constants::new();
        assert_eq!(c.pi().id(), c.pi().id());
        assert_eq!(c.e().id(), c.e().id());
        assert_eq!(c.inv_e().id(), c.inv_e().id());
    }
}
