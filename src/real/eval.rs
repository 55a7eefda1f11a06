//! Demand-driven evaluation of the node graph
//!
//! `eval(p)` answers with an integer approximation at exactly the
//! requested precision. Structural nodes forward with adjusted
//! precisions; every iterative kernel sits behind the per-node
//! approximation cache.

#[cfg(test)]
use num_bigint::BigInt;
use num_traits::Signed;

use crate::core::approx::{Approximation, shift_rounded, verify_precision};
use crate::core::error::RealError;
use crate::real::context::EvalContext;
use crate::real::{Kind, Real, Reduction, constants, newton, transcendental};

impl Real {
    /// Evaluate to an [`Approximation`] whose `precision` equals `p` and
    /// whose error stays below one unit in the last place.
    pub fn eval(&self, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
        ctx.check_cancelled()?;
        verify_precision(p)?;
        match self.kind() {
            Kind::Zero => Ok(Approximation::zero(p)),
            Kind::Int(k) => Ok(Approximation::new(shift_rounded(k, -p), p)),
            Kind::Shift(op, n) => {
                let inner = op.eval(p - n, ctx)?;
                Ok(Approximation::new(inner.value, p))
            }
            Kind::Neg(op) => {
                let inner = op.eval(p, ctx)?;
                Ok(Approximation::new(-inner.value, p))
            }
            Kind::Abs(op) => {
                let inner = op.eval(p, ctx)?;
                Ok(Approximation::new(inner.value.abs(), p))
            }
            Kind::DivByZero => Err(RealError::DivideByZero),
            _ => self.cached_eval(p, ctx),
        }
    }

    /// The caching wrapper shared by every kernel-backed node.
    ///
    /// A cache hit at a finer-or-equal precision answers by rounding;
    /// otherwise the kernel runs and its result is stored, but only when
    /// it improves on the cached entry. Entries are never coarsened.
    fn cached_eval(&self, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
        let hit = {
            let st = self.state();
            st.appr.as_ref().filter(|a| a.precision <= p).cloned()
        };
        if let Some(appr) = hit {
            return Ok(appr.to_precision(p));
        }

        let fresh = self.compute(p, ctx)?;
        debug_assert!(fresh.precision <= p);
        {
            let mut st = self.state();
            let improves = st
                .appr
                .as_ref()
                .is_none_or(|c| fresh.precision < c.precision);
            if improves {
                st.appr = Some(fresh.clone());
            }
        }
        Ok(fresh.to_precision(p))
    }

    fn compute(&self, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
        match self.kind() {
            Kind::Add(a, b) => eval_add(a, b, p, ctx),
            Kind::Mul(a, b) => self.eval_mul(a, b, p, ctx),
            Kind::Inv(op) => newton::eval_inverse(op, p, ctx),
            Kind::Sqrt(op) => newton::eval_sqrt(op, p, ctx),
            Kind::Pi => constants::eval_pi(p, ctx),
            Kind::E => constants::eval_e(p, ctx),
            Kind::IntPow(..)
            | Kind::Exp(_)
            | Kind::Ln(_)
            | Kind::Sin(_)
            | Kind::Atan(_)
            | Kind::Asin(_) => match self.reduction(ctx)? {
                Reduction::Rewrite(node) => node.eval(p, ctx),
                Reduction::Kernel => transcendental::eval_kernel(self, p, ctx),
            },
            // Structural kinds are handled before the cache is consulted.
            _ => self.eval(p, ctx),
        }
    }

    /// One-shot reduction lookup, built under the node mutex on first
    /// use. Probing the argument happens while the lock is held; the
    /// graph is acyclic, so only descendant locks can be taken.
    pub(crate) fn reduction(&self, ctx: &EvalContext) -> Result<Reduction, RealError> {
        let mut st = self.state();
        if let Some(red) = &st.reduced {
            return Ok(red.clone());
        }
        let red = match self.kind() {
            Kind::IntPow(base, n) => Reduction::Rewrite(pow_chain(base, *n)),
            Kind::Exp(arg) => transcendental::reduce_exp(arg, ctx)?,
            Kind::Ln(arg) => transcendental::reduce_ln(arg, ctx)?,
            Kind::Sin(arg) => transcendental::reduce_sin(arg, ctx)?,
            Kind::Atan(arg) => transcendental::reduce_atan(arg, ctx)?,
            Kind::Asin(arg) => transcendental::reduce_asin(arg, ctx)?,
            _ => Reduction::Kernel,
        };
        st.reduced = Some(red.clone());
        Ok(red)
    }

    /// Multiplication per the scaled-operand scheme: discover operand
    /// MSDs with single probes (memoized on the node), short-circuit
    /// products that round to zero, then evaluate each side with a
    /// four-bit guard against the other side's magnitude.
    fn eval_mul(
        &self,
        a: &Real,
        b: &Real,
        p: i64,
        ctx: &EvalContext,
    ) -> Result<Approximation, RealError> {
        let half = (p >> 1) - 1;
        let memo = self.state().operand_msd;

        // One operand has to show a definite magnitude at half
        // precision, else the product rounds to zero at p.
        let (known, msd_known) = match (memo[0], memo[1]) {
            (Some(m), _) => (0, m),
            (None, Some(m)) => (1, m),
            (None, None) => {
                if let Some(m) = a.msd_probe(half, ctx)? {
                    (0, m)
                } else if let Some(m) = b.msd_probe(half, ctx)? {
                    (1, m)
                } else {
                    return Ok(Approximation::zero(p));
                }
            }
        };
        self.state().operand_msd[known] = Some(msd_known);

        if a.id() == b.id() {
            // Squaring: a single evaluation serves both sides.
            if 2 * msd_known - p < -4 {
                return Ok(Approximation::zero(p));
            }
            let pa = p - msd_known - 4;
            let va = a.eval(pa, ctx)?;
            let square = &va.value * &va.value;
            return Ok(Approximation::new(shift_rounded(&square, 2 * pa - p), p));
        }

        let (the_known, other) = if known == 0 { (a, b) } else { (b, a) };

        // With both magnitudes memoized the two sides are independent
        // and may evaluate concurrently.
        let memo_other = self.state().operand_msd[1 - known];
        if let Some(msd_other) = memo_other {
            if msd_known + msd_other - p < -4 {
                return Ok(Approximation::zero(p));
            }
            let pk = p - msd_other - 4;
            let po = p - msd_known - 4;
            let (vk, vo) = ctx.join(|| the_known.eval(pk, ctx), || other.eval(po, ctx))?;
            let product = &vk.value * &vo.value;
            return Ok(Approximation::new(
                shift_rounded(&product, pk + po - p),
                p,
            ));
        }

        // Otherwise the second magnitude falls out of the evaluation the
        // product needs anyway.
        let po = p - msd_known - 4;
        let vo = other.eval(po, ctx)?;
        let msd_other = match vo.msd() {
            Some(m) => m,
            None => return Ok(Approximation::zero(p)),
        };
        if let Some(m) = vo.definite_msd() {
            self.state().operand_msd[1 - known] = Some(m);
        }
        if msd_known + msd_other - p < -4 {
            return Ok(Approximation::zero(p));
        }
        let pk = p - msd_other - 4;
        let vk = the_known.eval(pk, ctx)?;
        let product = &vk.value * &vo.value;
        Ok(Approximation::new(
            shift_rounded(&product, pk + po - p),
            p,
        ))
    }
}

/// Addition with two guard bits: each operand contributes at most one
/// ulp of error at `p - 2`, which the final rounding absorbs.
fn eval_add(a: &Real, b: &Real, p: i64, ctx: &EvalContext) -> Result<Approximation, RealError> {
    let (va, vb) = ctx.join(|| a.eval(p - 2, ctx), || b.eval(p - 2, ctx))?;
    let sum = va.value + vb.value;
    Ok(Approximation::new(shift_rounded(&sum, -2), p))
}

/// Square-and-multiply lowering for integer powers. Halved exponents
/// share one node, so the multiplication squaring path sees the same
/// handle on both sides.
fn pow_chain(base: &Real, n: u64) -> Real {
    if n == 1 {
        return base.clone();
    }
    let half = pow_chain(base, n / 2);
    let square = Real::mul(half.clone(), half);
    if n % 2 == 1 {
        Real::mul(square, base.clone())
    } else {
        square
    }
}
