//! Most-significant-digit discovery
//!
//! `msd(bound)` reports the position `n` with `2^(n-1) < |x| < 2^(n+1)`,
//! or `None` when the magnitude cannot be shown to exceed `2^bound`.
//! Structural nodes answer from their operands; kernel-backed nodes
//! answer from their cache when possible and fall back to the generic
//! probing search.

use crate::core::approx::MAX_PRECISION;
use crate::core::error::RealError;
use crate::real::context::EvalContext;
use crate::real::{Kind, Real};

impl Real {
    /// Most-significant-bit position, or `None` if the magnitude cannot
    /// be shown to exceed `2^bound`.
    ///
    /// A `None` answer guarantees `|x| < 2^(bound + 1)`: the search
    /// always issues a final probe at the bound itself before giving up.
    pub fn msd(&self, bound: i64, ctx: &EvalContext) -> Result<Option<i64>, RealError> {
        ctx.check_cancelled()?;
        match self.kind() {
            Kind::Zero => Ok(None),
            Kind::DivByZero => Err(RealError::DivideByZero),
            Kind::Int(k) => Ok(Some(k.bits() as i64 - 1)),
            Kind::Shift(op, n) => Ok(op.msd(bound - n, ctx)?.map(|m| m + n)),
            Kind::Neg(op) | Kind::Abs(op) => op.msd(bound, ctx),
            Kind::Inv(op) => {
                if let Some(m) = self.state().msd {
                    return Ok(Some(m));
                }
                let op_msd = op
                    .msd(ctx.division_limit(), ctx)?
                    .ok_or(RealError::DivideByZero)?;
                let mut st = self.state();
                if st.msd.is_none() {
                    st.msd = Some(-op_msd);
                }
                Ok(Some(-op_msd))
            }
            Kind::Sqrt(op) => {
                let doubled = (2 * bound - 8).max(-MAX_PRECISION);
                Ok(op.msd(doubled, ctx)?.map(|m| m.div_euclid(2)))
            }
            Kind::Pi | Kind::E => Ok(Some(1)),
            _ => self.cached_msd(bound, ctx),
        }
    }

    /// Single-probe MSD check: one evaluation at the bound, trusting
    /// only values with magnitude evidence. The multiplication kernel
    /// leans on this instead of the full search, so nested products
    /// stay linear in the graph depth.
    pub(crate) fn msd_probe(
        &self,
        bound: i64,
        ctx: &EvalContext,
    ) -> Result<Option<i64>, RealError> {
        match self.kind() {
            Kind::Zero => Ok(None),
            Kind::DivByZero => Err(RealError::DivideByZero),
            Kind::Int(k) => Ok(Some(k.bits() as i64 - 1)),
            Kind::Shift(op, n) => Ok(op.msd_probe(bound - n, ctx)?.map(|m| m + n)),
            Kind::Neg(op) | Kind::Abs(op) => op.msd_probe(bound, ctx),
            Kind::Pi | Kind::E => Ok(Some(1)),
            _ => {
                {
                    let mut st = self.state();
                    if let Some(m) = st.msd {
                        return Ok(Some(m));
                    }
                    if let Some(m) = st.appr.as_ref().and_then(|a| a.definite_msd()) {
                        st.msd = Some(m);
                        return Ok(Some(m));
                    }
                }
                let found = self.eval(bound, ctx)?.definite_msd();
                if let Some(m) = found {
                    let mut st = self.state();
                    if st.msd.is_none() {
                        st.msd = Some(m);
                    }
                }
                Ok(found)
            }
        }
    }

    /// MSD lookup for kernel-backed nodes: a previously learned value or
    /// a definite cached approximation answers immediately; otherwise
    /// the probing search runs and the first learned value wins.
    fn cached_msd(&self, bound: i64, ctx: &EvalContext) -> Result<Option<i64>, RealError> {
        {
            let mut st = self.state();
            if let Some(m) = st.msd {
                return Ok(Some(m));
            }
            if let Some(m) = st.appr.as_ref().and_then(|a| a.definite_msd()) {
                st.msd = Some(m);
                return Ok(Some(m));
            }
        }
        let found = self.msd_search(bound, ctx)?;
        if let Some(m) = found {
            let mut st = self.state();
            if st.msd.is_none() {
                st.msd = Some(m);
            }
        }
        Ok(found)
    }

    /// Generic probing search: halve from a coarse positive guess down
    /// to 64, then descend from 0 with a multiplicative schedule, with a
    /// final probe clamped at the requested bound. Cancellation is
    /// polled at every probe.
    fn msd_search(&self, bound: i64, ctx: &EvalContext) -> Result<Option<i64>, RealError> {
        let mut prec = MAX_PRECISION >> 1;
        while prec > 64 {
            ctx.check_cancelled()?;
            if let Some(m) = self.eval(prec, ctx)?.definite_msd() {
                return Ok(Some(m));
            }
            prec >>= 1;
        }
        prec = 0;
        loop {
            ctx.check_cancelled()?;
            if let Some(m) = self.eval(prec, ctx)?.definite_msd() {
                return Ok(Some(m));
            }
            if prec <= bound {
                return Ok(None);
            }
            prec = (prec * 13 / 10 - 16).max(bound);
        }
    }
}
