//! Computable-real nodes and the lazy evaluation graph
//!
//! A [`Real`] is a handle to an immutable node in a DAG of computable
//! reals. Nothing is computed at construction time; every node knows how
//! to answer `eval(p)` (an integer approximation scaled by `2^p`) and
//! `msd(bound)` (the position of its most significant bit) on demand.
//! The only mutable state is the per-node cache behind a mutex.

pub mod constants;
pub mod context;
mod eval;
mod msd;
mod newton;
mod render;
mod transcendental;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use num_bigint::BigInt;
use num_traits::Zero;

use crate::core::approx::Approximation;

static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A computable real: a shared handle to one node of the lazy graph.
///
/// Cloning a `Real` clones the handle, not the node, so a cloned
/// operand shares its approximation cache with the original.
#[derive(Clone)]
pub struct Real(Arc<Node>);

pub(crate) struct Node {
    id: u64,
    kind: Kind,
    state: Mutex<State>,
}

/// The node sum type. Construction-time metadata only; the per-variant
/// evaluation rules live in `eval`, `msd`, `newton`, `constants` and
/// `transcendental`.
pub(crate) enum Kind {
    Zero,
    Int(BigInt),
    /// `op * 2^n`
    Shift(Real, i64),
    Neg(Real),
    Abs(Real),
    Add(Real, Real),
    Mul(Real, Real),
    /// `1 / op`, Newton iteration
    Inv(Real),
    Sqrt(Real),
    /// `base^n` for `n >= 2`, lowered to a square-and-multiply chain on
    /// first evaluation
    IntPow(Real, u64),
    Exp(Real),
    Ln(Real),
    Sin(Real),
    Atan(Real),
    Asin(Real),
    Pi,
    E,
    /// Sentinel for a denominator indistinguishable from zero.
    DivByZero,
}

/// Lazily created mutable node state, serialized under the node mutex.
#[derive(Default)]
pub(crate) struct State {
    /// Best approximation computed so far; only ever replaced by a
    /// strictly finer one.
    pub appr: Option<Approximation>,
    /// Learned most-significant-bit position; first writer wins.
    pub msd: Option<i64>,
    /// One-shot argument reduction for the transcendental kinds and the
    /// multiplication chain of `IntPow`.
    pub reduced: Option<Reduction>,
    /// Multiplication side-cache: known MSDs of the two operands.
    pub operand_msd: [Option<i64>; 2],
}

/// What a transcendental node does when evaluated: either forward to an
/// equivalent (smaller-argument) subgraph, or run its iterative kernel
/// directly on its own argument.
#[derive(Clone)]
pub(crate) enum Reduction {
    Rewrite(Real),
    Kernel,
}

impl Real {
    fn new(kind: Kind) -> Self {
        Real(Arc::new(Node {
            id: next_id(),
            kind,
            state: Mutex::new(State::default()),
        }))
    }

    /// Unique node id, assigned at construction. Equal ids mean the same
    /// node (and therefore a shared cache); the multiplication kernel
    /// uses this to evaluate a square only once.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.0.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -------------------------------------------------------------------------
    // Leaf constructors
    // -------------------------------------------------------------------------

    /// The exact zero.
    pub fn zero() -> Self {
        Real::new(Kind::Zero)
    }

    /// An exact integer. Zero collapses to the `Zero` node.
    pub fn integer(value: impl Into<BigInt>) -> Self {
        let value = value.into();
        if value.is_zero() {
            Real::zero()
        } else {
            Real::new(Kind::Int(value))
        }
    }

    pub(crate) fn pi_node() -> Self {
        Real::new(Kind::Pi)
    }

    pub(crate) fn e_node() -> Self {
        Real::new(Kind::E)
    }

    /// The sentinel that fails every evaluation with `DivideByZero`.
    pub fn division_by_zero() -> Self {
        Real::new(Kind::DivByZero)
    }

    // -------------------------------------------------------------------------
    // Structural constructors (with the trivial-identity shortcuts)
    // -------------------------------------------------------------------------

    /// `x * 2^n`. Shift counts compose under addition and a shift by
    /// zero is elided.
    pub fn shift(x: Real, n: i64) -> Self {
        if n == 0 {
            return x;
        }
        match x.kind() {
            Kind::Zero => x,
            Kind::Shift(inner, m) => Real::shift(inner.clone(), n + m),
            _ => Real::new(Kind::Shift(x, n)),
        }
    }

    /// `-x`. Negating an integer literal folds into the literal.
    pub fn negate(x: Real) -> Self {
        match x.kind() {
            Kind::Zero => x,
            Kind::Int(k) => Real::integer(-k),
            _ => Real::new(Kind::Neg(x)),
        }
    }

    /// `|x|`.
    pub fn abs(x: Real) -> Self {
        Real::new(Kind::Abs(x))
    }

    /// `a + b`. Addition with an additive inverse collapses to zero.
    pub fn add(a: Real, b: Real) -> Self {
        if let Kind::Neg(inner) = b.kind() {
            if inner.id() == a.id() {
                return Real::zero();
            }
        }
        if let Kind::Neg(inner) = a.kind() {
            if inner.id() == b.id() {
                return Real::zero();
            }
        }
        Real::new(Kind::Add(a, b))
    }

    /// `a - b`, as `a + (-b)`.
    pub fn sub(a: Real, b: Real) -> Self {
        Real::add(a, Real::negate(b))
    }

    /// `a * b`. Multiplication by zero absorbs.
    pub fn mul(a: Real, b: Real) -> Self {
        if matches!(a.kind(), Kind::Zero) {
            return a;
        }
        if matches!(b.kind(), Kind::Zero) {
            return b;
        }
        Real::new(Kind::Mul(a, b))
    }

    /// `1 / x`. A double reciprocal unwraps; the reciprocal of the exact
    /// zero is the division-by-zero sentinel.
    pub fn inverse(x: Real) -> Self {
        match x.kind() {
            Kind::Zero => Real::division_by_zero(),
            Kind::Inv(inner) => inner.clone(),
            _ => Real::new(Kind::Inv(x)),
        }
    }

    /// `a / b`, as `a * (1/b)`.
    pub fn div(a: Real, b: Real) -> Self {
        Real::mul(a, Real::inverse(b))
    }

    /// `x^n` for a machine integer exponent. A negative exponent lowers
    /// to `(1/x)^|n|`; the multiplication chain itself is built lazily
    /// on first evaluation.
    pub fn int_pow(x: Real, n: i64) -> Self {
        if n == 0 {
            return Real::integer(1);
        }
        if n == 1 {
            return x;
        }
        if n < 0 {
            return Real::int_pow(Real::inverse(x), -n);
        }
        Real::new(Kind::IntPow(x, n as u64))
    }

    /// `sqrt(x)`.
    pub fn sqrt(x: Real) -> Self {
        Real::new(Kind::Sqrt(x))
    }

    // -------------------------------------------------------------------------
    // Transcendental constructors
    // -------------------------------------------------------------------------

    pub fn exp(x: Real) -> Self {
        Real::new(Kind::Exp(x))
    }

    pub fn ln(x: Real) -> Self {
        Real::new(Kind::Ln(x))
    }

    pub fn sin(x: Real) -> Self {
        Real::new(Kind::Sin(x))
    }

    pub fn atan(x: Real) -> Self {
        Real::new(Kind::Atan(x))
    }

    pub fn asin(x: Real) -> Self {
        Real::new(Kind::Asin(x))
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Real#{}({})", self.id(), self)
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Kind::Zero => write!(f, "0"),
            Kind::Int(k) => write!(f, "{}", k),
            Kind::Shift(op, n) => write!(f, "({} * 2^{})", op, n),
            Kind::Neg(op) => write!(f, "-({})", op),
            Kind::Abs(op) => write!(f, "abs({})", op),
            Kind::Add(a, b) => write!(f, "({} + {})", a, b),
            Kind::Mul(a, b) => write!(f, "({} * {})", a, b),
            Kind::Inv(op) => write!(f, "(1 / {})", op),
            Kind::Sqrt(op) => write!(f, "sqrt({})", op),
            Kind::IntPow(base, n) => write!(f, "({})^{}", base, n),
            Kind::Exp(op) => write!(f, "exp({})", op),
            Kind::Ln(op) => write!(f, "ln({})", op),
            Kind::Sin(op) => write!(f, "sin({})", op),
            Kind::Atan(op) => write!(f, "atan({})", op),
            Kind::Asin(op) => write!(f, "asin({})", op),
            Kind::Pi => write!(f, "pi"),
            Kind::E => write!(f, "e"),
            Kind::DivByZero => write!(f, "<division by zero>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_composition() {
        let x = Real::integer(3);
        let shifted = Real::shift(Real::shift(x, 2), 3);
        match shifted.kind() {
            Kind::Shift(_, n) => assert_eq!(*n, 5),
            _ => panic!("expected composed shift"),
        }
    }

    #[test]
    fn test_shift_by_zero_is_identity() {
        let x = Real::integer(7);
        let id = x.id();
        assert_eq!(Real::shift(x, 0).id(), id);
    }

    #[test]
    fn test_additive_inverse_collapses() {
        let x = Real::sqrt(Real::integer(2));
        let sum = Real::add(x.clone(), Real::negate(x));
        assert!(matches!(sum.kind(), Kind::Zero));
    }

    #[test]
    fn test_zero_absorbs_multiplication() {
        let x = Real::pi_node();
        assert!(matches!(
            Real::mul(Real::zero(), x.clone()).kind(),
            Kind::Zero
        ));
        assert!(matches!(Real::mul(x, Real::zero()).kind(), Kind::Zero));
    }

    #[test]
    fn test_double_reciprocal_unwraps() {
        let x = Real::integer(5);
        let id = x.id();
        assert_eq!(Real::inverse(Real::inverse(x)).id(), id);
    }

    #[test]
    fn test_negated_literal_folds() {
        let n = Real::negate(Real::integer(9));
        match n.kind() {
            Kind::Int(k) => assert_eq!(*k, BigInt::from(-9)),
            _ => panic!("expected folded literal"),
        }
    }

    #[test]
    fn test_inverse_of_zero_is_sentinel() {
        assert!(matches!(
            Real::inverse(Real::zero()).kind(),
            Kind::DivByZero
        ));
    }

    #[test]
    fn test_int_pow_lowering() {
        let x = Real::integer(3);
        assert!(matches!(
            Real::int_pow(x.clone(), 0).kind(),
            Kind::Int(_)
        ));
        assert!(matches!(
            Real::int_pow(x.clone(), -2).kind(),
            Kind::IntPow(base, 2) if matches!(base.kind(), Kind::Inv(_))
        ));
    }
}
