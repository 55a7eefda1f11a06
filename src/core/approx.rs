//! Approximation algebra: scaled-integer values and shift/round primitives
//!
//! Every quantity the engine manipulates is an integer `value` scaled by
//! `2^precision`, chosen so the represented real lies within
//! `value * 2^precision +/- 2^precision`. More negative precisions mean
//! more fractional bits.

use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};

use crate::core::error::RealError;

/// Largest precision magnitude the engine accepts. The bound keeps
/// `8 * precision` comfortably inside `i64` arithmetic everywhere
/// precisions are combined.
pub const MAX_PRECISION: i64 = 1 << 28;
/// Most fractional precision the engine accepts.
pub const MIN_PRECISION: i64 = -(1 << 28);

/// Reject precisions outside the safe range.
#[inline]
pub fn verify_precision(p: i64) -> Result<(), RealError> {
    if (MIN_PRECISION..=MAX_PRECISION).contains(&p) {
        Ok(())
    } else {
        Err(RealError::PrecisionOverflow)
    }
}

/// Arithmetic shift without rounding: `n < 0` shifts right (dropping
/// bits, rounding toward negative infinity), `n >= 0` shifts left.
pub fn shift_no_round(k: &BigInt, n: i64) -> BigInt {
    if n >= 0 {
        k << (n as u64)
    } else {
        k >> ((-n) as u64)
    }
}

/// Arithmetic shift with round-half-up, symmetric for both signs.
///
/// The bias is added before the final halving, so e.g. `3 >> 1` rounds
/// to `2` and `-3 >> 1` rounds to `-1`.
pub fn shift_rounded(k: &BigInt, n: i64) -> BigInt {
    if n >= 0 {
        k << (n as u64)
    } else if n == -1 {
        (k + BigInt::one()) >> 1u64
    } else {
        ((k >> ((-(n + 1)) as u64)) + BigInt::one()) >> 1u64
    }
}

/// Integer division rounded to nearest, ties away from zero.
pub fn div_rounded(n: &BigInt, d: &BigInt) -> BigInt {
    let two_n = n << 1u64;
    let biased = if (n.sign() == Sign::Minus) == (d.sign() == Sign::Minus) {
        two_n + d
    } else {
        two_n - d
    };
    biased / (d << 1u64)
}

/// A scaled-integer approximation of a real number.
///
/// The represented real `x` satisfies `|x - value * 2^precision| <
/// 2^precision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approximation {
    /// The integer approximation, `round(x * 2^-precision)`.
    pub value: BigInt,
    /// The binary scale of `value`.
    pub precision: i64,
}

impl Approximation {
    /// Wrap a value at a given precision.
    pub fn new(value: BigInt, precision: i64) -> Self {
        Approximation { value, precision }
    }

    /// The zero approximation at a given precision.
    pub fn zero(precision: i64) -> Self {
        Approximation {
            value: BigInt::zero(),
            precision,
        }
    }

    /// Most-significant-bit position implied by this approximation, or
    /// `None` for a zero value.
    ///
    /// For nonzero `value` the position is
    /// `precision + bitlen(|value|) - 1`.
    pub fn msd(&self) -> Option<i64> {
        if self.value.is_zero() {
            None
        } else {
            Some(self.precision + self.value.bits() as i64 - 1)
        }
    }

    /// Most-significant-bit position, but only when the value itself is
    /// evidence of magnitude. A value of +/-1 sits on the rounding
    /// boundary and proves nothing about the real it approximates.
    pub fn definite_msd(&self) -> Option<i64> {
        if self.value.bits() <= 1 {
            None
        } else {
            self.msd()
        }
    }

    /// Re-express this approximation at a coarser (or equal) precision.
    ///
    /// Requires `self.precision <= p`; rounding error stays below one
    /// unit in the last place of the result.
    pub fn to_precision(&self, p: i64) -> Approximation {
        debug_assert!(self.precision <= p);
        Approximation {
            value: shift_rounded(&self.value, self.precision - p),
            precision: p,
        }
    }
}
