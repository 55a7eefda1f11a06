#![forbid(unsafe_code)]
//! Arbitrary-Precision Computable Reals
//!
//! A computable real is represented by a procedure, not a number: given
//! a requested binary precision `p`, every node of the lazy expression
//! graph produces an integer `v` with `|x - v * 2^p| < 2^p`. Composing
//! such procedures gives exact constants, field arithmetic, roots,
//! exponentials, logarithms and trigonometry at any precision that fits
//! in memory.
//!
//! # Features
//! - Lazy DAG of immutable nodes with per-node approximation caches
//! - Newton and series kernels with argument reduction
//! - Most-significant-digit discovery with a configurable division limit
//! - Cooperative cancellation with optional timeouts
//! - Decimal and hexadecimal rendering to any digit count
//!
//! # Usage Examples
//!
//! ## One-shot evaluation
//! ```
//! use exact_reals::eval;
//! let result = eval("sqrt(2)", 10).unwrap();
//! assert_eq!(result, "1.4142135624");
//! ```
//!
//! ## Configured evaluation
//! ```
//! use exact_reals::Evaluator;
//! let ev = Evaluator::new().digits(6).timeout_ms(30_000);
//! assert_eq!(ev.eval_str("1/1000000").unwrap(), "0.000001");
//! ```
//!
//! ## Building graphs directly
//! ```
//! use exact_reals::{EvalContext, Real};
//! let ctx = EvalContext::new();
//! let root = Real::sqrt(Real::integer(2));
//! let square = Real::mul(root.clone(), root);
//! assert_eq!(square.to_decimal(4, &ctx).unwrap(), "2.0000");
//! ```

mod api;
mod core;
mod parser;
mod real;

#[cfg(test)]
mod tests;

// Re-export the public surface at the crate root.
pub use api::{DEFAULT_DIGITS, Evaluator};
pub use crate::core::approx::{Approximation, MAX_PRECISION, MIN_PRECISION, verify_precision};
pub use crate::core::error::{RealError, Span};
pub use parser::parse;
pub use real::Real;
pub use real::constants::Constants;
pub use real::context::{
    CancelToken, DEFAULT_DIVISION_LIMIT, EvalContext, MAX_DIVISION_LIMIT,
};

/// Evaluate a formula to a decimal string with the given number of
/// fractional digits.
///
/// # Arguments
/// * `formula` - Expression to evaluate (e.g. "exp(2) + sin(1/2)")
/// * `digits` - Fractional decimal digits to display
///
/// # Returns
/// The rendered decimal value, or an error if parsing or evaluation
/// fails.
///
/// # Example
/// ```
/// use exact_reals::eval;
/// assert_eq!(eval("2^10", 0).unwrap(), "1024");
/// assert!(eval("1/0", 8).is_err());
/// ```
///
/// # Note
/// For timeouts, division limits or repeated evaluations sharing one
/// constants cache, use the [`Evaluator`] builder.
pub fn eval(formula: &str, digits: u32) -> Result<String, RealError> {
    Evaluator::new().digits(digits).eval_str(formula)
}
