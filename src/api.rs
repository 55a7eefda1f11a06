//! User-facing builder: parse, configure and evaluate expressions

use std::sync::Arc;
use std::time::Duration;

use crate::core::error::RealError;
use crate::parser;
use crate::real::Real;
use crate::real::constants::Constants;
use crate::real::context::{CancelToken, DEFAULT_DIVISION_LIMIT, EvalContext, MAX_DIVISION_LIMIT};

/// Default number of fractional digits shown by [`Evaluator::eval_str`].
pub const DEFAULT_DIGITS: u32 = 64;

/// Configurable front end over the evaluation engine.
///
/// An `Evaluator` owns the constants factory, so every expression
/// evaluated through it shares the cached approximations of pi, e and
/// 1/e. Each call gets a fresh cancellation token derived from the
/// configured timeout.
///
/// # Example
/// ```
/// use exact_reals::Evaluator;
/// let result = Evaluator::new().digits(10).eval_str("sqrt(2)").unwrap();
/// assert_eq!(result, "1.4142135624");
/// ```
#[derive(Clone)]
pub struct Evaluator {
    digits: u32,
    timeout_ms: i64,
    division_limit: i64,
    multithreaded: bool,
    constants: Arc<Constants>,
}

impl Evaluator {
    /// An evaluator with 64 display digits, no timeout and the default
    /// division limit.
    pub fn new() -> Self {
        Evaluator {
            digits: DEFAULT_DIGITS,
            timeout_ms: -1,
            division_limit: DEFAULT_DIVISION_LIMIT,
            multithreaded: false,
            constants: Arc::new(Constants::new()),
        }
    }

    /// Number of fractional decimal digits to display.
    pub fn digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Evaluation timeout in milliseconds; any negative value means
    /// "never cancel".
    pub fn timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Binary precision below which a denominator is deemed zero
    /// (clamped to [`MAX_DIVISION_LIMIT`]).
    pub fn division_limit(mut self, limit: i64) -> Self {
        self.division_limit = limit.min(MAX_DIVISION_LIMIT);
        self
    }

    /// Evaluate independent operands concurrently (requires the
    /// `parallel` feature to take effect).
    pub fn multithreaded(mut self, on: bool) -> Self {
        self.multithreaded = on;
        self
    }

    /// Currently configured display digits.
    pub fn current_digits(&self) -> u32 {
        self.digits
    }

    /// The shared constants factory.
    pub fn constants(&self) -> &Arc<Constants> {
        &self.constants
    }

    /// Parse an expression into a lazy [`Real`] graph without
    /// evaluating it.
    pub fn parse(&self, input: &str) -> Result<Real, RealError> {
        parser::parse(input, &self.constants)
    }

    /// A fresh evaluation context carrying this evaluator's settings
    /// and a new cancellation token.
    pub fn context(&self) -> EvalContext {
        let cancel = if self.timeout_ms < 0 {
            CancelToken::never()
        } else {
            CancelToken::with_timeout(Duration::from_millis(self.timeout_ms as u64))
        };
        EvalContext::with_constants(Arc::clone(&self.constants))
            .with_division_limit(self.division_limit)
            .with_parallel(self.multithreaded)
            .with_cancel(cancel)
    }

    /// Parse and render in one step.
    pub fn eval_str(&self, input: &str) -> Result<String, RealError> {
        let expr = self.parse(input)?;
        expr.to_decimal(self.digits, &self.context())
    }

    /// Render an already parsed expression with this evaluator's
    /// settings.
    pub fn render(&self, expr: &Real) -> Result<String, RealError> {
        expr.to_decimal(self.digits, &self.context())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_str_defaults() {
        let result = Evaluator::new().digits(4).eval_str("1/4").unwrap();
        assert_eq!(result, "0.2500");
    }

    #[test]
    fn test_constants_are_shared_between_calls() {
        let ev = Evaluator::new().digits(8);
        let pi1 = ev.parse("pi").unwrap();
        let pi2 = ev.parse("pi").unwrap();
        assert_eq!(pi1.id(), pi2.id());
    }

    #[test]
    fn test_timeout_surfaces_cancelled() {
        let ev = Evaluator::new().digits(10_000).timeout_ms(0);
        assert_eq!(ev.eval_str("exp(100000)"), Err(RealError::Cancelled));
    }

    #[test]
    fn test_render_parsed_expression() {
        let ev = Evaluator::new().digits(2);
        let expr = ev.parse("3/4 + 1/4").unwrap();
        assert_eq!(ev.render(&expr), Ok("1.00".to_string()));
    }
}
