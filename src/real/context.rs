//! Evaluation settings: cancellation, division limit, shared constants
//!
//! An [`EvalContext`] is threaded by reference through every `eval` and
//! `msd` call. It carries the cooperative cancellation token, the
//! division limit, the multithreading flag and the factory of shared
//! constants (pi, e, 1/e).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::core::error::RealError;
use crate::real::constants::Constants;

/// Division limit used when none is configured: a denominator whose
/// magnitude cannot be shown to exceed `2^DEFAULT_DIVISION_LIMIT` is
/// treated as zero.
pub const DEFAULT_DIVISION_LIMIT: i64 = -16384;

/// Coarsest division limit the API accepts; configured values are
/// clamped down to this.
pub const MAX_DIVISION_LIMIT: i64 = -1024;

struct CancelState {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// Cooperative cancellation token.
///
/// Every evaluation entry point and every iterative kernel polls the
/// token; a fired token surfaces as [`RealError::Cancelled`]. Caches are
/// only written on successful kernel completion, so a cancelled
/// evaluation leaves the graph in a clean state.
#[derive(Clone)]
pub struct CancelToken(Arc<CancelState>);

impl CancelToken {
    /// A token that never fires on its own.
    pub fn never() -> Self {
        CancelToken(Arc::new(CancelState {
            cancelled: AtomicBool::new(false),
            deadline: None,
        }))
    }

    /// A token that fires once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        CancelToken(Arc::new(CancelState {
            cancelled: AtomicBool::new(false),
            deadline: Some(Instant::now() + timeout),
        }))
    }

    /// Request cancellation manually.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether the token has fired (manually or by deadline).
    pub fn is_cancelled(&self) -> bool {
        if self.0.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        match self.0.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Fail with `Cancelled` if the token has fired.
    pub fn check(&self) -> Result<(), RealError> {
        if self.is_cancelled() {
            Err(RealError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        CancelToken::never()
    }
}

/// The settings record threaded through an evaluation.
#[derive(Clone)]
pub struct EvalContext {
    division_limit: i64,
    parallel: bool,
    cancel: CancelToken,
    constants: Arc<Constants>,
}

impl EvalContext {
    /// A context with default settings and a fresh constants factory.
    pub fn new() -> Self {
        EvalContext::with_constants(Arc::new(Constants::new()))
    }

    /// A context sharing an existing constants factory, so cached
    /// approximations of pi, e and 1/e survive across evaluations.
    pub fn with_constants(constants: Arc<Constants>) -> Self {
        EvalContext {
            division_limit: DEFAULT_DIVISION_LIMIT,
            parallel: false,
            cancel: CancelToken::never(),
            constants,
        }
    }

    /// Replace the division limit (clamped to [`MAX_DIVISION_LIMIT`] and
    /// to the safe precision range).
    pub fn with_division_limit(mut self, limit: i64) -> Self {
        self.division_limit = limit.clamp(crate::core::approx::MIN_PRECISION, MAX_DIVISION_LIMIT);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Enable or disable concurrent evaluation of independent operands.
    /// Has no effect unless the crate is built with the `parallel`
    /// feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Binary precision below which a denominator is deemed zero.
    pub fn division_limit(&self) -> i64 {
        self.division_limit
    }

    /// The shared constants factory.
    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// The cancellation token attached to this evaluation.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Poll the cancellation token.
    pub fn check_cancelled(&self) -> Result<(), RealError> {
        self.cancel.check()
    }

    /// Run two closures and pair their results, flattening an error pair
    /// to its first failure. With the `parallel` feature and the
    /// multithreading flag on, the closures run concurrently.
    #[cfg(feature = "parallel")]
    pub(crate) fn join<A, B>(
        &self,
        fa: impl FnOnce() -> Result<A, RealError> + Send,
        fb: impl FnOnce() -> Result<B, RealError> + Send,
    ) -> Result<(A, B), RealError>
    where
        A: Send,
        B: Send,
    {
        if self.parallel {
            let (ra, rb) = rayon::join(fa, fb);
            Ok((ra?, rb?))
        } else {
            Ok((fa()?, fb()?))
        }
    }

    #[cfg(not(feature = "parallel"))]
    pub(crate) fn join<A, B>(
        &self,
        fa: impl FnOnce() -> Result<A, RealError>,
        fb: impl FnOnce() -> Result<B, RealError>,
    ) -> Result<(A, B), RealError> {
        Ok((fa()?, fb()?))
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        EvalContext::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_cancel() {
        let token = CancelToken::never();
        assert!(token.check().is_ok());
        token.cancel();
        assert_eq!(token.check(), Err(RealError::Cancelled));
    }

    #[test]
    fn test_deadline_cancel() {
        let token = CancelToken::with_timeout(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(2));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_division_limit_clamp() {
        let ctx = EvalContext::new().with_division_limit(-4);
        assert_eq!(ctx.division_limit(), MAX_DIVISION_LIMIT);
        let ctx = EvalContext::new().with_division_limit(-50_000);
        assert_eq!(ctx.division_limit(), -50_000);
    }
}
