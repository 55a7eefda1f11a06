//! Randomized structural fuzzing against an exact integer model
//!
//! Expressions built from integers, negation, addition, multiplication
//! and left shifts stay integer-valued, so the one-ulp contract forces
//! `eval(0)` to reproduce the model value exactly.

use num_bigint::BigInt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::EvalContext;
use crate::real::Real;

fn random_exact_expr(rng: &mut StdRng, depth: u32) -> (Real, BigInt) {
    if depth == 0 || rng.gen_range(0..4) == 0 {
        let v = rng.gen_range(-1000i64..=1000);
        return (Real::integer(v), BigInt::from(v));
    }
    match rng.gen_range(0..5) {
        0 => {
            let (a, va) = random_exact_expr(rng, depth - 1);
            let (b, vb) = random_exact_expr(rng, depth - 1);
            (Real::add(a, b), va + vb)
        }
        1 => {
            let (a, va) = random_exact_expr(rng, depth - 1);
            let (b, vb) = random_exact_expr(rng, depth - 1);
            (Real::sub(a, b), va - vb)
        }
        2 => {
            let (a, va) = random_exact_expr(rng, depth - 1);
            let (b, vb) = random_exact_expr(rng, depth - 1);
            (Real::mul(a, b), va * vb)
        }
        3 => {
            let (a, va) = random_exact_expr(rng, depth - 1);
            (Real::negate(a), -va)
        }
        _ => {
            let (a, va) = random_exact_expr(rng, depth - 1);
            let n = rng.gen_range(0..=6u32);
            (Real::shift(a, i64::from(n)), va << n)
        }
    }
}

#[test]
fn test_random_integer_expressions_evaluate_exactly() {
    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    let ctx = EvalContext::new();
    for _ in 0..200 {
        let (expr, expected) = random_exact_expr(&mut rng, 4);
        let appr = expr.eval(0, &ctx).unwrap();
        assert_eq!(appr.value, expected, "mismatch for {}", expr);
        assert_eq!(appr.precision, 0);
    }
}

#[test]
fn test_random_expressions_respect_cache_monotonicity() {
    let mut rng = StdRng::seed_from_u64(7);
    let ctx = EvalContext::new();
    for _ in 0..50 {
        let (expr, expected) = random_exact_expr(&mut rng, 3);
        // Fine first, then coarse: the second answer must come out of
        // the cached fine entry by rounding.
        let fine = expr.eval(-16, &ctx).unwrap();
        let coarse = expr.eval(0, &ctx).unwrap();
        assert_eq!(fine.value, &expected << 16u32);
        assert_eq!(coarse.value, expected);
    }
}
