//! Decimal and hexadecimal rendering
//!
//! Rendering scales the value by `B^d` (a left shift for base 16, a
//! multiplication by `10^d` otherwise), evaluates the scaled node at
//! precision 0 and assembles the digit string around the fraction
//! point.

use num_bigint::{BigInt, Sign};

use crate::core::error::RealError;
use crate::real::Real;
use crate::real::context::EvalContext;

impl Real {
    /// Render with `digits` fractional decimal digits, rounded at the
    /// last shown digit.
    pub fn to_decimal(&self, digits: u32, ctx: &EvalContext) -> Result<String, RealError> {
        self.to_radix(digits, false, ctx)
    }

    /// Render with `digits` fractional digits in base 10, or base 16
    /// when `hex` is set.
    pub fn to_radix(&self, digits: u32, hex: bool, ctx: &EvalContext) -> Result<String, RealError> {
        let scaled = if hex {
            Real::shift(self.clone(), 4 * i64::from(digits))
        } else if digits == 0 {
            self.clone()
        } else {
            let scale = num_traits::pow(BigInt::from(10u32), digits as usize);
            Real::mul(self.clone(), Real::integer(scale))
        };
        let v = scaled.eval(0, ctx)?.value;

        let negative = v.sign() == Sign::Minus;
        let mut body = v.magnitude().to_str_radix(if hex { 16 } else { 10 });

        let frac = digits as usize;
        if body.len() <= frac {
            let padding = "0".repeat(frac - body.len());
            body = format!("0.{}{}", padding, body);
        } else if frac > 0 {
            body.insert(body.len() - frac, '.');
        }
        if negative {
            body.insert(0, '-');
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EvalContext {
        EvalContext::new()
    }

    #[test]
    fn test_integer_rendering() {
        let x = Real::integer(42);
        assert_eq!(x.to_decimal(0, &ctx()), Ok("42".to_string()));
        assert_eq!(x.to_decimal(3, &ctx()), Ok("42.000".to_string()));
    }

    #[test]
    fn test_zero_rendering_pads_fraction() {
        let x = Real::zero();
        assert_eq!(x.to_decimal(0, &ctx()), Ok("0".to_string()));
        assert_eq!(x.to_decimal(4, &ctx()), Ok("0.0000".to_string()));
    }

    #[test]
    fn test_small_fraction_is_zero_padded() {
        let x = Real::inverse(Real::integer(1_000_000));
        assert_eq!(x.to_decimal(6, &ctx()), Ok("0.000001".to_string()));
        assert_eq!(x.to_decimal(8, &ctx()), Ok("0.00000100".to_string()));
    }

    #[test]
    fn test_negative_rendering() {
        let x = Real::negate(Real::inverse(Real::integer(2)));
        assert_eq!(x.to_decimal(1, &ctx()), Ok("-0.5".to_string()));
        assert_eq!(x.to_decimal(3, &ctx()), Ok("-0.500".to_string()));
    }

    #[test]
    fn test_hex_rendering() {
        let x = Real::integer(255);
        assert_eq!(x.to_radix(0, true, &ctx()), Ok("ff".to_string()));
        let half = Real::inverse(Real::integer(2));
        assert_eq!(half.to_radix(1, true, &ctx()), Ok("0.8".to_string()));
        assert_eq!(half.to_radix(4, true, &ctx()), Ok("0.8000".to_string()));
    }

    #[test]
    fn test_rounding_at_rendered_digit() {
        // 2/3 = 0.666... rounds up at the last shown digit.
        let x = Real::div(Real::integer(2), Real::integer(3));
        assert_eq!(x.to_decimal(3, &ctx()), Ok("0.667".to_string()));
    }
}
