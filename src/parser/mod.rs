//! Recursive-descent parser for the calculator grammar
//!
//! ```text
//! expression := ['+' | '-'] term { ('+' | '-') term }
//! term       := factor { ('*' | '/') factor }
//! factor     := atom [ '^' factor ]
//! atom       := number | identifier ['(' args ')'] | '(' expression ')'
//! args       := expression { ',' expression }
//! ```
//!
//! Identifiers are case-insensitive; `√` is accepted as `sqrt`. A float
//! literal lowers exactly to `mantissa * 10^(exp - frac_len)`; the `^`
//! operator lowers to an integer power when its right-hand side is an
//! integer literal and to `exp(y * ln(x))` otherwise.

mod lexer;
mod tokens;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::core::error::{RealError, Span};
use crate::parser::tokens::{Token, TokenKind};
use crate::real::Real;
use crate::real::constants::Constants;

/// Parse an expression into a lazy [`Real`] graph.
///
/// The constants factory supplies the shared pi and e nodes, so graphs
/// parsed through the same factory reuse one approximation cache per
/// constant.
pub fn parse(input: &str, consts: &Constants) -> Result<Real, RealError> {
    if input.trim().is_empty() {
        return Err(RealError::EmptyInput);
    }
    let tokens = lexer::lex(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        consts,
    };
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    consts: &'a Constants,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), RealError> {
        if self.eat(kind) {
            Ok(())
        } else {
            match self.peek() {
                Some(token) => Err(RealError::syntax_at(
                    format!("expected {}, found '{}'", what, token.describe()),
                    token.span,
                )),
                None => Err(RealError::syntax(format!(
                    "expected {}, found end of input",
                    what
                ))),
            }
        }
    }

    fn expect_end(&mut self) -> Result<(), RealError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(RealError::syntax_at(
                format!("unexpected trailing '{}'", token.describe()),
                token.span,
            )),
        }
    }

    fn expression(&mut self) -> Result<Real, RealError> {
        let leading_minus = if self.eat(&TokenKind::Minus) {
            true
        } else {
            self.eat(&TokenKind::Plus);
            false
        };
        let mut acc = self.term()?;
        if leading_minus {
            acc = Real::negate(acc);
        }
        loop {
            if self.eat(&TokenKind::Plus) {
                let rhs = self.term()?;
                acc = Real::add(acc, rhs);
            } else if self.eat(&TokenKind::Minus) {
                let rhs = self.term()?;
                acc = Real::sub(acc, rhs);
            } else {
                break;
            }
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Real, RealError> {
        let mut acc = self.factor()?;
        loop {
            if self.eat(&TokenKind::Star) {
                let rhs = self.factor()?;
                acc = Real::mul(acc, rhs);
            } else if self.eat(&TokenKind::Slash) {
                let rhs = self.factor()?;
                acc = Real::div(acc, rhs);
            } else {
                break;
            }
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<Real, RealError> {
        let base = self.atom()?;
        if !self.eat(&TokenKind::Caret) {
            return Ok(base);
        }
        let exponent = self.factor()?;
        if let crate::real::Kind::Int(k) = exponent.kind() {
            let n = k.to_i64().ok_or(RealError::Overflow)?;
            return Ok(Real::int_pow(base, n));
        }
        Ok(self.consts.pow(base, exponent))
    }

    fn atom(&mut self) -> Result<Real, RealError> {
        let token = match self.advance() {
            Some(token) => token,
            None => return Err(RealError::syntax("unexpected end of input")),
        };
        match token.kind {
            TokenKind::Number {
                ref digits,
                ref frac,
                exp,
                ..
            } => lower_literal(digits, frac, exp, token.span),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(ref name) => {
                if self.eat(&TokenKind::LParen) {
                    let mut args = vec![self.expression()?];
                    while self.eat(&TokenKind::Comma) {
                        args.push(self.expression()?);
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                    self.apply(name, args, token.span)
                } else {
                    match name.as_str() {
                        "pi" => Ok(self.consts.pi()),
                        "e" => Ok(self.consts.e()),
                        _ => Err(RealError::UnknownIdentifier {
                            name: name.clone(),
                            span: Some(token.span),
                        }),
                    }
                }
            }
            _ => Err(RealError::syntax_at(
                format!("unexpected '{}'", token.describe()),
                token.span,
            )),
        }
    }

    fn apply(&self, name: &str, args: Vec<Real>, span: Span) -> Result<Real, RealError> {
        let arity = if name == "pow" { 2 } else { 1 };
        if args.len() != arity {
            return Err(RealError::WrongArgCount {
                name: name.to_string(),
                expected: arity,
                got: args.len(),
            });
        }
        let mut args = args.into_iter();
        let first = args.next().unwrap_or_else(Real::zero);
        Ok(match name {
            "abs" => Real::abs(first),
            "sqrt" => Real::sqrt(first),
            "exp" => Real::exp(first),
            "ln" => Real::ln(first),
            "sin" => Real::sin(first),
            "cos" => self.consts.cos(first),
            "tan" => self.consts.tan(first),
            "asin" => Real::asin(first),
            "acos" => self.consts.acos(first),
            "atan" => Real::atan(first),
            "pow" => {
                let second = args.next().unwrap_or_else(Real::zero);
                self.consts.pow(first, second)
            }
            _ => {
                return Err(RealError::UnknownIdentifier {
                    name: name.to_string(),
                    span: Some(span),
                });
            }
        })
    }
}

/// Lower a numeric literal to `mantissa * 10^(exp - frac_len)`, with the
/// fraction digits folded into the mantissa.
fn lower_literal(digits: &str, frac: &str, exp: i64, span: Span) -> Result<Real, RealError> {
    let text = format!("{}{}", digits, frac);
    let mantissa: BigInt = text.parse().map_err(|_| RealError::InvalidNumber {
        value: format!("{}.{}", digits, frac),
        span: Some(span),
    })?;
    let scale = exp - frac.len() as i64;
    if scale == 0 {
        return Ok(Real::integer(mantissa));
    }
    Ok(Real::mul(
        Real::integer(mantissa),
        Real::int_pow(Real::integer(10), scale),
    ))
}
