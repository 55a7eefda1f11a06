//! Single-pass tokenizer for the calculator grammar

use crate::core::error::{RealError, Span};
use crate::parser::tokens::{Token, TokenKind};

/// Tokenize an input line. Identifiers come out lower-cased; the
/// radical glyph is accepted as a spelling of `sqrt`.
pub(crate) fn lex(input: &str) -> Result<Vec<Token>, RealError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::new(TokenKind::LParen, Span::at(pos)));
                chars.next();
            }
            ')' => {
                tokens.push(Token::new(TokenKind::RParen, Span::at(pos)));
                chars.next();
            }
            ',' => {
                tokens.push(Token::new(TokenKind::Comma, Span::at(pos)));
                chars.next();
            }
            '+' => {
                tokens.push(Token::new(TokenKind::Plus, Span::at(pos)));
                chars.next();
            }
            '-' => {
                tokens.push(Token::new(TokenKind::Minus, Span::at(pos)));
                chars.next();
            }
            '*' => {
                tokens.push(Token::new(TokenKind::Star, Span::at(pos)));
                chars.next();
            }
            '/' => {
                tokens.push(Token::new(TokenKind::Slash, Span::at(pos)));
                chars.next();
            }
            '^' => {
                tokens.push(Token::new(TokenKind::Caret, Span::at(pos)));
                chars.next();
            }
            '√' => {
                tokens.push(Token::new(
                    TokenKind::Ident("sqrt".to_string()),
                    Span::new(pos, pos + ch.len_utf8()),
                ));
                chars.next();
            }
            '0'..='9' => {
                tokens.push(scan_number(&mut chars, pos)?);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                let mut end = pos;
                while let Some(&(p, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.extend(c.to_lowercase());
                        end = p + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::new(TokenKind::Ident(name), Span::new(pos, end)));
            }
            _ => {
                return Err(RealError::syntax_at(
                    format!("unexpected character '{}'", ch),
                    Span::at(pos),
                ));
            }
        }
    }
    Ok(tokens)
}

/// Scan `digit+ ['.' digit*] [('e'|'E') ['+'|'-'] digit+]`.
fn scan_number(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<Token, RealError> {
    let mut digits = String::new();
    let mut frac = String::new();
    let mut end = start;

    while let Some(&(p, c)) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            end = p + 1;
            chars.next();
        } else {
            break;
        }
    }

    if let Some(&(p, '.')) = chars.peek() {
        end = p + 1;
        chars.next();
        while let Some(&(p, c)) = chars.peek() {
            if c.is_ascii_digit() {
                frac.push(c);
                end = p + 1;
                chars.next();
            } else {
                break;
            }
        }
    }

    let mut exp: i64 = 0;
    if let Some(&(_, c)) = chars.peek() {
        if c == 'e' || c == 'E' {
            chars.next();
            let mut exp_text = String::new();
            if let Some(&(_, sign)) = chars.peek() {
                if sign == '+' || sign == '-' {
                    exp_text.push(sign);
                    chars.next();
                }
            }
            let mut saw_digit = false;
            while let Some(&(p, c)) = chars.peek() {
                if c.is_ascii_digit() {
                    exp_text.push(c);
                    saw_digit = true;
                    end = p + 1;
                    chars.next();
                } else {
                    break;
                }
            }
            if !saw_digit {
                return Err(RealError::InvalidNumber {
                    value: format!("{}e{}", digits, exp_text),
                    span: Some(Span::new(start, end)),
                });
            }
            exp = exp_text.parse().map_err(|_| RealError::InvalidNumber {
                value: exp_text.clone(),
                span: Some(Span::new(start, end)),
            })?;
        }
    }

    Ok(Token::new(
        TokenKind::Number { digits, frac, exp },
        Span::new(start, end),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_expression() {
        let tokens = lex("1 + 2*sin(x)").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.describe()).collect();
        assert_eq!(kinds, vec!["1", "+", "2", "*", "sin", "(", "x", ")"]);
    }

    #[test]
    fn test_lex_lowercases_identifiers() {
        let tokens = lex("COS(PI)").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("cos".to_string()));
        assert_eq!(tokens[2].kind, TokenKind::Ident("pi".to_string()));
    }

    #[test]
    fn test_lex_radical_glyph() {
        let tokens = lex("√(2)").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("sqrt".to_string()));
    }

    #[test]
    fn test_lex_float_forms() {
        match &lex("2.5e-3").unwrap()[0].kind {
            TokenKind::Number { digits, frac, exp } => {
                assert_eq!(digits, "2");
                assert_eq!(frac, "5");
                assert_eq!(*exp, -3);
            }
            other => panic!("unexpected token {:?}", other),
        }
        match &lex("10.").unwrap()[0].kind {
            TokenKind::Number { digits, frac, .. } => {
                assert_eq!(digits, "10");
                assert_eq!(frac, "");
            }
            other => panic!("unexpected token {:?}", other),
        }
    }

    #[test]
    fn test_lex_rejects_garbage() {
        assert!(matches!(lex("1 # 2"), Err(RealError::Syntax { .. })));
        assert!(matches!(
            lex("1e+"),
            Err(RealError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_number_spans() {
        let tokens = lex("  123").unwrap();
        assert_eq!(tokens[0].span.start(), 2);
        assert_eq!(tokens[0].span.end(), 5);
    }
}
