//! Conditional-expression evaluation for `#if`/`#elif`.
//!
//! A condition is prepared in three steps before evaluation:
//!
//! 1. `defined X` / `defined(X)` collapse to `1` or `0`
//! 2. macro expansion (done by the caller, it needs the whole table)
//! 3. every remaining token that is not a numeric/char literal or
//!    operator/punctuation becomes the literal `0`
//!
//! What is left is evaluated with integer semantics by a small
//! recursive-descent parser with conventional precedence bands and
//! left-to-right associativity.

use indexmap::IndexMap;

use pacc_lex::{Token, TokenKind};
use pacc_util::Cursor;

use crate::macros::Define;
use crate::{tokens_into_str, PreprocessError};

/// Execute the `defined` operator over a condition's tokens.
pub(crate) fn remove_defchecks(
    defines: &IndexMap<String, Define>,
    tokens: &[Token],
) -> Result<Vec<Token>, PreprocessError> {
    if !tokens.iter().any(|t| t.is("defined")) {
        return Ok(tokens.to_vec());
    }

    let malformed = |tok: &Token| PreprocessError::MalformedDirective {
        loc: tok.src_loc.clone(),
        directive: "if",
    };

    let mut ret = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let tok = &tokens[i];

        if tok.is("defined") {
            i += 1;
            let mut name = tokens.get(i).ok_or_else(|| malformed(tok))?;

            if name.is("(") {
                name = tokens.get(i + 1).ok_or_else(|| malformed(tok))?;
                let close = tokens.get(i + 2).ok_or_else(|| malformed(tok))?;
                if !close.is(")") {
                    return Err(malformed(tok));
                }
                i += 3;
            } else {
                i += 1;
            }

            let value = if defines.contains_key(&name.text) { "1" } else { "0" };
            ret.push(Token::synthesized(value, TokenKind::LiteralNumber));
            continue;
        }

        ret.push(tok.clone());
        i += 1;
    }

    Ok(ret)
}

/// Replace every token that cannot take part in integer evaluation by the
/// literal `0`; this is how unresolved identifiers read as false.
pub(crate) fn make_evalable(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .map(|tok| match tok.kind {
            TokenKind::LiteralChar | TokenKind::LiteralNumber | TokenKind::OperatorPunctuation => {
                tok.clone()
            }
            _ => Token::synthesized("0", TokenKind::LiteralNumber),
        })
        .collect()
}

/// Evaluate a fully prepared condition to an integer.
pub(crate) fn eval_condition(tokens: &[Token]) -> Result<i64, PreprocessError> {
    let mut cur = Cursor::new(tokens);
    let value = parse_expr(&mut cur, 0)?;

    if !cur.is_empty() {
        return Err(PreprocessError::LeftoverConditionTokens {
            text: tokens_into_str(&tokens[cur.index()..]),
        });
    }

    Ok(value)
}

fn binary_precedence(text: &str) -> Option<u8> {
    let prec = match text {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | "<=" | ">" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    };
    Some(prec)
}

fn parse_expr(cur: &mut Cursor<'_, Token>, min_prec: u8) -> Result<i64, PreprocessError> {
    let mut lhs = parse_prefix(cur)?;

    while let Some(tok) = cur.item() {
        let Some(prec) = binary_precedence(&tok.text) else {
            break;
        };
        if prec < min_prec {
            break;
        }

        let op = tok.text.clone();
        cur.bump();

        let rhs = parse_expr(cur, prec + 1)?;
        lhs = apply_binary(&op, lhs, rhs)?;
    }

    Ok(lhs)
}

fn parse_prefix(cur: &mut Cursor<'_, Token>) -> Result<i64, PreprocessError> {
    let tok = cur.item().ok_or_else(|| PreprocessError::BadExpression {
        message: "expected a value".to_string(),
    })?;

    if tok.is("!") {
        cur.bump();
        let value = parse_prefix(cur)?;
        return Ok((value == 0) as i64);
    }
    if tok.is("~") {
        cur.bump();
        return Ok(!parse_prefix(cur)?);
    }
    if tok.is("-") {
        cur.bump();
        return Ok(parse_prefix(cur)?.wrapping_neg());
    }
    if tok.is("+") {
        cur.bump();
        return parse_prefix(cur);
    }
    if tok.is("(") {
        cur.bump();
        let value = parse_expr(cur, 0)?;
        let close = cur.item().ok_or_else(|| PreprocessError::BadExpression {
            message: "expected ')'".to_string(),
        })?;
        if !close.is(")") {
            return Err(PreprocessError::BadExpression {
                message: format!("expected ')', got '{}'", close.text),
            });
        }
        cur.bump();
        return Ok(value);
    }

    match tok.kind {
        TokenKind::LiteralNumber => {
            let value = parse_integer(&tok.text)?;
            cur.bump();
            Ok(value)
        }
        TokenKind::LiteralChar => {
            // text is quoted with escapes already decoded: '<char>'
            let value = tok
                .text
                .chars()
                .nth(1)
                .ok_or_else(|| PreprocessError::BadExpression {
                    message: format!("empty char literal '{}'", tok.text),
                })?;
            cur.bump();
            Ok(value as i64)
        }
        _ => Err(PreprocessError::BadExpression {
            message: format!("unexpected token '{}'", tok.text),
        }),
    }
}

/// Parse an integer literal, tolerating `u`/`l` suffixes, `'` digit
/// separators and radix prefixes.
fn parse_integer(text: &str) -> Result<i64, PreprocessError> {
    let trimmed = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let digits: String = trimmed.chars().filter(|&c| c != '\'').collect();

    let (radix, digits) = if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        (2, rest)
    } else if let Some(rest) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        (8, rest)
    } else {
        (10, digits.as_str())
    };

    i64::from_str_radix(digits, radix).map_err(|_| PreprocessError::BadExpression {
        message: format!("invalid integer literal '{text}'"),
    })
}

fn apply_binary(op: &str, lhs: i64, rhs: i64) -> Result<i64, PreprocessError> {
    let value = match op {
        "||" => (lhs != 0 || rhs != 0) as i64,
        "&&" => (lhs != 0 && rhs != 0) as i64,
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => (lhs == rhs) as i64,
        "!=" => (lhs != rhs) as i64,
        "<" => (lhs < rhs) as i64,
        "<=" => (lhs <= rhs) as i64,
        ">" => (lhs > rhs) as i64,
        ">=" => (lhs >= rhs) as i64,
        "<<" | ">>" => {
            if !(0..64).contains(&rhs) {
                return Err(PreprocessError::BadExpression {
                    message: format!("shift amount {rhs} out of range"),
                });
            }
            if op == "<<" {
                lhs.wrapping_shl(rhs as u32)
            } else {
                lhs >> rhs
            }
        }
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "*" => lhs.wrapping_mul(rhs),
        "/" | "%" => {
            if rhs == 0 {
                return Err(PreprocessError::DivisionByZero);
            }
            if op == "/" {
                lhs / rhs
            } else {
                lhs % rhs
            }
        }
        _ => {
            return Err(PreprocessError::BadExpression {
                message: format!("unknown operator '{op}'"),
            })
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacc_lex::tokenize;

    fn eval(src: &str) -> Result<i64, PreprocessError> {
        let tokens: Vec<Token> = tokenize("e.c", src)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .collect();
        eval_condition(&make_evalable(&tokens))
    }

    #[test]
    fn test_literals_and_suffixes() {
        assert_eq!(eval("42").unwrap(), 42);
        assert_eq!(eval("202311L").unwrap(), 202311);
        assert_eq!(eval("0x10").unwrap(), 16);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9);
        assert_eq!(eval("1 << 2 | 1").unwrap(), 5);
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(eval("10 - 3 - 2").unwrap(), 5);
        assert_eq!(eval("16 / 4 / 2").unwrap(), 2);
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(eval("3 > 2").unwrap(), 1);
        assert_eq!(eval("3 <= 2").unwrap(), 0);
        assert_eq!(eval("1 && 0").unwrap(), 0);
        assert_eq!(eval("1 || 0").unwrap(), 1);
        assert_eq!(eval("2 == 2 && 3 != 4").unwrap(), 1);
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval("!0").unwrap(), 1);
        assert_eq!(eval("!5").unwrap(), 0);
        assert_eq!(eval("-3 + 5").unwrap(), 2);
        assert_eq!(eval("~0 + 1").unwrap(), 0);
    }

    #[test]
    fn test_char_literal_value() {
        assert_eq!(eval("'A'").unwrap(), 65);
    }

    #[test]
    fn test_symbols_neutralized_to_zero() {
        assert_eq!(eval("unknown_macro").unwrap(), 0);
        assert_eq!(eval("defined_elsewhere || 1").unwrap(), 1);
    }

    #[test]
    fn test_division_by_zero_is_fatal() {
        assert!(matches!(eval("1 / 0"), Err(PreprocessError::DivisionByZero)));
        assert!(matches!(eval("1 % 0"), Err(PreprocessError::DivisionByZero)));
    }

    #[test]
    fn test_leftover_tokens_are_fatal() {
        assert!(matches!(
            eval("1 2"),
            Err(PreprocessError::LeftoverConditionTokens { .. })
        ));
    }

    #[test]
    fn test_remove_defchecks() {
        let defines = {
            let mut map = IndexMap::new();
            map.insert("A".to_string(), Define::object("A", vec![]));
            map
        };
        let tokens: Vec<Token> = tokenize("e.c", "defined(A) + defined B")
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .collect();

        let replaced = remove_defchecks(&defines, &tokens).unwrap();
        let texts: Vec<&str> = replaced.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "+", "0"]);
    }
}
