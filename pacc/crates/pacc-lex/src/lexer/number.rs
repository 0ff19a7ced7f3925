//! Numeric literal lexing.
//!
//! A literal is one run of digits with at most one decimal point and one
//! exponent, `'` digit separators only between digits, and a greedy
//! alphanumeric suffix that is stored without interpretation (`42ULL`
//! keeps its text; type inference happens much later, if at all).

use crate::chars::{is_numeric, is_special, is_whitespace};
use crate::token::{Token, TokenKind};
use crate::{LexError, Lexer};

impl Lexer {
    /// Lex one numeric literal into `token`.
    ///
    /// Returns true when the terminating character must start the next
    /// token (a suffix run stopped at a special character).
    pub(crate) fn lex_number(&mut self, token: &mut Token) -> Result<bool, LexError> {
        token.kind = TokenKind::LiteralNumber;

        let mut parsed_dot = false;
        let mut parsed_exponent = false;
        let mut parsed_exponent_sign = false;
        let mut num_exponent_digits = 0usize;
        let mut took_suffix = false;

        while self.cursor.remaining() {
            let c = self.cursor.current_char();

            if is_numeric(c) {
                token.text.push(c);
                self.cursor.advance()?;
                if parsed_exponent {
                    num_exponent_digits += 1;
                }
            } else if (c == '-' || c == '+') && parsed_exponent {
                if parsed_exponent_sign {
                    return Err(LexError::DuplicateExponentSign {
                        loc: self.cursor.loc(),
                    });
                }
                parsed_exponent_sign = true;

                token.text.push(c);
                self.cursor.advance()?;
                num_exponent_digits += 1;
            } else if c == '.' {
                if parsed_dot {
                    return Err(LexError::DuplicateDot {
                        loc: self.cursor.loc(),
                    });
                }
                parsed_dot = true;

                token.text.push(c);
                self.cursor.advance()?;
                if parsed_exponent {
                    num_exponent_digits += 1;
                }
            } else if c == 'e' || c == 'E' {
                if parsed_exponent {
                    return Err(LexError::DuplicateExponent {
                        loc: self.cursor.loc(),
                    });
                }
                parsed_exponent = true;

                token.text.push(c);
                self.cursor.advance()?;
            } else if c == '\'' {
                if !(self.cursor.has_ahead(1) && is_numeric(self.cursor.peek_char(1))) {
                    return Err(LexError::SeparatorAtEnd {
                        loc: self.cursor.loc(),
                    });
                }
                if parsed_exponent && num_exponent_digits == 0 {
                    return Err(LexError::SeparatorAtStart {
                        loc: self.cursor.loc(),
                    });
                }

                token.text.push(c);
                self.cursor.advance()?;
            } else {
                // suffix: everything up to the next special or whitespace
                while self.cursor.remaining() {
                    let s = self.cursor.current_char();
                    if is_special(s) || is_whitespace(s) {
                        break;
                    }
                    token.text.push(s);
                    self.cursor.advance()?;
                }

                took_suffix = true;
                break;
            }
        }

        if parsed_exponent && num_exponent_digits == 0 {
            return Err(LexError::EmptyExponent {
                loc: self.cursor.loc(),
            });
        }

        Ok(took_suffix)
    }
}

#[cfg(test)]
mod tests {
    use crate::token::TokenKind;
    use crate::{tokenize, LexError};

    fn lex_one(src: &str) -> (TokenKind, String) {
        let toks = tokenize("num.c", src).unwrap();
        (toks[0].kind, toks[0].text.clone())
    }

    #[test]
    fn test_integer() {
        assert_eq!(lex_one("123"), (TokenKind::LiteralNumber, "123".into()));
    }

    #[test]
    fn test_float_with_exponent() {
        assert_eq!(
            lex_one("1.5e-3 "),
            (TokenKind::LiteralNumber, "1.5e-3".into())
        );
    }

    #[test]
    fn test_leading_dot() {
        assert_eq!(lex_one(".25"), (TokenKind::LiteralNumber, ".25".into()));
    }

    #[test]
    fn test_suffix_kept_as_text() {
        assert_eq!(lex_one("42ULL;"), (TokenKind::LiteralNumber, "42ULL".into()));
        assert_eq!(lex_one("1.0f)"), (TokenKind::LiteralNumber, "1.0f".into()));
    }

    #[test]
    fn test_digit_separator() {
        assert_eq!(
            lex_one("1'000'000"),
            (TokenKind::LiteralNumber, "1'000'000".into())
        );
    }

    #[test]
    fn test_separator_at_end_is_fatal() {
        assert!(matches!(
            tokenize("num.c", "100' "),
            Err(LexError::SeparatorAtEnd { .. })
        ));
    }

    #[test]
    fn test_duplicate_dot_is_fatal() {
        assert!(matches!(
            tokenize("num.c", "1.2.3"),
            Err(LexError::DuplicateDot { .. })
        ));
    }

    #[test]
    fn test_duplicate_exponent_is_fatal() {
        assert!(matches!(
            tokenize("num.c", "1e2e3"),
            Err(LexError::DuplicateExponent { .. })
        ));
    }

    #[test]
    fn test_empty_exponent_is_fatal() {
        assert!(matches!(
            tokenize("num.c", "1e;"),
            Err(LexError::EmptyExponent { .. })
        ));
    }
}
