//! String and character literal lexing.
//!
//! Both literal forms share one routine parameterized by delimiter. The
//! token text keeps its delimiters; escape sequences are decoded in place,
//! so the later string-concatenation phase can splice texts by trimming
//! one quote from each side.

use crate::token::{Token, TokenKind};
use crate::{LexError, Lexer};

impl Lexer {
    /// Try to lex a delimiter-terminated literal into `token`.
    ///
    /// Returns false without consuming anything when the cursor is not on
    /// `start` or a token is already in progress.
    pub(crate) fn lex_terminated_literal(
        &mut self,
        start: char,
        end: char,
        kind: TokenKind,
        token: &mut Token,
    ) -> Result<bool, LexError> {
        if !token.text.is_empty() {
            return Ok(false);
        }
        if self.cursor.current_char() != start {
            return Ok(false);
        }

        token.kind = kind;
        token.text.push(start);
        self.cursor.advance()?;

        let mut closed = false;
        while self.cursor.remaining() {
            let c = self.cursor.current_char();

            if c == '\\' {
                self.cursor.advance()?;
                let escape = self.cursor.current_char();
                match escape {
                    'n' => token.text.push('\n'),
                    '0' => token.text.push('\0'),
                    '"' => token.text.push('"'),
                    '\'' => token.text.push('\''),
                    '\\' => token.text.push('\\'),
                    other => {
                        return Err(LexError::UnknownEscape {
                            loc: self.cursor.loc(),
                            escape: other,
                        })
                    }
                }
                self.cursor.advance()?;
                continue;
            } else if c == '\n' {
                return Err(LexError::UnterminatedLiteral {
                    loc: self.cursor.loc(),
                    delim: end,
                });
            }

            token.text.push(c);

            if c == end {
                self.cursor.advance()?;
                closed = true;
                break;
            }

            self.cursor.advance()?;
        }

        if !closed {
            return Err(LexError::UnterminatedLiteral {
                loc: self.cursor.loc(),
                delim: end,
            });
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::token::TokenKind;
    use crate::{tokenize, LexError};

    #[test]
    fn test_string_literal_keeps_quotes() {
        let toks = tokenize("s.c", "\"hello\"").unwrap();
        assert_eq!(toks[0].kind, TokenKind::LiteralString);
        assert_eq!(toks[0].text, "\"hello\"");
    }

    #[test]
    fn test_char_literal() {
        let toks = tokenize("s.c", "'a'").unwrap();
        assert_eq!(toks[0].kind, TokenKind::LiteralChar);
        assert_eq!(toks[0].text, "'a'");
    }

    #[test]
    fn test_escapes_are_decoded() {
        let toks = tokenize("s.c", r#""a\nb\\c\"d""#).unwrap();
        assert_eq!(toks[0].text, "\"a\nb\\c\"d\"");
    }

    #[test]
    fn test_nul_escape() {
        let toks = tokenize("s.c", r"'\0'").unwrap();
        assert_eq!(toks[0].text, "'\0'");
    }

    #[test]
    fn test_unknown_escape_is_fatal() {
        assert!(matches!(
            tokenize("s.c", r#""\q""#),
            Err(LexError::UnknownEscape { escape: 'q', .. })
        ));
    }

    #[test]
    fn test_newline_inside_literal_is_fatal() {
        assert!(matches!(
            tokenize("s.c", "\"abc\ndef\""),
            Err(LexError::UnterminatedLiteral { .. })
        ));
    }

    #[test]
    fn test_unterminated_at_eof_is_fatal() {
        assert!(matches!(
            tokenize("s.c", "\"abc"),
            Err(LexError::UnterminatedLiteral { .. })
        ));
    }

    #[test]
    fn test_string_adjacent_to_symbol() {
        let toks: Vec<_> = tokenize("s.c", "x\"y\"")
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(toks, vec!["x", "\"y\""]);
    }
}
