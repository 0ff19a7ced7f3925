//! Core lexer implementation.
//!
//! The lexer accumulates one token at a time in a tight loop, dispatching
//! on the current character class. Specialized lexing for numbers,
//! terminated literals, comments and compound operators lives in the
//! sibling modules.

mod comment;
mod number;
mod operator;
mod string;

use crate::chars::{is_numeric, is_special, is_whitespace};
use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};
use crate::LexError;

/// Single-pass character-to-token converter.
pub struct Lexer {
    pub(crate) cursor: Cursor,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Create a lexer over in-memory source text.
    pub fn new(filename: &str, source: &str) -> Self {
        Self {
            cursor: Cursor::new(filename, source),
            tokens: Vec::new(),
        }
    }

    /// Convert the whole input into tokens.
    ///
    /// Whitespace and comments are included in the output; the first
    /// malformed token aborts with a [`LexError`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while self.cursor.remaining() {
            let mut token = Token::new(
                String::new(),
                TokenKind::Symbol,
                self.cursor.loc(),
                self.cursor.log_loc(),
            );

            // set when the terminating character must not be consumed by
            // the trailing advance below (it starts the next token)
            let mut skip_advance = false;

            while self.cursor.remaining() {
                let c = self.cursor.current_char();

                if is_whitespace(c) {
                    if token.text.is_empty() {
                        token.kind = TokenKind::Whitespace;
                    }
                    if token.kind == TokenKind::Whitespace {
                        token.text.push(c);
                        self.cursor.advance()?;
                        continue;
                    }
                    break;
                } else if token.kind == TokenKind::Whitespace {
                    skip_advance = true;
                    break;
                }

                // numeric literal: leading digit, or '.' followed by a digit
                let leading_numeric = token.text.is_empty() && is_numeric(c);
                let dot_numeric = c == '.'
                    && self.cursor.has_ahead(1)
                    && is_numeric(self.cursor.peek_char(1));
                if leading_numeric || dot_numeric {
                    // a trailing digit is a legal symbol character, so only
                    // a fresh token starts a number here
                    if dot_numeric && !token.text.is_empty() {
                        skip_advance = true;
                        break;
                    }

                    skip_advance = self.lex_number(&mut token)?;
                    break;
                }

                if self.lex_terminated_literal('\'', '\'', TokenKind::LiteralChar, &mut token)? {
                    skip_advance = true;
                    break;
                }

                if self.lex_terminated_literal('"', '"', TokenKind::LiteralString, &mut token)? {
                    skip_advance = true;
                    break;
                }

                if is_special(c) {
                    if !token.text.is_empty() {
                        skip_advance = true;
                        break;
                    }

                    if c == '/' && self.cursor.peek_char(1) == '/' {
                        self.lex_line_comment(&mut token)?;
                        break;
                    }

                    if c == '/' && self.cursor.peek_char(1) == '*' {
                        self.lex_block_comment(&mut token)?;
                        break;
                    }

                    if self.lex_compound_operator(&mut token)? {
                        break;
                    }

                    token.kind = TokenKind::OperatorPunctuation;
                    token.text.push(c);
                    break;
                }

                token.text.push(c);
                self.cursor.advance()?;
            }

            if !token.text.is_empty() {
                self.tokens.push(token);
            }

            if !skip_advance {
                self.cursor.advance()?;
            }
        }

        Ok(self.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn kinds_and_texts(src: &str) -> Vec<(TokenKind, String)> {
        tokenize("test.c", src)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_simple_declaration() {
        let toks = kinds_and_texts("int x = 42;");
        assert_eq!(
            toks,
            vec![
                (TokenKind::Symbol, "int".into()),
                (TokenKind::Symbol, "x".into()),
                (TokenKind::OperatorPunctuation, "=".into()),
                (TokenKind::LiteralNumber, "42".into()),
                (TokenKind::OperatorPunctuation, ";".into()),
            ]
        );
    }

    #[test]
    fn test_whitespace_tokens_are_retained() {
        // the first whitespace character after a token is consumed by the
        // token's trailing advance; the rest forms a whitespace token
        let toks = tokenize("test.c", "a  b").unwrap();
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[1].kind, TokenKind::Whitespace);
        assert_eq!(toks[1].text, " ");
    }

    #[test]
    fn test_identifier_with_digits_and_underscore() {
        let toks = kinds_and_texts("_foo1 bar_2");
        assert_eq!(toks[0], (TokenKind::Symbol, "_foo1".into()));
        assert_eq!(toks[1], (TokenKind::Symbol, "bar_2".into()));
    }

    #[test]
    fn test_dot_number_after_symbol_splits() {
        let toks = kinds_and_texts("x.5");
        // '.5' starts a fresh numeric token; 'x' keeps its own
        assert_eq!(toks[0], (TokenKind::Symbol, "x".into()));
        assert_eq!(toks[1], (TokenKind::LiteralNumber, ".5".into()));
    }

    #[test]
    fn test_src_loc_monotonic() {
        let toks = tokenize("test.c", "int main() { return 0; }\nint y;\n").unwrap();
        for pair in toks.windows(2) {
            assert!(pair[0].src_loc <= pair[1].src_loc);
        }
    }

    #[test]
    fn test_line_continuation_locations() {
        let toks: Vec<_> = tokenize("test.c", "#define A\\\n 1\n")
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .collect();

        let one = toks.iter().find(|t| t.text == "1").unwrap();
        // physically on line 1, logically still on line 0
        assert_eq!(one.src_loc.line, 1);
        assert_eq!(one.log_loc.line, 0);
    }

    #[test]
    fn test_logical_columns_contiguous_across_continuation() {
        // "ab\<nl>cd" lexes as the single symbol "abcd"
        let toks = kinds_and_texts("ab\\\ncd");
        assert_eq!(toks, vec![(TokenKind::Symbol, "abcd".into())]);
    }

    #[test]
    fn test_hash_is_operator_punctuation() {
        let toks = kinds_and_texts("#include");
        assert_eq!(toks[0], (TokenKind::OperatorPunctuation, "#".into()));
        assert_eq!(toks[1], (TokenKind::Symbol, "include".into()));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("test.c", "").unwrap().is_empty());
    }
}
