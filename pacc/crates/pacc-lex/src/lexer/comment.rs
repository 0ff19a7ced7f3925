//! Comment lexing.
//!
//! Comments are emitted as tokens so that downstream printers can
//! reproduce the source; the preprocessor's line grouper drops them.

use crate::token::{Token, TokenKind};
use crate::{LexError, Lexer};

impl Lexer {
    /// Lex a `//` comment up to (not including) the newline.
    pub(crate) fn lex_line_comment(&mut self, token: &mut Token) -> Result<(), LexError> {
        token.kind = TokenKind::Comment;

        while self.cursor.remaining() {
            if self.cursor.current_char() == '\n' {
                break;
            }
            token.text.push(self.cursor.current_char());
            self.cursor.advance()?;
        }

        Ok(())
    }

    /// Lex a `/* ... */` comment, terminator included.
    pub(crate) fn lex_block_comment(&mut self, token: &mut Token) -> Result<(), LexError> {
        token.kind = TokenKind::Comment;

        token.text.push(self.cursor.current_char());
        self.cursor.advance()?;

        while self.cursor.remaining() {
            token.text.push(self.cursor.current_char());

            if token.text.len() >= 4 && token.text.ends_with("*/") {
                break;
            }

            self.cursor.advance()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::token::TokenKind;
    use crate::tokenize;

    #[test]
    fn test_line_comment_excludes_newline() {
        let toks = tokenize("c.c", "// hi\nx").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[0].text, "// hi");
        assert_eq!(toks[1].text, "x");
    }

    #[test]
    fn test_block_comment_includes_terminator() {
        let toks = tokenize("c.c", "/* a\nb */x").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[0].text, "/* a\nb */");
        assert_eq!(toks[1].text, "x");
    }

    #[test]
    fn test_minimal_block_comment() {
        let toks = tokenize("c.c", "/**/").unwrap();
        assert_eq!(toks[0].text, "/**/");
    }

    #[test]
    fn test_comment_does_not_eat_code() {
        let texts: Vec<_> = tokenize("c.c", "a; // one\nb;")
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace && t.kind != TokenKind::Comment)
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["a", ";", "b", ";"]);
    }
}
