//! Operator and punctuation lexing.

use crate::token::{Token, TokenKind};
use crate::{LexError, Lexer};

/// Compound operators, longest first so that maximal munch falls out of a
/// linear scan (`<<=` must win over `<<`).
pub(crate) const COMPOUND_OPERATORS: &[&str] = &[
    "<<=", ">>=", "...", "->", "++", "--", "||", "&&", "==", "!=", "<=", ">=", "-=", "+=", "|=",
    "&=", "^=", "<<", ">>",
];

impl Lexer {
    /// Try to match a compound operator at the cursor.
    ///
    /// On a match the cursor is left on the operator's final character (the
    /// token loop's trailing advance consumes it).
    pub(crate) fn lex_compound_operator(&mut self, token: &mut Token) -> Result<bool, LexError> {
        let c = self.cursor.current_char();

        'candidates: for op in COMPOUND_OPERATORS {
            let mut chars = op.chars();
            if chars.next() != Some(c) {
                continue;
            }
            if !self.cursor.has_ahead(op.len() - 1) {
                continue;
            }

            for (i, expected) in chars.enumerate() {
                if self.cursor.peek_char(i + 1) != expected {
                    continue 'candidates;
                }
            }

            // only advance once the symbol is known to match
            for _ in 1..op.len() {
                self.cursor.advance()?;
            }

            token.text = (*op).to_string();
            token.kind = TokenKind::OperatorPunctuation;
            return Ok(true);
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::token::TokenKind;
    use crate::tokenize;

    fn op_texts(src: &str) -> Vec<String> {
        tokenize("op.c", src)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind == TokenKind::OperatorPunctuation)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_arrow_and_increment() {
        assert_eq!(op_texts("p->x++"), vec!["->", "++"]);
    }

    #[test]
    fn test_maximal_munch_shift_assign() {
        assert_eq!(op_texts("a <<= b"), vec!["<<="]);
        assert_eq!(op_texts("a >>= b"), vec![">>="]);
    }

    #[test]
    fn test_shift_without_assign() {
        assert_eq!(op_texts("a << b"), vec!["<<"]);
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(op_texts("f(int, ...)"), vec!["(", ",", "...", ")"]);
    }

    #[test]
    fn test_singles_fall_through() {
        assert_eq!(op_texts("a + b ; c"), vec!["+", ";"]);
    }

    #[test]
    fn test_adjacent_compounds() {
        // "+++" munches "++" then "+"
        assert_eq!(op_texts("a+++b"), vec!["++", "+"]);
    }

    #[test]
    fn test_compound_at_eof() {
        assert_eq!(op_texts("a=="), vec!["=="]);
    }
}
