//! Adjacent string-literal concatenation (translation phase 6).

use pacc_lex::{Token, TokenKind};

/// Fuse each run of adjacent string literals into a single literal.
///
/// The merged token keeps the first literal's locations and provenance.
/// Applying this pass twice is the identity.
pub fn concat_strings(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();

    for tok in tokens {
        if tok.kind == TokenKind::LiteralString {
            if let Some(prev) = out.last_mut() {
                if prev.kind == TokenKind::LiteralString {
                    // drop the closing quote of the previous literal and the
                    // opening quote of this one
                    prev.text.pop();
                    prev.text.push_str(&tok.text[1..]);
                    continue;
                }
            }
        }

        out.push(tok);
    }

    out
}
