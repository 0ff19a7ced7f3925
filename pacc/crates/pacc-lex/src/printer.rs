//! Layout-preserving token rendering.
//!
//! Reconstructs source text from a token stream using the physical
//! locations: line breaks come from `src_loc.line` deltas, horizontal
//! gaps from `src_loc.col`. Whitespace tokens are skipped, their content
//! is implied by the positions of their neighbors.
//!
//! Tokens whose text spans lines (block comments) or whose escapes were
//! decoded render by their stored text, so the result is equivalent to
//! the input only up to whitespace and escape normalisation.

use crate::token::{Token, TokenKind};

/// Render tokens back to text by their physical positions.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut last_line = 0u32;
    let mut last_col = 0u32;

    for tok in tokens {
        if tok.kind == TokenKind::Whitespace {
            continue;
        }

        if tok.src_loc.line > last_line {
            for _ in 0..(tok.src_loc.line - last_line) {
                out.push('\n');
            }
            last_col = 0;
            last_line = tok.src_loc.line;
        }

        if tok.src_loc.col > last_col {
            out.push_str(&" ".repeat((tok.src_loc.col - last_col) as usize));
        }

        out.push_str(&tok.text);
        last_col = tok.src_loc.col + tok.text.len() as u32;
    }

    out
}
