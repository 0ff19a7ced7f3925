//! Logical line grouping.
//!
//! The preprocessor is line oriented: a directive is a logical line whose
//! first token is `#`. This module buckets the lexer's token stream into
//! logical lines (by `log_loc.line`, so line continuations have already
//! been collapsed) and drops whitespace and comment tokens on the way.

use pacc_lex::{Token, TokenKind};

/// Partition tokens into logical-line buckets, dropping whitespace and
/// comments.
///
/// Bucket boundaries follow the logical line number; the leading bucket can
/// be empty when the first token does not sit on line zero.
pub fn group_lines(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut lines: Vec<Vec<Token>> = vec![Vec::new()];
    let mut current_line = 0u32;

    for tok in tokens {
        if matches!(tok.kind, TokenKind::Whitespace | TokenKind::Comment) {
            continue;
        }

        if tok.log_loc.line != current_line {
            current_line = tok.log_loc.line;
            lines.push(Vec::new());
        }

        let last = lines.len() - 1;
        lines[last].push(tok.clone());
    }

    lines
}

/// Join token texts with single spaces, for messages and `-p` output.
pub fn tokens_into_str(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacc_lex::tokenize;

    #[test]
    fn test_groups_by_logical_line() {
        let tokens = tokenize("t.c", "a b\nc\nd e f\n").unwrap();
        let lines = group_lines(&tokens);
        let texts: Vec<Vec<&str>> = lines
            .iter()
            .map(|l| l.iter().map(|t| t.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec![vec!["a", "b"], vec!["c"], vec!["d", "e", "f"]]);
    }

    #[test]
    fn test_drops_whitespace_and_comments() {
        let tokens = tokenize("t.c", "x /* note */ y // tail\n").unwrap();
        let lines = group_lines(&tokens);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 2);
    }

    #[test]
    fn test_continuation_merges_lines() {
        let tokens = tokenize("t.c", "#define X \\\n 1\n").unwrap();
        let lines = group_lines(&tokens);
        // "#", "define", "X", "1" all on one logical line
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 4);
    }

    #[test]
    fn test_leading_blank_line_leaves_empty_bucket() {
        let tokens = tokenize("t.c", "\n\nx\n").unwrap();
        let lines = group_lines(&tokens);
        assert_eq!(lines[0].len(), 0);
        assert_eq!(lines[1].len(), 1);
    }

    #[test]
    fn test_tokens_into_str() {
        let tokens = tokenize("t.c", "a + b").unwrap();
        let line = group_lines(&tokens).remove(0);
        assert_eq!(tokens_into_str(&line), "a + b");
    }
}
