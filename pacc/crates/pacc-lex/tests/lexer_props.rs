//! Property tests for the lexer's structural invariants.

use proptest::prelude::*;

use pacc_lex::{tokenize, TokenKind};

proptest! {
    /// Lexing arbitrary soup from the token alphabet either succeeds or
    /// fails with a diagnostic; it never panics. On success the physical
    /// locations are non-decreasing in emission order.
    #[test]
    fn locations_are_monotonic(src in "[a-zA-Z0-9_+\\-*/%<>=!&|^ ;,(){}\n]{0,200}") {
        if let Ok(tokens) = tokenize("prop.c", &src) {
            for pair in tokens.windows(2) {
                prop_assert!(pair[0].src_loc <= pair[1].src_loc);
            }
        }
    }

    /// Identifier-and-space input always lexes, and the token texts carry
    /// every non-space character of the input in order.
    #[test]
    fn identifier_soup_roundtrips(src in "[a-z_ ]{0,200}") {
        let tokens = tokenize("prop.c", &src).unwrap();
        let rebuilt: String = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.text.as_str())
            .collect();
        let expected: String = src.chars().filter(|c| *c != ' ').collect();
        prop_assert_eq!(rebuilt, expected);
    }

    /// Without a backslash in the input there is no line continuation, so
    /// the logical location of every token equals its physical location.
    #[test]
    fn no_continuation_means_no_divergence(src in "[a-z ;\n]{0,200}") {
        let tokens = tokenize("prop.c", &src).unwrap();
        for tok in &tokens {
            prop_assert_eq!(&tok.src_loc, &tok.log_loc);
        }
    }
}
