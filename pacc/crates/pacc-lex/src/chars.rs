//! Character classification tables.
//!
//! Only ASCII is interpreted; bytes outside the classes below simply
//! accumulate into symbol tokens.

/// Whitespace, including line terminators (`\n`, `\r`, `\r\n`).
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Whitespace that may sit between a continuation backslash and its
/// newline.
pub(crate) fn is_whitespace_no_newline(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

/// Characters that terminate symbols and form operators/punctuation.
pub(crate) fn is_special(c: char) -> bool {
    "(){}[]<>,.+-/*&|%^;:=?!\"'@#~".contains(c)
}

/// ASCII decimal digit.
pub(crate) fn is_numeric(c: char) -> bool {
    c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_classes() {
        assert!(is_whitespace('\n'));
        assert!(is_whitespace('\r'));
        assert!(!is_whitespace_no_newline('\n'));
        assert!(is_whitespace_no_newline('\t'));
    }

    #[test]
    fn test_special_contains_hash_and_quotes() {
        assert!(is_special('#'));
        assert!(is_special('"'));
        assert!(is_special('\''));
        assert!(!is_special('_'));
        assert!(!is_special('\\'));
    }
}
