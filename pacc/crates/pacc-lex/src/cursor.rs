//! Character cursor for traversing source code.
//!
//! The cursor owns the decoded source text and maintains *two* coordinate
//! pairs while advancing: the physical `(line, col)` of the byte under the
//! cursor, and the logical `(log_line, log_col)` the preprocessor sees
//! after line continuations are collapsed.
//!
//! Line continuation is handled here, inside [`Cursor::advance`], so the
//! token loop never observes a `\`-newline pair: stepping onto one skips
//! it, incrementing the physical line counter while leaving the logical
//! line unchanged, and pulls the logical column back by one to compensate
//! for the backslash itself.

use std::sync::Arc;

use pacc_util::SourceLocation;

use crate::chars::{is_whitespace, is_whitespace_no_newline};
use crate::LexError;

/// A cursor over the characters of one source file.
pub struct Cursor {
    filename: Arc<str>,
    chars: Vec<char>,
    index: usize,

    /// Physical line (0-based).
    line: u32,
    /// Physical column (0-based).
    col: u32,
    /// Logical line (0-based); does not advance across continuations.
    log_line: u32,
    /// Logical column (0-based).
    log_col: u32,
}

impl Cursor {
    /// Create a cursor over `source`, attributing positions to `filename`.
    pub fn new(filename: impl Into<Arc<str>>, source: &str) -> Self {
        Self {
            filename: filename.into(),
            chars: source.chars().collect(),
            index: 0,
            line: 0,
            col: 0,
            log_line: 0,
            log_col: 0,
        }
    }

    /// True while at least one character is left.
    pub fn remaining(&self) -> bool {
        self.index < self.chars.len()
    }

    /// The character under the cursor, `'\0'` at end of input.
    pub fn current_char(&self) -> char {
        self.peek_char(0)
    }

    /// The character `n` positions ahead, `'\0'` past the end.
    pub fn peek_char(&self, n: usize) -> char {
        self.chars.get(self.index + n).copied().unwrap_or('\0')
    }

    /// True if a character exists `n` positions ahead.
    pub fn has_ahead(&self, n: usize) -> bool {
        self.index + n < self.chars.len()
    }

    /// Physical location of the cursor.
    pub fn loc(&self) -> SourceLocation {
        SourceLocation {
            filename: Arc::clone(&self.filename),
            line: self.line,
            col: self.col,
        }
    }

    /// Logical location of the cursor.
    pub fn log_loc(&self) -> SourceLocation {
        SourceLocation {
            filename: Arc::clone(&self.filename),
            line: self.log_line,
            col: self.log_col,
        }
    }

    /// Advance one character, collapsing any line continuation that
    /// follows.
    pub fn advance(&mut self) -> Result<(), LexError> {
        self.advance_inner(true)
    }

    fn advance_inner(&mut self, logical_line_adjust: bool) -> Result<(), LexError> {
        if self.remaining() && self.chars[self.index] == '\n' {
            self.line += 1;
            self.col = 0;
            if logical_line_adjust {
                self.log_line += 1;
                self.log_col = 0;
            }
        } else {
            self.col += 1;
            self.log_col += 1;
        }

        self.index += 1;

        // Line continuation: a backslash whose following whitespace run
        // reaches a newline.
        if self.has_ahead(1)
            && self.chars[self.index] == '\\'
            && is_whitespace(self.chars[self.index + 1])
        {
            // The backslash does not exist in the logical source.
            self.log_col = self.log_col.saturating_sub(1);

            self.advance_inner(false)?;
            while self.remaining() && is_whitespace_no_newline(self.chars[self.index]) {
                self.advance_inner(true)?;
            }

            if self.current_char() != '\n' {
                return Err(LexError::StrayBackslash { loc: self.loc() });
            }
            self.advance_inner(false)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance_n(cursor: &mut Cursor, n: usize) {
        for _ in 0..n {
            cursor.advance().unwrap();
        }
    }

    #[test]
    fn test_physical_tracking() {
        let mut cursor = Cursor::new("t.c", "ab\ncd");
        assert_eq!(cursor.current_char(), 'a');
        advance_n(&mut cursor, 2); // past "ab"
        assert_eq!(cursor.current_char(), '\n');
        cursor.advance().unwrap();
        let loc = cursor.loc();
        assert_eq!((loc.line, loc.col), (1, 0));
        assert_eq!(cursor.current_char(), 'c');
    }

    #[test]
    fn test_continuation_splits_physical_not_logical() {
        // "ab\<newline>cd" - logically one line
        let mut cursor = Cursor::new("t.c", "ab\\\ncd");
        advance_n(&mut cursor, 2);

        // cursor skipped the continuation and sits on 'c'
        assert_eq!(cursor.current_char(), 'c');
        assert_eq!(cursor.loc().line, 1);
        assert_eq!(cursor.loc().col, 0);
        assert_eq!(cursor.log_loc().line, 0);
        assert_eq!(cursor.log_loc().col, 2);
    }

    #[test]
    fn test_continuation_with_trailing_spaces() {
        let mut cursor = Cursor::new("t.c", "a\\ \t\nb");
        cursor.advance().unwrap();
        assert_eq!(cursor.current_char(), 'b');
        assert_eq!(cursor.log_loc().line, 0);
        assert_eq!(cursor.loc().line, 1);
    }

    #[test]
    fn test_continuation_crlf() {
        let mut cursor = Cursor::new("t.c", "a\\\r\nb");
        cursor.advance().unwrap();
        assert_eq!(cursor.current_char(), 'b');
        assert_eq!(cursor.log_loc().line, 0);
    }

    #[test]
    fn test_stray_backslash() {
        let mut cursor = Cursor::new("t.c", "a\\ x");
        let err = cursor.advance();
        assert!(matches!(err, Err(LexError::StrayBackslash { .. })));
    }

    #[test]
    fn test_peek_past_end() {
        let cursor = Cursor::new("t.c", "a");
        assert_eq!(cursor.peek_char(5), '\0');
        assert!(!cursor.has_ahead(1));
    }
}
