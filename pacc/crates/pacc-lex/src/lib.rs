//! pacc-lex - Lexical analysis for the pacc C front-end.
//!
//! The lexer implements translation phases 1-3 in a single pass: it reads
//! the whole file, walks it character by character, and emits [`Token`]s
//! carrying *two* source coordinates each:
//!
//! - `src_loc` - the physical byte position in the on-disk file, used for
//!   diagnostics
//! - `log_loc` - the logical position after `\`-newline line continuations
//!   have been collapsed, used by the preprocessor's line grouping
//!
//! The two coordinates diverge only across line continuations; that rule is
//! implemented once, inside the character cursor's advance primitive.
//!
//! Whitespace and comments are emitted as ordinary tokens here and dropped
//! later by the preprocessor's line grouper, so that a token printer can
//! reconstruct the original layout.

pub mod cursor;
mod chars;
pub mod lexer;
pub mod printer;
pub mod token;

use std::path::Path;

use pacc_util::SourceLocation;
use thiserror::Error;

pub use lexer::Lexer;
pub use printer::render_tokens;
pub use token::{Token, TokenKind};

/// Errors produced during tokenization.
///
/// Lexical analysis has a single error mode: the first malformed token
/// aborts the translation unit with a source-location-tagged message.
#[derive(Debug, Error)]
pub enum LexError {
    /// A string or character literal ran into a newline or the end of file.
    #[error("{loc}: missing terminating {delim}")]
    UnterminatedLiteral { loc: SourceLocation, delim: char },

    /// An escape sequence the lexer does not recognize.
    #[error("{loc}: unimplemented escape sequence '\\{escape}'")]
    UnknownEscape { loc: SourceLocation, escape: char },

    /// More than one decimal point in a numeric literal.
    #[error("{loc}: dot already parsed in float literal")]
    DuplicateDot { loc: SourceLocation },

    /// More than one exponent marker in a numeric literal.
    #[error("{loc}: exponent already parsed in float literal")]
    DuplicateExponent { loc: SourceLocation },

    /// More than one sign inside an exponent.
    #[error("{loc}: already parsed exponent sign")]
    DuplicateExponentSign { loc: SourceLocation },

    /// An exponent marker with no digits after it.
    #[error("{loc}: exponent has no digits")]
    EmptyExponent { loc: SourceLocation },

    /// A digit separator not surrounded by digits.
    #[error("{loc}: digit separator cannot appear at end of digit sequence")]
    SeparatorAtEnd { loc: SourceLocation },

    /// A digit separator before the first exponent digit.
    #[error("{loc}: digit separator cannot appear at start of digit sequence")]
    SeparatorAtStart { loc: SourceLocation },

    /// A backslash that starts a line continuation but never reaches a
    /// newline.
    #[error("{loc}: stray '\\' in program")]
    StrayBackslash { loc: SourceLocation },

    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tokenize in-memory source text.
///
/// `filename` is recorded in every token's locations; it does not have to
/// name an existing file.
pub fn tokenize(filename: &str, source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(filename, source).tokenize()
}

/// Read and tokenize a file.
pub fn tokenize_file(path: &Path) -> Result<Vec<Token>, LexError> {
    let source = std::fs::read_to_string(path).map_err(|source| LexError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Lexer::new(&path.display().to_string(), &source).tokenize()
}
