//! Token type shared by every stage of the front-end.

use std::rc::Rc;

use pacc_util::SourceLocation;

/// Classification of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of whitespace characters. Retained by the lexer, dropped by the
    /// line grouper.
    Whitespace,
    /// A line or block comment, including its delimiters.
    Comment,
    /// An identifier. Keyword recognition happens in the parser, so `int`
    /// and `while` are symbols here.
    Symbol,
    /// An operator or punctuation character, possibly compound (`->`, `<<=`).
    OperatorPunctuation,
    /// Reserved for stages that classify keywords; the lexer never emits it.
    Keyword,
    /// A string literal, quotes included, escapes decoded.
    LiteralString,
    /// A character literal, quotes included, escapes decoded.
    LiteralChar,
    /// A numeric literal, any suffix kept as uninterpreted text.
    LiteralNumber,
}

/// One lexical token.
///
/// Tokens are immutable after emission except for the macro-provenance
/// trail, which the preprocessor extends on every expansion copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The token text. Literal tokens keep their delimiters; escape
    /// sequences are already decoded.
    pub text: String,
    /// Classification.
    pub kind: TokenKind,
    /// Physical position in the on-disk file.
    pub src_loc: SourceLocation,
    /// Logical position after line-continuation collapse.
    pub log_loc: SourceLocation,
    /// Names of the macros whose expansion produced this token, outermost
    /// first. Empty for tokens straight from the source.
    pub expanded_from: Vec<Rc<str>>,
}

impl Token {
    /// A token carrying real source coordinates.
    pub fn new(
        text: impl Into<String>,
        kind: TokenKind,
        src_loc: SourceLocation,
        log_loc: SourceLocation,
    ) -> Self {
        Self {
            text: text.into(),
            kind,
            src_loc,
            log_loc,
            expanded_from: Vec::new(),
        }
    }

    /// A token synthesized by the compiler (no source position).
    pub fn synthesized(text: impl Into<String>, kind: TokenKind) -> Self {
        Self::new(
            text,
            kind,
            SourceLocation::placeholder(),
            SourceLocation::placeholder(),
        )
    }

    /// Shorthand for text comparison; directive and operator dispatch is
    /// almost always by text.
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    /// True if this is a whitespace token consisting only of whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
            && self.text.chars().all(crate::chars::is_whitespace)
    }

    /// True if the text is a well-formed identifier.
    pub fn is_valid_symbol(&self) -> bool {
        let mut chars = self.text.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Record that this token came out of an expansion of `macro_name`.
    pub fn expand_from(&mut self, macro_name: &Rc<str>) {
        self.expanded_from.push(Rc::clone(macro_name));
    }

    /// True if `macro_name` already appears in the provenance trail.
    pub fn is_expanded_from(&self, macro_name: &str) -> bool {
        self.expanded_from.iter().any(|name| &**name == macro_name)
    }
}
