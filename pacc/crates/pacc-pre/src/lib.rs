//! pacc-pre - The preprocessor of the pacc C front-end.
//!
//! Translation phases 4-6: a line-oriented directive engine with a
//! conditional-inclusion stack, a macro table (object-like, function-like,
//! variadic, `#` stringification, `##` pasting), recursive file inclusion
//! with `#pragma once` guards, and adjacent string-literal concatenation.
//!
//! Input is the lexer's token stream bucketed into logical lines by
//! [`lines::group_lines`]; output is one flat token line per surviving
//! logical line, with all macros expanded.

pub mod concat;
pub mod expr;
pub mod lines;
mod macros;

use std::path::PathBuf;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{error, warn};

use pacc_lex::{LexError, Token, TokenKind};
use pacc_util::SourceLocation;
use thiserror::Error;

pub use concat::concat_strings;
pub use lines::{group_lines, tokens_into_str};
pub use macros::Define;

/// Errors produced while preprocessing.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// A directive name the preprocessor does not know.
    #[error("{loc}: directive {name} unimplemented")]
    UnknownDirective { loc: SourceLocation, name: String },

    /// A directive line missing a required operand.
    #[error("{loc}: malformed #{directive} directive")]
    MalformedDirective {
        loc: SourceLocation,
        directive: &'static str,
    },

    /// `#endif` (or `#elif`/`#else`) without a matching `#if`.
    #[error("{loc}: #{directive} without matching #if")]
    MismatchedConditional {
        loc: SourceLocation,
        directive: &'static str,
    },

    /// An include whose file could not be found.
    #[error("{loc}: unresolved: {kind} include {name}")]
    UnresolvedInclude {
        loc: SourceLocation,
        kind: &'static str,
        name: String,
    },

    /// `#pragma` other than `once`.
    #[error("{loc}: unimplemented pragma {name}")]
    UnimplementedPragma { loc: SourceLocation, name: String },

    /// A macro invocation that does not match the definition.
    #[error("{loc}: expected {expected} in invocation of macro {name}")]
    BadMacroArguments {
        loc: SourceLocation,
        name: String,
        expected: &'static str,
    },

    /// A macro call whose argument list never closes.
    #[error("unterminated argument list in invocation of macro {name}")]
    UnterminatedMacroArguments { name: String },

    /// `#` applied to something that is not a parameter.
    #[error("'#' is not followed by a macro parameter in macro {name}")]
    StringifyNonParameter { name: String },

    /// `##` pasting a parameter whose expansion is not a single token.
    #[error("can only concatenate individual tokens in macro {name}")]
    PasteNotSingleToken { name: String },

    /// `##` with nothing on its left.
    #[error("'##' cannot appear at the start of a macro body in macro {name}")]
    PasteAtStart { name: String },

    /// A conditional expression that could not be evaluated.
    #[error("invalid preprocessor expression: {message}")]
    BadExpression { message: String },

    /// Tokens left over after a conditional expression.
    #[error("leftover tokens after preprocessor if expression: {text}")]
    LeftoverConditionTokens { text: String },

    /// Division or remainder by zero inside a conditional.
    #[error("division by zero in preprocessor expression")]
    DivisionByZero,

    /// Lexing an included file failed.
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// A previously included file and whether it carries an include guard.
#[derive(Debug)]
struct IncludeRef {
    #[allow(dead_code)]
    filename: String,
    has_include_guard: bool,
}

/// One element of the conditional-inclusion stack.
///
/// The stack holds *groups* of frames, one group per `#if ... #endif`
/// construct; `#elif`/`#else` append frames to the top group.
#[derive(Debug)]
pub struct IfFrame {
    /// The condition tokens as written (empty for `#else`).
    pub tokens: Vec<Token>,
    /// The computed truth of this frame.
    pub value: bool,
    /// False when the enclosing state is inactive or an earlier frame of
    /// the group was taken; the frame is then parsed for pairing only.
    pub do_eval: bool,
    /// True for the opening `#if`/`#ifdef`/`#ifndef` of a group.
    pub first_if: bool,
    /// True for `#else` frames.
    pub is_else: bool,
}

/// Line-oriented directive engine.
pub struct Preprocessor {
    lookup_dirs: Vec<PathBuf>,

    lines: Vec<Vec<Token>>,
    current_line_index: usize,

    out_lines: Vec<Vec<Token>>,

    files_included: FxHashMap<String, IncludeRef>,
    pub(crate) defines: IndexMap<String, Define>,

    if_stack: Vec<Vec<IfFrame>>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// A preprocessor with the default include search path and the
    /// predefined macros.
    pub fn new() -> Self {
        let mut defines = IndexMap::new();
        defines.insert(
            "__STDC__".to_string(),
            Define::object("__STDC__", vec![Token::synthesized("1", TokenKind::LiteralNumber)]),
        );
        defines.insert(
            "__STDC_VERSION__".to_string(),
            Define::object(
                "__STDC_VERSION__",
                vec![Token::synthesized("202311L", TokenKind::LiteralNumber)],
            ),
        );

        Self {
            lookup_dirs: vec![
                PathBuf::from("."),
                PathBuf::from("include"),
                PathBuf::from("musl/include"),
            ],
            lines: Vec::new(),
            current_line_index: 0,
            out_lines: Vec::new(),
            files_included: FxHashMap::default(),
            defines,
            if_stack: Vec::new(),
        }
    }

    /// Append a directory to the `<...>` include search path.
    pub fn add_include_dir(&mut self, dir: PathBuf) {
        self.lookup_dirs.push(dir);
    }

    /// True if `name` is currently defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    /// Splice logical lines into the stream at the current position.
    pub fn add_lines(&mut self, new_lines: Vec<Vec<Token>>) {
        let at = self.current_line_index;
        self.lines.splice(at..at, new_lines);
    }

    fn is_empty(&self) -> bool {
        self.current_line_index >= self.lines.len()
    }

    fn get_next_line(&mut self) -> Vec<Token> {
        let line = self.lines[self.current_line_index].clone();
        self.current_line_index += 1;
        line
    }

    // ------------------------------------------------------------------
    // conditional-inclusion state machine
    // ------------------------------------------------------------------

    fn add_if_stack_item(&mut self, frame: IfFrame) {
        if self.if_stack.is_empty() || frame.first_if {
            self.if_stack.push(Vec::new());
        }
        let top = self.if_stack.len() - 1;
        self.if_stack[top].push(frame);
    }

    fn any_item_in_top_group_true(&self) -> bool {
        match self.if_stack.last() {
            Some(group) => group.iter().any(|frame| frame.value),
            None => false,
        }
    }

    /// The active inclusion state: lines are kept iff the stack is empty or
    /// the top group's most recent frame holds.
    fn get_if_state(&self) -> bool {
        match self.if_stack.last().and_then(|group| group.last()) {
            Some(frame) => frame.value,
            None => true,
        }
    }

    /// Whether a new frame's condition deserves evaluation.
    ///
    /// An opening `#if` evaluates iff the enclosing state is active; an
    /// `#elif`/`#else` additionally requires that no earlier frame of its
    /// group was taken.
    fn frame_do_eval(&self, first_if: bool, loc: &SourceLocation, directive: &'static str)
        -> Result<bool, PreprocessError>
    {
        if first_if {
            return Ok(self.get_if_state());
        }

        let group = self
            .if_stack
            .last()
            .ok_or_else(|| PreprocessError::MismatchedConditional {
                loc: loc.clone(),
                directive,
            })?;
        let last_do_eval = group.last().map_or(true, |frame| frame.do_eval);

        Ok(last_do_eval && !self.any_item_in_top_group_true())
    }

    fn eval_if(
        &mut self,
        tokens: &[Token],
        first_if: bool,
        loc: &SourceLocation,
        directive: &'static str,
    ) -> Result<IfFrame, PreprocessError> {
        let do_eval = self.frame_do_eval(first_if, loc, directive)?;

        let value = if do_eval {
            let defchecked = expr::remove_defchecks(&self.defines, tokens)?;
            let expanded = self.expand(&defchecked)?;
            let evalable = expr::make_evalable(&expanded);
            expr::eval_condition(&evalable)? != 0
        } else {
            false
        };

        Ok(IfFrame {
            tokens: tokens.to_vec(),
            value,
            do_eval,
            first_if,
            is_else: false,
        })
    }

    fn eval_ifdef(
        &mut self,
        tokens: &[Token],
        negated: bool,
        first_if: bool,
        loc: &SourceLocation,
        directive: &'static str,
    ) -> Result<IfFrame, PreprocessError> {
        let do_eval = self.frame_do_eval(first_if, loc, directive)?;

        let value = if do_eval {
            let name = tokens
                .first()
                .ok_or_else(|| PreprocessError::MalformedDirective {
                    loc: loc.clone(),
                    directive,
                })?;
            self.defines.contains_key(&name.text) != negated
        } else {
            false
        };

        Ok(IfFrame {
            tokens: tokens.to_vec(),
            value,
            do_eval,
            first_if,
            is_else: false,
        })
    }

    fn eval_else(&self, loc: &SourceLocation) -> Result<IfFrame, PreprocessError> {
        let do_eval = self.frame_do_eval(false, loc, "else")?;

        Ok(IfFrame {
            tokens: Vec::new(),
            value: do_eval,
            do_eval,
            first_if: false,
            is_else: true,
        })
    }

    // ------------------------------------------------------------------
    // driver loop
    // ------------------------------------------------------------------

    /// Execute all directives and expansions, returning one flat token line
    /// per surviving logical line.
    pub fn run(&mut self) -> Result<Vec<Vec<Token>>, PreprocessError> {
        let mut pending: Option<Vec<Token>> = None;

        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => {
                    if self.is_empty() {
                        break;
                    }
                    self.get_next_line()
                }
            };

            if line.is_empty() {
                continue;
            }

            if line[0].is("#") {
                self.handle_directive(&line)?;
                continue;
            }

            // a run of ordinary lines: gather until the next directive,
            // then expand the whole run at once
            let skip = !self.get_if_state();
            let mut expand_tokens: Vec<Token> = Vec::new();
            let mut line = line;

            loop {
                if line.first().is_some_and(|t| t.is("#")) {
                    pending = Some(line);
                    break;
                }

                if !skip {
                    expand_tokens.extend(line);
                }

                if self.is_empty() {
                    break;
                }
                line = self.get_next_line();
            }

            if !skip {
                let expanded = self.expand(&expand_tokens)?;
                self.out_lines.push(expanded);
            }
        }

        Ok(std::mem::take(&mut self.out_lines))
    }

    fn handle_directive(&mut self, line: &[Token]) -> Result<(), PreprocessError> {
        if line.len() < 2 {
            // the null directive is allowed
            return Ok(());
        }

        let hash_loc = line[0].src_loc.clone();
        let name = &line[1];

        match name.text.as_str() {
            "if" => {
                let frame = self.eval_if(&line[2..], true, &hash_loc, "if")?;
                self.add_if_stack_item(frame);
            }
            "ifdef" => {
                // extra tokens after the name are ignored
                let frame = self.eval_ifdef(&line[2..], false, true, &hash_loc, "ifdef")?;
                self.add_if_stack_item(frame);
            }
            "ifndef" => {
                let frame = self.eval_ifdef(&line[2..], true, true, &hash_loc, "ifndef")?;
                self.add_if_stack_item(frame);
            }

            "elif" => {
                let frame = self.eval_if(&line[2..], false, &hash_loc, "elif")?;
                self.add_if_stack_item(frame);
            }
            "elifdef" => {
                let frame = self.eval_ifdef(&line[2..], false, false, &hash_loc, "elifdef")?;
                self.add_if_stack_item(frame);
            }
            "elifndef" => {
                let frame = self.eval_ifdef(&line[2..], true, false, &hash_loc, "elifndef")?;
                self.add_if_stack_item(frame);
            }

            "else" => {
                let frame = self.eval_else(&hash_loc)?;
                self.add_if_stack_item(frame);
            }

            "endif" => {
                self.if_stack
                    .pop()
                    .ok_or(PreprocessError::MismatchedConditional {
                        loc: hash_loc,
                        directive: "endif",
                    })?;
            }

            "error" => {
                if !self.get_if_state() {
                    return Ok(());
                }
                // deliberately does not abort the build
                error!("{}", tokens_into_str(&line[2..]));
            }
            "warning" => {
                if !self.get_if_state() {
                    return Ok(());
                }
                warn!("{}", tokens_into_str(&line[2..]));
            }

            "pragma" => {
                if !self.get_if_state() {
                    return Ok(());
                }
                self.handle_pragma(line, &hash_loc)?;
            }

            "include" => {
                if !self.get_if_state() {
                    return Ok(());
                }
                self.handle_include(line, &hash_loc)?;
            }

            "define" => {
                if !self.get_if_state() {
                    return Ok(());
                }
                let define = macros::parse_define(line, &hash_loc)?;
                self.defines.insert(define.name.to_string(), define);
            }

            "undef" => {
                if !self.get_if_state() {
                    return Ok(());
                }
                let name = line
                    .get(2)
                    .ok_or(PreprocessError::MalformedDirective {
                        loc: hash_loc,
                        directive: "undef",
                    })?;
                self.defines.shift_remove(&name.text);
            }

            "line" => {
                warn!("directive line unimplemented");
            }
            "embed" => {
                warn!("directive embed unimplemented");
            }

            other => {
                return Err(PreprocessError::UnknownDirective {
                    loc: hash_loc,
                    name: other.to_string(),
                });
            }
        }

        Ok(())
    }

    fn handle_pragma(&mut self, line: &[Token], loc: &SourceLocation) -> Result<(), PreprocessError> {
        let pragma = line.get(2).ok_or(PreprocessError::MalformedDirective {
            loc: loc.clone(),
            directive: "pragma",
        })?;

        match pragma.text.as_str() {
            "once" => {
                // mark the file the directive appears in
                let filename = pragma.src_loc.filename.to_string();
                self.files_included
                    .entry(filename.clone())
                    .and_modify(|r| r.has_include_guard = true)
                    .or_insert(IncludeRef {
                        filename,
                        has_include_guard: true,
                    });
                Ok(())
            }
            other => Err(PreprocessError::UnimplementedPragma {
                loc: pragma.src_loc.clone(),
                name: other.to_string(),
            }),
        }
    }

    fn handle_include(&mut self, line: &[Token], loc: &SourceLocation) -> Result<(), PreprocessError> {
        // extra tokens at the end of an include are legal and ignored
        let target = line.get(2).ok_or(PreprocessError::MalformedDirective {
            loc: loc.clone(),
            directive: "include",
        })?;

        let file_path: PathBuf = if target.kind == TokenKind::LiteralString {
            // #include "x": relative to the directing file
            let name = target.text.trim_matches('"');
            let base = PathBuf::from(&*target.src_loc.filename);
            let path = match base.parent() {
                Some(parent) => parent.join(name),
                None => PathBuf::from(name),
            };
            if !path.exists() {
                return Err(PreprocessError::UnresolvedInclude {
                    loc: target.src_loc.clone(),
                    kind: "local",
                    name: name.to_string(),
                });
            }
            path
        } else if target.is("<") {
            // #include <x>: re-serialize the bracketed text, preserving the
            // gaps recorded in the logical columns
            let mut name = String::new();
            let mut col = target.log_loc.col + 1;
            for tok in &line[3..] {
                if tok.is(">") {
                    break;
                }
                if tok.log_loc.col > col {
                    name.push_str(&" ".repeat((tok.log_loc.col - col) as usize));
                }
                name.push_str(&tok.text);
                col = tok.log_loc.col + tok.text.len() as u32;
            }

            let mut resolved = None;
            for dir in &self.lookup_dirs {
                let candidate = dir.join(&name);
                if candidate.exists() {
                    resolved = Some(candidate);
                    break;
                }
            }
            resolved.ok_or_else(|| PreprocessError::UnresolvedInclude {
                loc: target.src_loc.clone(),
                kind: "global",
                name: name.clone(),
            })?
        } else {
            return Err(PreprocessError::MalformedDirective {
                loc: target.src_loc.clone(),
                directive: "include",
            });
        };

        let path_str = file_path.display().to_string();

        // a guarded file is included at most once
        if let Some(previous) = self.files_included.get(&path_str) {
            if previous.has_include_guard {
                return Ok(());
            }
        }

        let tokens = pacc_lex::tokenize_file(&file_path)?;
        let file_lines = group_lines(&tokens);

        self.files_included.insert(
            path_str.clone(),
            IncludeRef {
                filename: path_str,
                has_include_guard: false,
            },
        );

        self.add_lines(file_lines);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacc_lex::tokenize;

    fn preprocess(src: &str) -> Vec<Vec<Token>> {
        let tokens = tokenize("t.c", src).unwrap();
        let mut pre = Preprocessor::new();
        pre.add_lines(group_lines(&tokens));
        pre.run().unwrap()
    }

    fn flat_texts(src: &str) -> Vec<String> {
        preprocess(src)
            .into_iter()
            .flatten()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_plain_lines_pass_through() {
        assert_eq!(flat_texts("int x;\n"), vec!["int", "x", ";"]);
    }

    #[test]
    fn test_object_macro() {
        assert_eq!(flat_texts("#define N 4\nint x = N;\n"), vec![
            "int", "x", "=", "4", ";"
        ]);
    }

    #[test]
    fn test_undef_removes_macro() {
        assert_eq!(
            flat_texts("#define N 4\n#undef N\nint x = N;\n"),
            vec!["int", "x", "=", "N", ";"]
        );
    }

    #[test]
    fn test_redefinition_overwrites() {
        assert_eq!(flat_texts("#define N 4\n#define N 5\nx = N;\n"), vec![
            "x", "=", "5", ";"
        ]);
    }

    #[test]
    fn test_if_zero_drops_lines() {
        assert_eq!(flat_texts("#if 0\nhidden\n#endif\nkept\n"), vec!["kept"]);
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            flat_texts("#if 0\na\n#else\nb\n#endif\n"),
            vec!["b"]
        );
    }

    #[test]
    fn test_elif_chain_takes_first_true() {
        let src = "#if 0\na\n#elif 1\nb\n#elif 1\nc\n#else\nd\n#endif\n";
        assert_eq!(flat_texts(src), vec!["b"]);
    }

    #[test]
    fn test_nested_if_inside_inactive_branch_is_dropped() {
        // the inner #if 1 must not resurrect an inactive region
        let src = "#if 0\n#if 1\nx\n#endif\n#endif\ny\n";
        assert_eq!(flat_texts(src), vec!["y"]);
    }

    #[test]
    fn test_nested_if_inner_false_outer_else() {
        let src = "#if 1\n#if 0\na\n#endif\nb\n#else\nc\n#endif\n";
        assert_eq!(flat_texts(src), vec!["b"]);
    }

    #[test]
    fn test_ifdef_and_ifndef() {
        assert_eq!(
            flat_texts("#define A\n#ifdef A\nx\n#endif\n#ifndef A\ny\n#endif\n"),
            vec!["x"]
        );
    }

    #[test]
    fn test_elifdef() {
        let src = "#define B\n#ifdef A\na\n#elifdef B\nb\n#endif\n";
        assert_eq!(flat_texts(src), vec!["b"]);
    }

    #[test]
    fn test_conditional_exclusivity() {
        // at most one frame of a group may hold
        let src = "#if 1\na\n#elif 1\nb\n#else\nc\n#endif\n";
        assert_eq!(flat_texts(src), vec!["a"]);
    }

    #[test]
    fn test_mismatched_endif_is_fatal() {
        let tokens = tokenize("t.c", "#endif\n").unwrap();
        let mut pre = Preprocessor::new();
        pre.add_lines(group_lines(&tokens));
        assert!(matches!(
            pre.run(),
            Err(PreprocessError::MismatchedConditional { .. })
        ));
    }

    #[test]
    fn test_unknown_directive_is_fatal() {
        let tokens = tokenize("t.c", "#frobnicate\n").unwrap();
        let mut pre = Preprocessor::new();
        pre.add_lines(group_lines(&tokens));
        assert!(matches!(
            pre.run(),
            Err(PreprocessError::UnknownDirective { .. })
        ));
    }

    #[test]
    fn test_null_directive_is_allowed() {
        assert_eq!(flat_texts("#\nx\n"), vec!["x"]);
    }

    #[test]
    fn test_predefined_macros() {
        assert_eq!(flat_texts("__STDC__ __STDC_VERSION__\n"), vec![
            "1", "202311L"
        ]);
    }

    #[test]
    fn test_error_directive_does_not_abort() {
        assert_eq!(flat_texts("#error out of cheese\nx\n"), vec!["x"]);
    }

    #[test]
    fn test_defined_operator() {
        let src = "#define A\n#if defined(A) && !defined(B)\nx\n#endif\n";
        assert_eq!(flat_texts(src), vec!["x"]);
    }

    #[test]
    fn test_if_with_macro_arithmetic() {
        let src = "#define V 3\n#if V + 1 > 3\nx\n#endif\n";
        assert_eq!(flat_texts(src), vec!["x"]);
    }

    #[test]
    fn test_unknown_symbol_in_condition_is_zero() {
        assert_eq!(flat_texts("#if UNKNOWN\nx\n#else\ny\n#endif\n"), vec!["y"]);
    }

    #[test]
    fn test_stdc_version_in_condition() {
        let src = "#if __STDC_VERSION__ >= 202311L\nx\n#endif\n";
        assert_eq!(flat_texts(src), vec!["x"]);
    }
}
