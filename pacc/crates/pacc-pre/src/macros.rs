//! Macro definition and expansion.
//!
//! Expansion repeats whole-line scans until a fixpoint. Recursion is
//! blocked by the provenance trail each expanded token carries: a symbol
//! whose own text already appears in its trail is treated as a plain
//! token. This "painted" rule is weaker than ISO C's blue-set but is the
//! behavior this front-end implements throughout.

use indexmap::IndexMap;
use std::rc::Rc;

use pacc_lex::{Token, TokenKind};
use pacc_util::SourceLocation;

use crate::{Preprocessor, PreprocessError};

/// Spelling of the declared vararg parameter in a `#define`.
pub const VARARG_ARGNAME: &str = "...";

/// Spelling of the vararg collector inside a macro body.
pub const VA_ARGS: &str = "__VA_ARGS__";

/// One `#define` entry.
///
/// `params` being present (even empty) is what makes a macro
/// function-like.
#[derive(Clone, Debug)]
pub struct Define {
    /// Macro name, shared into every expanded token's provenance trail.
    pub name: Rc<str>,
    /// Parameter name tokens; `None` for object-like macros.
    pub params: Option<Vec<Token>>,
    /// True if the parameter list ends in `...`.
    pub has_vararg: bool,
    /// Replacement tokens.
    pub body: Vec<Token>,
}

impl Define {
    /// An object-like macro.
    pub fn object(name: &str, body: Vec<Token>) -> Self {
        Self {
            name: Rc::from(name),
            params: None,
            has_vararg: false,
            body,
        }
    }
}

/// Parse a `#define` directive line (starting at the `#` token).
pub(crate) fn parse_define(
    line: &[Token],
    loc: &SourceLocation,
) -> Result<Define, PreprocessError> {
    let malformed = || PreprocessError::MalformedDirective {
        loc: loc.clone(),
        directive: "define",
    };

    let name = line.get(2).ok_or_else(malformed)?;

    let mut define = Define {
        name: Rc::from(name.text.as_str()),
        params: None,
        has_vararg: false,
        body: Vec::new(),
    };

    if line.len() > 3 {
        let mut first_body_index = 3;

        // a parameter list requires the '(' to touch the macro name
        let is_function_like = line[3].is("(")
            && line[3].log_loc.col == name.log_loc.col + name.text.len() as u32;

        if is_function_like {
            let mut params = Vec::new();
            let mut i = 4; // past the opening parenthesis

            loop {
                let tok = line.get(i).ok_or_else(malformed)?;
                if tok.is(")") {
                    break;
                }

                if tok.is(VARARG_ARGNAME) {
                    // the vararg must be the last parameter
                    define.has_vararg = true;
                    i += 1;
                    break;
                }

                params.push(tok.clone());
                i += 1;

                if line.get(i).is_some_and(|t| t.is(",")) {
                    i += 1;
                }
            }

            if !line.get(i).is_some_and(|t| t.is(")")) {
                return Err(malformed());
            }
            i += 1;

            define.params = Some(params);
            first_body_index = i;
        }

        define.body.extend(line[first_body_index..].iter().cloned());
    }

    Ok(define)
}

impl Preprocessor {
    /// Expand macros in one logical line's worth of tokens.
    pub fn expand(&self, tokens: &[Token]) -> Result<Vec<Token>, PreprocessError> {
        let mut in_tokens: Vec<Token> = tokens.to_vec();
        let mut ret: Vec<Token> = Vec::new();

        loop {
            let mut expanded_any = false;
            let mut i = 0;

            while i < in_tokens.len() {
                let tok = &in_tokens[i];
                i += 1;

                let target = if tok.kind == TokenKind::Symbol {
                    self.defines.get(&tok.text)
                } else {
                    None
                };

                // the painted rule: a token may not re-enter its own macro
                let target = match target {
                    Some(_) if tok.is_expanded_from(&tok.text) => None,
                    other => other,
                };

                let Some(define) = target else {
                    ret.push(tok.clone());
                    continue;
                };

                expanded_any = true;

                let mut macro_args: IndexMap<String, Vec<Token>> = IndexMap::new();

                if let Some(params) = &define.params {
                    i = gather_arguments(define, params, &in_tokens, i, &mut macro_args)?;
                }

                substitute_body(define, &macro_args, &mut ret)?;
            }

            if !expanded_any {
                break;
            }

            // newly produced tokens may themselves name macros
            in_tokens = std::mem::take(&mut ret);
        }

        Ok(ret)
    }
}

/// Collect the call arguments of a function-like macro.
///
/// `i` indexes the token after the macro name; the returned index is past
/// the closing parenthesis. Commas split arguments only at parenthesis
/// nesting depth zero; a trailing `__VA_ARGS__` slot swallows everything up
/// to the closing parenthesis.
fn gather_arguments(
    define: &Define,
    params: &[Token],
    in_tokens: &[Token],
    mut i: usize,
    macro_args: &mut IndexMap<String, Vec<Token>>,
) -> Result<usize, PreprocessError> {
    let unterminated = || PreprocessError::UnterminatedMacroArguments {
        name: define.name.to_string(),
    };

    let open = in_tokens.get(i).ok_or_else(unterminated)?;
    i += 1;
    if !open.is("(") {
        return Err(PreprocessError::BadMacroArguments {
            loc: open.src_loc.clone(),
            name: define.name.to_string(),
            expected: "'('",
        });
    }

    let mut names: Vec<&str> = params.iter().map(|p| p.text.as_str()).collect();
    if define.has_vararg {
        names.push(VA_ARGS);
    }

    let mut tok = in_tokens.get(i).ok_or_else(unterminated)?.clone();
    i += 1;

    for name in names {
        let is_vararg_slot = name == VA_ARGS;
        let mut arg: Vec<Token> = Vec::new();
        let mut nesting_depth = 0usize;

        loop {
            if tok.is("(") {
                nesting_depth += 1;
            }

            if tok.is(")") {
                if nesting_depth == 0 {
                    break;
                }
                nesting_depth -= 1;
            }

            if tok.is(",") && nesting_depth == 0 && !is_vararg_slot {
                tok = in_tokens.get(i).ok_or_else(unterminated)?.clone();
                i += 1;
                break;
            }

            arg.push(tok);

            tok = in_tokens.get(i).ok_or_else(unterminated)?.clone();
            i += 1;
        }

        macro_args.insert(name.to_string(), arg);
    }

    if !tok.is(")") {
        return Err(PreprocessError::BadMacroArguments {
            loc: tok.src_loc.clone(),
            name: define.name.to_string(),
            expected: "')'",
        });
    }

    Ok(i)
}

/// Walk a macro body, splicing arguments and applying `#` and `##`.
fn substitute_body(
    define: &Define,
    macro_args: &IndexMap<String, Vec<Token>>,
    ret: &mut Vec<Token>,
) -> Result<(), PreprocessError> {
    let mut j = 0;

    while j < define.body.len() {
        let out_tok = &define.body[j];
        j += 1;

        if let Some(arg) = macro_args.get(&out_tok.text) {
            for arg_tok in arg {
                let mut copied = arg_tok.clone();
                copied.expand_from(&define.name);
                ret.push(copied);
            }
            continue;
        }

        if out_tok.is("#") {
            let next = define
                .body
                .get(j)
                .ok_or_else(|| PreprocessError::StringifyNonParameter {
                    name: define.name.to_string(),
                })?;
            j += 1;

            if next.is("#") {
                // token pasting: glue onto the previous output token
                let concat_tok = define.body.get(j).ok_or_else(|| {
                    PreprocessError::PasteAtStart {
                        name: define.name.to_string(),
                    }
                })?;

                let last = ret
                    .last_mut()
                    .ok_or_else(|| PreprocessError::PasteAtStart {
                        name: define.name.to_string(),
                    })?;

                if let Some(arg) = macro_args.get(&concat_tok.text) {
                    if arg.len() != 1 {
                        return Err(PreprocessError::PasteNotSingleToken {
                            name: define.name.to_string(),
                        });
                    }
                    last.text.push_str(&arg[0].text);
                } else {
                    last.text.push_str(&concat_tok.text);
                }

                j += 1;
                continue;
            }

            // stringification: the operand must be a parameter
            let arg = macro_args.get(&next.text).ok_or_else(|| {
                PreprocessError::StringifyNonParameter {
                    name: define.name.to_string(),
                }
            })?;

            let mut joined = String::new();
            let mut is_first = true;
            for arg_tok in arg {
                if !is_first && arg_tok.kind == TokenKind::Symbol {
                    joined.push(' ');
                }
                joined.push_str(&arg_tok.text);
                is_first = false;
            }

            let mut stringified =
                Token::synthesized(format!("\"{joined}\""), TokenKind::LiteralString);
            stringified.expand_from(&define.name);
            ret.push(stringified);
            continue;
        }

        let mut copied = out_tok.clone();
        copied.expand_from(&define.name);
        ret.push(copied);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{group_lines, Preprocessor, PreprocessError};
    use pacc_lex::{tokenize, TokenKind};

    fn flat_texts(src: &str) -> Vec<String> {
        let tokens = tokenize("m.c", src).unwrap();
        let mut pre = Preprocessor::new();
        pre.add_lines(group_lines(&tokens));
        pre.run()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_function_like_macro() {
        let src = "#define SQ(x) ((x) * (x))\nSQ(3);\n";
        assert_eq!(
            flat_texts(src),
            vec!["(", "(", "3", ")", "*", "(", "3", ")", ")", ";"]
        );
    }

    #[test]
    fn test_zero_parameter_macro() {
        let src = "#define F() 7\nF();\n";
        assert_eq!(flat_texts(src), vec!["7", ";"]);
    }

    #[test]
    fn test_nested_call_commas_do_not_split() {
        let src = "#define FIRST(a, b) a\nFIRST(f(1, 2), 3);\n";
        assert_eq!(flat_texts(src), vec!["f", "(", "1", ",", "2", ")", ";"]);
    }

    #[test]
    fn test_nested_expansion() {
        let src = "#define A B\n#define B 9\nA;\n";
        assert_eq!(flat_texts(src), vec!["9", ";"]);
    }

    #[test]
    fn test_self_recursion_is_blocked() {
        let src = "#define X X + 1\nX;\n";
        assert_eq!(flat_texts(src), vec!["X", "+", "1", ";"]);
    }

    #[test]
    fn test_mutual_recursion_is_finite() {
        // A -> B + A(painted); the painted A stops the cycle
        let src = "#define A B\n#define B A\nA;\n";
        let texts = flat_texts(src);
        assert_eq!(texts, vec!["A", ";"]);
    }

    #[test]
    fn test_stringification() {
        let src = "#define S(x) #x\nS(hello);\n";
        assert_eq!(flat_texts(src), vec!["\"hello\"", ";"]);
    }

    #[test]
    fn test_stringification_spaces_symbols() {
        let src = "#define S(x) #x\nS(a b);\n";
        assert_eq!(flat_texts(src), vec!["\"a b\"", ";"]);
    }

    #[test]
    fn test_token_pasting() {
        let src = "#define CAT(a, b) a##b\nint CAT(foo, 1);\n";
        assert_eq!(flat_texts(src), vec!["int", "foo1", ";"]);
    }

    #[test]
    fn test_pasted_token_is_a_symbol() {
        let src = "#define CAT(a, b) a##b\nCAT(foo, 1);\n";
        let tokens = tokenize("m.c", src).unwrap();
        let mut pre = Preprocessor::new();
        pre.add_lines(group_lines(&tokens));
        let out: Vec<_> = pre.run().unwrap().into_iter().flatten().collect();
        assert_eq!(out[0].text, "foo1");
        assert_eq!(out[0].kind, TokenKind::Symbol);
    }

    #[test]
    fn test_vararg_collects_rest() {
        let src = "#define CALL(f, ...) f(__VA_ARGS__)\nCALL(g, 1, 2, 3);\n";
        assert_eq!(
            flat_texts(src),
            vec!["g", "(", "1", ",", "2", ",", "3", ")", ";"]
        );
    }

    #[test]
    fn test_empty_argument() {
        let src = "#define PAIR(a, b) [a b]\nPAIR(, 2);\n";
        assert_eq!(flat_texts(src), vec!["[", "2", "]", ";"]);
    }

    #[test]
    fn test_multiline_invocation() {
        let src = "#define ADD(a, b) a + b\nADD(1,\n2);\n";
        assert_eq!(flat_texts(src), vec!["1", "+", "2", ";"]);
    }

    #[test]
    fn test_expansion_trail_is_recorded() {
        let src = "#define N 4\nN;\n";
        let tokens = tokenize("m.c", src).unwrap();
        let mut pre = Preprocessor::new();
        pre.add_lines(group_lines(&tokens));
        let out: Vec<_> = pre.run().unwrap().into_iter().flatten().collect();
        assert!(out[0].is_expanded_from("N"));
    }

    #[test]
    fn test_unterminated_arguments_is_fatal() {
        let src = "#define F(a) a\nF(1\n";
        let tokens = tokenize("m.c", src).unwrap();
        let mut pre = Preprocessor::new();
        pre.add_lines(group_lines(&tokens));
        assert!(matches!(
            pre.run(),
            Err(PreprocessError::UnterminatedMacroArguments { .. })
        ));
    }
}
