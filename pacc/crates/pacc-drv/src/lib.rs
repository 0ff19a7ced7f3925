//! pacc-drv - Front-end driver.
//!
//! Orchestrates one translation unit through the pipeline:
//!
//! ```text
//! file bytes -> lexer -> tokens -> line grouper -> logical lines
//!            -> preprocessor -> expanded token stream
//!            -> string concatenation -> final token stream
//!            -> parser -> AST
//! ```
//!
//! Every stage is created fresh per run; nothing is shared between
//! translation units.

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use pacc_lex::Token;
use pacc_pre::{concat_strings, group_lines, tokens_into_str, Preprocessor};

/// What to run and where to look for headers.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// The translation unit to process.
    pub input: PathBuf,
    /// Extra `<...>` include directories (`-I`), appended in order.
    pub include_dirs: Vec<PathBuf>,
    /// Print the preprocessed token lines (`-p`).
    pub print_preprocessed: bool,
    /// Run the parser phase (`-a`).
    pub run_parser: bool,
}

/// Everything a front-end run produces.
pub struct FrontEndOutput {
    /// The final token stream (preprocessed, strings concatenated).
    pub tokens: Vec<Token>,
    /// The AST, when the parser phase ran.
    pub ast: Option<pacc_par::Ast>,
}

/// Run the front-end over one translation unit.
pub fn run(config: &Config) -> Result<FrontEndOutput> {
    debug!("lexing {}", config.input.display());
    let tokens = pacc_lex::tokenize_file(&config.input)?;

    let lines = group_lines(&tokens);

    debug!("preprocessing {} logical lines", lines.len());
    let mut preprocessor = Preprocessor::new();
    for dir in &config.include_dirs {
        preprocessor.add_include_dir(dir.clone());
    }
    preprocessor.add_lines(lines);
    let out_lines = preprocessor.run()?;

    if config.print_preprocessed {
        for line in &out_lines {
            println!("{}", tokens_into_str(line));
        }
    }

    let flat: Vec<Token> = out_lines.into_iter().flatten().collect();
    let tokens = concat_strings(flat);

    let ast = if config.run_parser {
        debug!("parsing {} tokens", tokens.len());
        Some(pacc_par::parse(&tokens)?)
    } else {
        None
    };

    Ok(FrontEndOutput { tokens, ast })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_pipeline_to_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t.c");
        fs::write(&input, "#define GREETING \"hi \" \"there\"\nGREETING;\n").unwrap();

        let config = Config {
            input,
            ..Config::default()
        };
        let output = run(&config).unwrap();

        // macro expanded, then adjacent strings fused
        let texts: Vec<&str> = output.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["\"hi there\"", ";"]);
        assert!(output.ast.is_none());
    }

    #[test]
    fn test_pipeline_to_ast() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t.c");
        fs::write(&input, "int main() { return 0; }\n").unwrap();

        let config = Config {
            input,
            run_parser: true,
            ..Config::default()
        };
        let output = run(&config).unwrap();

        let ast = output.ast.unwrap();
        assert!(ast.root_symbol("main").is_some());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = Config {
            input: PathBuf::from("/nonexistent/definitely_missing.c"),
            ..Config::default()
        };
        assert!(run(&config).is_err());
    }
}
