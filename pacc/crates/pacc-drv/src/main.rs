//! The `pacc` command: run the C front-end over one translation unit.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pacc_drv::Config;

/// C front-end: preprocess and parse a single translation unit.
#[derive(Parser, Debug)]
#[command(name = "pacc")]
#[command(version)]
#[command(about = "C front-end: translation phases 1-7", long_about = None)]
struct Cli {
    /// Add a directory to the <...> include search path (appended in
    /// order).
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Run through the preprocessor phase and print the expanded tokens.
    #[arg(short = 'p')]
    preprocess: bool,

    /// Run through the parser phase.
    #[arg(short = 'a')]
    analyze: bool,

    /// The source file to process.
    input: PathBuf,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().without_time().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let config = Config {
        input: cli.input,
        include_dirs: cli.include,
        print_preprocessed: cli.preprocess,
        run_parser: cli.analyze,
    };

    if let Err(error) = pacc_drv::run(&config) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
