//! cdcr - cross-document coreference annotation CLI
//!
//! Inspect annotation tasks and preview the writes an answer would make.
//!
//! # Usage
//!
//! ```bash
//! # What does this task ask?
//! cdcr question task.json
//!
//! # Show the science paper with the primary and secondary mentions marked
//! cdcr render task.json --side science
//!
//! # Which judgments would answering "yes" write?
//! cdcr plan task.json --answer yes --selection sel.json
//!
//! # Check a batch of task files
//! cdcr validate tasks/*.json
//! ```

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

mod commands;
mod output;
mod parser;
mod utils;

use output::color;
use parser::{Cli, Commands};

/// Route library `log` records and our own spans to stderr.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    use clap_complete::generate;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match utils::load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?settings, "loaded settings");

    let result: Result<(), String> = match cli.command {
        Commands::Render(args) => commands::render::run(args, &settings),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Question(args) => commands::question::run(args),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "cdcr", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}
