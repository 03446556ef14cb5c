//! effmatch CLI entry point.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, Emit};
use effmatch::diagnostics::print_diagnostic;
use effmatch::{EffmatchDatabaseImpl, expand_with_diagnostics};
use effmatch_syntax::print_structure;
use salsa::Database;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Expand {
            file,
            runtime_module,
            emit,
        } => run(&file, &runtime_module, Some(emit)),
        Command::Check {
            file,
            runtime_module,
        } => run(&file, &runtime_module, None),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(path: &Path, runtime_module: &str, emit: Option<Emit>) -> ExitCode {
    EffmatchDatabaseImpl::default().attach(|db| {
        let file = match db.input(path, runtime_module) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };

        let result = expand_with_diagnostics(db, file);
        let display_path = path.display().to_string();
        for diag in &result.diagnostics {
            print_diagnostic(diag, file.text(db), &display_path);
        }
        if result.has_errors() {
            return ExitCode::FAILURE;
        }

        match (emit, &result.structure) {
            (Some(Emit::Source), Some(items)) => println!("{}", print_structure(items)),
            (Some(Emit::Tree), Some(items)) => println!("{items:#?}"),
            _ => {}
        }
        ExitCode::SUCCESS
    })
}
