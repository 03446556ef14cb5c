//! Command-line interface for the effmatch rewriter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use effmatch::DEFAULT_RUNTIME_MODULE;

#[derive(Parser)]
#[command(name = "effmatch")]
#[command(about = "Lower effect-pattern match/try onto a deep-handler runtime", long_about = None)]
pub struct Cli {
    /// Log what gets rewritten (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Expand a file and print the result
    Expand {
        file: PathBuf,

        /// Root module of the effect runtime
        #[arg(long, default_value = DEFAULT_RUNTIME_MODULE)]
        runtime_module: String,

        #[arg(long, value_enum, default_value_t = Emit::Source)]
        emit: Emit,
    },
    /// Only report diagnostics
    Check {
        file: PathBuf,

        #[arg(long, default_value = DEFAULT_RUNTIME_MODULE)]
        runtime_module: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Printed source
    Source,
    /// Debug dump of the syntax tree
    Tree,
}
