//! Doclify CLI
//!
//! Markdown document quality gate: checks structural and stylistic defects,
//! mechanically repairs a safe subset of them.

mod cli;
mod commands;
mod fix;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, RulesCommands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(gate_failed) => {
            if gate_failed {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Check(args) => commands::check::run_check(&cli, args),
        Commands::Rules { command } => match command {
            RulesCommands::List => commands::rules::run_list().map(|_| false),
        },
        Commands::Init { force } => commands::init::run_init(*force).map(|_| false),
    }
}
