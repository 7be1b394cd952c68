//! Atlas CLI: the `atlas` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect {
            file,
            all_dense,
            json,
        } => commands::inspect::run(file, all_dense, json),

        Commands::Fill { file, json } => commands::fill::run(file, json),

        Commands::Transitions { file, json } => commands::transitions::run(file, json),

        Commands::BaseChange { file, field, json } => {
            commands::base_change::run(file, field, json)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
