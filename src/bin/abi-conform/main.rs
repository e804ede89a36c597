//! abi-conform CLI - ABI conformance checks for structure bindings

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("abi_conform=debug")
    } else {
        EnvFilter::new("abi_conform=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Check(args) => commands::check::execute(args, cli.verbose),
        Commands::List(args) => commands::list::execute(args),
        Commands::Source(args) => commands::source::execute(args),
        Commands::Probe(args) => commands::probe::execute(args),
        Commands::Toolchain(args) => commands::toolchain::execute(args),
    }
}
