//! Floe CLI - resolve flake references and manage registries

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
        EnvFilter::new("floe=debug")
    } else {
        EnvFilter::new("floe=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::List => commands::list::execute(&cli.overrides),
        Commands::Info(args) => commands::info::execute(args, &cli.overrides),
        Commands::Deps(args) => commands::deps::execute(args, &cli.overrides),
        Commands::Update(args) => commands::update::execute(args, &cli.overrides),
        Commands::Add(args) => commands::add::execute(args),
        Commands::Remove(args) => commands::remove::execute(args),
        Commands::Pin(args) => commands::pin::execute(args, &cli.overrides),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
