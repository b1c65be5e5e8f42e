//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// Floe - resolve flake references and manage registries
#[derive(Parser)]
#[command(name = "floe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override a registry alias for this invocation (alias=flake-ref)
    #[arg(long = "override", global = true, value_name = "ALIAS=REF")]
    pub overrides: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registry entries of all tiers
    List,

    /// Show info about a flake
    Info(InfoArgs),

    /// List a flake's resolved dependencies
    Deps(DepsArgs),

    /// Update a path flake's lock file
    Update(UpdateArgs),

    /// Upsert a flake alias in the user registry
    Add(AddArgs),

    /// Remove a flake alias from the user registry
    Remove(RemoveArgs),

    /// Pin a flake alias to its resolved target in the user registry
    Pin(PinArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    /// Flake reference to inspect
    #[arg(default_value = ".")]
    pub flake_ref: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Flake reference to resolve
    #[arg(default_value = ".")]
    pub flake_ref: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Path flake whose lock to update
    #[arg(default_value = ".")]
    pub flake_ref: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Alias to register
    pub alias: String,

    /// Flake reference the alias maps to
    pub flake_ref: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Alias to remove
    pub alias: String,
}

#[derive(Args)]
pub struct PinArgs {
    /// Alias to pin
    pub alias: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
