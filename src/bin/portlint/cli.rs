//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Portlint - post-build validation for vcpkg-style package trees
#[derive(Parser)]
#[command(name = "portlint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate an installed package tree
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Package spec to validate, as `<name>:<triplet>` (e.g. zlib:x64-windows)
    pub spec: String,

    /// Root directory holding packages/, buildtrees/ and ports/
    #[arg(long, env = "PORTLINT_ROOT")]
    pub root: PathBuf,

    /// Configuration file (defaults to <root>/portlint.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
