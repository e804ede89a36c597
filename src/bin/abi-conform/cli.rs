//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// abi-conform - Check structure bindings against the platform's C headers
#[derive(Parser)]
#[command(name = "abi-conform")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check structure layouts against the system headers
    Check(CheckArgs),

    /// List the structures in the conformance matrix
    List(ListArgs),

    /// Print the generated assertion source for a structure
    Source(SourceArgs),

    /// Probe whether headers can be included
    Probe(ProbeArgs),

    /// Show the C toolchain used for checks
    Toolchain(ToolchainArgs),
}

#[derive(Args)]
pub struct CatalogArg {
    /// Binding catalog file (defaults to the built-in Linux catalog)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Structures to check (defaults to the whole matrix)
    pub structures: Vec<String>,

    #[command(flatten)]
    pub catalog: CatalogArg,

    /// Output format: human, json, github
    #[arg(long, default_value = "human")]
    pub format: String,

    /// Number of parallel compiles
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Skip structures that have no capability record
    #[arg(long)]
    pub strict_unknown: bool,

    /// Target triple to compile for
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub catalog: CatalogArg,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Structure name
    pub structure: String,

    #[command(flatten)]
    pub catalog: CatalogArg,
}

#[derive(Args)]
pub struct ProbeArgs {
    /// Header paths, probed in order (e.g. sys/socket.h)
    #[arg(required = true)]
    pub headers: Vec<String>,

    /// Target triple to compile for
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ToolchainArgs {
    /// Target triple to compile for
    #[arg(long)]
    pub target: Option<String>,
}
