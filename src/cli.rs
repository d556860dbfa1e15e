use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Discrete Markov chain estimator and sampler.
#[derive(Parser)]
#[command(
    name = "alea",
    version,
    about = "Estimate and sample discrete Markov chains"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Estimate a transition matrix from a stream of integer symbols.
    Analyze(AnalyzeArgs),
    /// Generate a trajectory of states from a transition matrix.
    Sample(SampleArgs),
    /// Drive an estimator and a sampler with message lines.
    Session(SessionArgs),
}

/// Arguments for the `analyze` subcommand.
#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// Symbol file (whitespace or comma separated integers), `-` for stdin.
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the maximum number of distinct symbols.
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Chain order: 1 conditions on the last symbol, 2 on the last two.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub order: u8,

    /// Write a JSON report (symbols, counts, matrix) to this path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `sample` subcommand.
#[derive(clap::Args)]
pub struct SampleArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Load the matrix from a JSON report written by `analyze --output`.
    #[arg(short, long)]
    pub matrix: Option<PathBuf>,

    /// Override the RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Override the number of states to draw.
    #[arg(short = 'n', long)]
    pub steps: Option<usize>,

    /// Override the 1-indexed initial state.
    #[arg(long)]
    pub state: Option<usize>,

    /// Print the report's symbols instead of state numbers (needs --matrix).
    #[arg(long, requires = "matrix")]
    pub symbols: bool,
}

/// Arguments for the `session` subcommand.
#[derive(clap::Args)]
pub struct SessionArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Message script, `-` for stdin.
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,
}
