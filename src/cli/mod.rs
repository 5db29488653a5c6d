//! Command-line parsing for the misfit ensemble tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! ensemble/ranking code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "misfit", version, about = "Per-realization misfit time series tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic misfit ensemble and write it to a file.
    Sample(SampleArgs),
    /// Rank realizations by total misfit over a report-step window.
    Rank(RankArgs),
    /// Print the per-step misfit series of one realization.
    Show(ShowArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Number of realizations.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub ens_size: usize,

    /// Number of report steps per series.
    #[arg(short = 'l', long, default_value_t = 50)]
    pub history_length: usize,

    /// Observation key (repeatable).
    #[arg(short = 'k', long = "key", required = true)]
    pub keys: Vec<String>,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of the per-step residual noise.
    #[arg(long, default_value_t = 1.0)]
    pub noise_std: f64,

    /// Standard deviation of the per-realization residual bias.
    #[arg(long, default_value_t = 1.0)]
    pub bias_std: f64,

    /// Output ensemble file.
    #[arg(short = 'o', long)]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RankArgs {
    /// Ensemble file written by `misfit sample` (or any compatible writer).
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Window start; this step itself is not included.
    #[arg(long, default_value_t = 0)]
    pub step1: usize,

    /// Window end (inclusive). Defaults to the last report step.
    #[arg(long)]
    pub step2: Option<usize>,

    /// Observation key to include (repeatable). Default: all keys.
    #[arg(short = 'k', long = "key")]
    pub keys: Vec<String>,

    /// Number of rows to print.
    #[arg(short = 't', long, default_value_t = 10)]
    pub top: usize,

    /// Optional CSV export of the full ranking.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Optional JSON export of the full ranking.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Realization id.
    #[arg(short = 'i', long)]
    pub iens: usize,

    /// Observation key to show (repeatable). Default: all of the member's keys.
    #[arg(short = 'k', long = "key")]
    pub keys: Vec<String>,
}
