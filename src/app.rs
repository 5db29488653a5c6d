//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into run configs
//! - dispatches to the pipeline and prints reports

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, RankArgs, SampleArgs, ShowArgs};
use crate::domain::{RankConfig, SampleConfig};
use crate::ensemble::MisfitEnsemble;
use crate::error::AppError;

pub mod pipeline;

const DEFAULT_LOG_FILTER: &str = "misfit_ts=info";

/// Entry point for the `misfit` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; it only supplies RUST_LOG overrides.
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Sample(args) => handle_sample(&args),
        Command::Rank(args) => handle_rank(&args),
        Command::Show(args) => handle_show(&args),
    }
}

/// Initialize `tracing` to stderr. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Ignore the error when a subscriber is already installed (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(args);
    let ensemble = pipeline::run_sample(&config)?;
    println!("{}", crate::report::format_ensemble_summary(&ensemble));
    println!("Wrote {}", config.out.display());
    Ok(())
}

fn handle_rank(args: &RankArgs) -> Result<(), AppError> {
    let ensemble = crate::io::read_ensemble_file(&args.file)?;
    let config = rank_config_from_args(args, ensemble.history_length())?;
    let ranking = pipeline::run_rank_on(&ensemble, &config)?;

    println!("{}", crate::report::format_ensemble_summary(&ensemble));
    println!("{}", crate::report::format_ranking(&ranking, config.top_n));
    Ok(())
}

fn handle_show(args: &ShowArgs) -> Result<(), AppError> {
    let ensemble = crate::io::read_ensemble_file(&args.file)?;
    let table = show_member(&ensemble, args.iens, &args.keys, &args.file)?;
    println!("{table}");
    Ok(())
}

/// Format one realization's step table; an empty `keys` shows every key it has.
///
/// `source` only names the ensemble file in the error for an unknown `iens`.
pub fn show_member(
    ensemble: &MisfitEnsemble,
    iens: usize,
    keys: &[String],
    source: &Path,
) -> Result<String, AppError> {
    let member = ensemble.member(iens).ok_or_else(|| {
        AppError::new(2, format!("Realization {iens} is not in '{}'.", source.display()))
    })?;

    let keys: Vec<String> = if keys.is_empty() {
        member.keys().map(str::to_string).collect()
    } else {
        keys.to_vec()
    };
    Ok(crate::report::format_member(member, &keys))
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        ens_size: args.ens_size,
        history_length: args.history_length,
        obs_keys: args.keys.clone(),
        seed: args.seed,
        noise_std: args.noise_std,
        bias_std: args.bias_std,
        out: args.out.clone(),
    }
}

/// Build a ranking config; `--step2` defaults to the last report step.
pub fn rank_config_from_args(
    args: &RankArgs,
    history_length: usize,
) -> Result<RankConfig, AppError> {
    let step2 = match args.step2 {
        Some(step) => step,
        None => history_length.checked_sub(1).ok_or_else(|| {
            AppError::new(2, "Ensemble has zero report steps; nothing to rank.")
        })?,
    };

    Ok(RankConfig {
        ensemble_path: args.file.clone(),
        obs_keys: args.keys.clone(),
        step1: args.step1,
        step2,
        top_n: args.top,
        export_csv: args.export_csv.clone(),
        export_json: args.export_json.clone(),
    })
}
