//! Shared pipeline logic behind the CLI subcommands.
//!
//! Keeping this in one place avoids mixing the workflow with presentation:
//! sample -> write file, and read file -> rank -> export.

use tracing::info;

use crate::domain::{MisfitRanking, RankConfig, SampleConfig};
use crate::ensemble::MisfitEnsemble;
use crate::error::AppError;

/// Generate a synthetic ensemble and write it to `config.out`.
pub fn run_sample(config: &SampleConfig) -> Result<MisfitEnsemble, AppError> {
    let ensemble = crate::data::generate_ensemble(config)?;
    crate::io::write_ensemble_file(&config.out, &ensemble)?;
    info!(path = %config.out.display(), "sample written");
    Ok(ensemble)
}

/// Read the ensemble named in `config`, rank it, and write any exports.
pub fn run_rank(config: &RankConfig) -> Result<MisfitRanking, AppError> {
    let ensemble = crate::io::read_ensemble_file(&config.ensemble_path)?;
    run_rank_on(&ensemble, config)
}

/// Rank an already loaded ensemble and write any exports.
pub fn run_rank_on(
    ensemble: &MisfitEnsemble,
    config: &RankConfig,
) -> Result<MisfitRanking, AppError> {
    let ranking =
        crate::report::rank_misfit(ensemble, &config.obs_keys, config.step1, config.step2)?;

    if let Some(path) = &config.export_csv {
        crate::io::write_ranking_csv(path, &ranking)?;
        info!(path = %path.display(), "ranking CSV exported");
    }
    if let Some(path) = &config.export_json {
        crate::io::write_ranking_json(path, &ranking, &config.ensemble_path)?;
        info!(path = %path.display(), "ranking JSON exported");
    }
    Ok(ranking)
}
