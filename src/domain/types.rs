//! Shared domain types.
//!
//! Configs are plain structs derived from CLI flags (plus defaults) so the
//! pipeline can be driven from tests without going through argument parsing.
//! Ranking outputs are serializable so they can be exported to JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Settings for generating a synthetic misfit ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    /// Number of realizations.
    pub ens_size: usize,
    /// Report steps per series.
    pub history_length: usize,
    /// Observation keys; every realization gets one series per key.
    pub obs_keys: Vec<String>,
    pub seed: u64,
    /// Standard deviation of the per-step residual noise.
    pub noise_std: f64,
    /// Standard deviation of the per-realization residual bias.
    ///
    /// Larger values spread the realizations further apart in total misfit.
    pub bias_std: f64,
    pub out: PathBuf,
}

/// Settings for a ranking run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankConfig {
    pub ensemble_path: PathBuf,
    /// Keys to sum over. Empty means every key present in the ensemble.
    pub obs_keys: Vec<String>,
    pub step1: usize,
    pub step2: usize,
    pub top_n: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// One realization's row in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// 1-based position after sorting (lowest misfit first).
    pub rank: usize,
    pub iens: usize,
    pub total: f64,
    pub per_key: BTreeMap<String, f64>,
}

/// Realizations ordered by total misfit over `(step1, step2]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MisfitRanking {
    pub step1: usize,
    pub step2: usize,
    pub keys: Vec<String>,
    pub entries: Vec<RankingEntry>,
}

impl MisfitRanking {
    pub fn best(&self) -> Option<&RankingEntry> {
        self.entries.first()
    }

    pub fn entry_for(&self, iens: usize) -> Option<&RankingEntry> {
        self.entries.iter().find(|e| e.iens == iens)
    }
}
