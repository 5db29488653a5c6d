//! Synthetic misfit ensemble generation.
//!
//! Each realization gets a residual bias drawn once, and every report step adds
//! fresh noise on top of it. The stored misfit is the squared residual, so
//! values are non-negative and realizations with a large bias rank poorly.
//!
//! Every realization has its own RNG stream derived from the run seed. The
//! output is therefore identical whether members are built in parallel or not.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;
use tracing::info;

use crate::domain::SampleConfig;
use crate::ensemble::{MisfitEnsemble, MisfitMember};
use crate::error::AppError;

/// Generate a synthetic ensemble according to `config`.
pub fn generate_ensemble(config: &SampleConfig) -> Result<MisfitEnsemble, AppError> {
    validate(config)?;

    let members = (0..config.ens_size)
        .into_par_iter()
        .map(|iens| generate_member(config, iens))
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut ensemble = MisfitEnsemble::new(config.history_length);
    for member in members {
        ensemble.insert_member(member);
    }

    info!(
        ens_size = config.ens_size,
        history_length = config.history_length,
        keys = config.obs_keys.len(),
        seed = config.seed,
        "synthetic misfit ensemble generated"
    );
    Ok(ensemble)
}

fn validate(config: &SampleConfig) -> Result<(), AppError> {
    if config.ens_size == 0 {
        return Err(AppError::new(2, "Ensemble size must be > 0."));
    }
    if config.history_length == 0 {
        return Err(AppError::new(2, "History length must be > 0."));
    }
    if config.obs_keys.is_empty() {
        return Err(AppError::new(2, "At least one observation key is required."));
    }
    if let Some(key) = config.obs_keys.iter().find(|k| k.trim().is_empty()) {
        return Err(AppError::new(2, format!("Invalid observation key '{key}'.")));
    }
    for (name, value) in [("noise", config.noise_std), ("bias", config.bias_std)] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid {name} standard deviation: {value} (must be finite and >= 0)."),
            ));
        }
    }
    Ok(())
}

fn generate_member(config: &SampleConfig, iens: usize) -> Result<MisfitMember, AppError> {
    let mut rng = StdRng::seed_from_u64(realization_seed(config.seed, iens));
    let bias_dist = Normal::new(0.0, config.bias_std)
        .map_err(|e| AppError::new(4, format!("Bias distribution error: {e}")))?;
    let noise_dist = Normal::new(0.0, config.noise_std)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut member = MisfitMember::new(iens, config.history_length);
    for key in &config.obs_keys {
        let bias = bias_dist.sample(&mut rng);
        let series = member.series_mut(key);
        for step in 0..config.history_length {
            let residual = bias + noise_dist.sample(&mut rng);
            series.iset(step, residual * residual);
        }
    }
    Ok(member)
}

/// Derive a per-realization seed (splitmix64 finalizer over `seed + iens`).
fn realization_seed(seed: u64, iens: usize) -> u64 {
    let offset = (iens as u64).wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    let mut z = seed.wrapping_add(offset);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
