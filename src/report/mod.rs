//! Reporting utilities: misfit ranking and formatted terminal output.

pub mod format;

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{MisfitRanking, RankingEntry};
use crate::ensemble::MisfitEnsemble;
use crate::error::AppError;
use crate::series::check_step_range;

pub use format::*;

/// Rank realizations by total misfit over `(step1, step2]`, lowest first.
///
/// `keys` selects the observation keys to sum; an empty slice means every key in
/// the ensemble. Repeated keys are summed once, keeping first-listed order. The
/// window is validated up front so a bad user-supplied range becomes an error
/// instead of a panic inside the evaluation.
pub fn rank_misfit(
    ensemble: &MisfitEnsemble,
    keys: &[String],
    step1: usize,
    step2: usize,
) -> Result<MisfitRanking, AppError> {
    check_step_range(step1, step2, ensemble.history_length())?;

    let known = ensemble.obs_keys();
    let keys: Vec<String> = if keys.is_empty() {
        known
    } else {
        for key in keys.iter().filter(|k| !known.contains(*k)) {
            warn!(key = %key, "observation key not present in any realization");
        }
        let mut seen = BTreeSet::new();
        keys.iter().filter(|k| seen.insert(k.as_str())).cloned().collect()
    };

    if ensemble.ens_size() == 0 {
        return Err(AppError::new(3, "Ensemble has no realizations to rank."));
    }

    let members: Vec<_> = ensemble.members().collect();
    let mut entries: Vec<RankingEntry> = members
        .par_iter()
        .map(|member| {
            let per_key: BTreeMap<String, f64> = keys
                .iter()
                .filter_map(|key| {
                    member
                        .series(key)
                        .map(|s| (key.clone(), s.eval(step1, step2)))
                })
                .collect();
            RankingEntry {
                rank: 0,
                iens: member.iens(),
                total: per_key.values().sum(),
                per_key,
            }
        })
        .collect();

    entries.sort_by(|a, b| a.total.total_cmp(&b.total).then(a.iens.cmp(&b.iens)));
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }

    info!(
        realizations = entries.len(),
        keys = keys.len(),
        step1,
        step2,
        "misfit ranking computed"
    );

    Ok(MisfitRanking {
        step1,
        step2,
        keys,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensemble() -> MisfitEnsemble {
        let mut ens = MisfitEnsemble::new(5);
        ens.update(0, "A", 2, 4.0);
        ens.update(0, "B", 3, 1.0);
        ens.update(1, "A", 1, 0.5);
        ens.update(2, "A", 4, 2.0);
        ens.update(2, "B", 4, 3.0);
        ens
    }

    #[test]
    fn ranking_is_sorted_ascending_with_ranks() {
        let ranking = rank_misfit(&ensemble(), &[], 0, 4).unwrap();
        let order: Vec<usize> = ranking.entries.iter().map(|e| e.iens).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert_eq!(ranking.entries[0].rank, 1);
        assert_eq!(ranking.entries[2].rank, 3);
        assert_eq!(ranking.keys, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(ranking.entry_for(0).unwrap().total, 5.0);
        assert_eq!(ranking.entry_for(2).unwrap().per_key["B"], 3.0);
    }

    #[test]
    fn window_excludes_first_step() {
        let ranking = rank_misfit(&ensemble(), &["A".to_string()], 1, 2).unwrap();
        assert_eq!(ranking.entry_for(1).unwrap().total, 0.0);
        assert_eq!(ranking.entry_for(0).unwrap().total, 4.0);
    }

    #[test]
    fn repeated_keys_are_summed_once() {
        let mut ens = MisfitEnsemble::new(3);
        ens.update(0, "A", 1, 1.0);
        ens.update(0, "A", 2, 1.0);
        let keys = vec!["A".to_string(), "A".to_string()];

        let ranking = rank_misfit(&ens, &keys, 0, 2).unwrap();
        assert_eq!(ranking.keys, vec!["A".to_string()]);

        let member = ens.member(0).unwrap();
        assert_eq!(ranking.entry_for(0).unwrap().total, 2.0);
        assert_eq!(ranking.entry_for(0).unwrap().total, member.eval(&keys, 0, 2));
    }

    #[test]
    fn ties_are_broken_by_realization() {
        let mut ens = MisfitEnsemble::new(3);
        ens.update(4, "A", 1, 1.0);
        ens.update(2, "A", 2, 1.0);
        let ranking = rank_misfit(&ens, &[], 0, 2).unwrap();
        assert_eq!(ranking.best().unwrap().iens, 2);
    }

    #[test]
    fn invalid_window_is_an_input_error() {
        let err = rank_misfit(&ensemble(), &[], 3, 1).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = rank_misfit(&ensemble(), &[], 0, 5).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_ensemble_cannot_be_ranked() {
        let err = rank_misfit(&MisfitEnsemble::new(3), &[], 0, 1).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
