//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the ranking/ensemble code stays clean and testable
//! - output changes are localized

use crate::domain::MisfitRanking;
use crate::ensemble::{MisfitEnsemble, MisfitMember};

const KEY_WIDTH: usize = 16;

/// Format a short summary of an ensemble file.
pub fn format_ensemble_summary(ensemble: &MisfitEnsemble) -> String {
    let keys = ensemble.obs_keys();
    let mut out = String::new();
    out.push_str("=== misfit ensemble ===\n");
    out.push_str(&format!(
        "Realizations: {} | history length: {} | keys: {}\n",
        ensemble.ens_size(),
        ensemble.history_length(),
        keys.len()
    ));
    if !keys.is_empty() {
        out.push_str(&format!("Keys: {}\n", keys.join(", ")));
    }
    out
}

/// Format the top `top_n` rows of a ranking as a table (lowest misfit first).
pub fn format_ranking(ranking: &MisfitRanking, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Misfit ranking over steps ({}, {}] ({} keys)\n",
        ranking.step1,
        ranking.step2,
        ranking.keys.len()
    ));

    out.push_str(format!("{:>5} {:>8} {:>14}", "rank", "iens", "total").trim_end());
    for key in &ranking.keys {
        out.push_str(&format!(" {:>KEY_WIDTH$}", truncate(key, KEY_WIDTH)));
    }
    out.push('\n');

    out.push_str(&format!("{:-<5} {:-<8} {:-<14}", "", "", ""));
    for _ in &ranking.keys {
        out.push_str(&format!(" {:-<KEY_WIDTH$}", ""));
    }
    out.push('\n');

    for entry in ranking.entries.iter().take(top_n) {
        out.push_str(&format!("{:>5} {:>8} {:>14.4}", entry.rank, entry.iens, entry.total));
        for key in &ranking.keys {
            match entry.per_key.get(key) {
                Some(v) => out.push_str(&format!(" {v:>KEY_WIDTH$.4}")),
                None => out.push_str(&format!(" {:>KEY_WIDTH$}", "-")),
            }
        }
        out.push('\n');
    }

    let hidden = ranking.entries.len().saturating_sub(top_n);
    if hidden > 0 {
        out.push_str(&format!("... {hidden} more realization(s)\n"));
    }
    out
}

/// Format every step of a member's series, one column per key.
pub fn format_member(member: &MisfitMember, keys: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Realization {} (history length {})\n",
        member.iens(),
        member.history_length()
    ));

    let series: Vec<_> = keys
        .iter()
        .filter_map(|k| member.series(k).map(|s| (k, s)))
        .collect();
    if series.is_empty() {
        out.push_str("(no misfit series)\n");
        return out;
    }

    out.push_str(&format!("{:>6}", "step"));
    for (key, _) in &series {
        out.push_str(&format!(" {:>KEY_WIDTH$}", truncate(key, KEY_WIDTH)));
    }
    out.push('\n');

    for step in 0..member.history_length() {
        out.push_str(&format!("{step:>6}"));
        for (_, s) in &series {
            out.push_str(&format!(" {:>KEY_WIDTH$.4}", s.iget(step)));
        }
        out.push('\n');
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
