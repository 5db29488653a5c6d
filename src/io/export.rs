//! Export misfit rankings to CSV or JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream scripts;
//! the JSON keeps the full ranking plus run metadata.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::MisfitRanking;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct RankingFile<'a> {
    tool: &'static str,
    generated_at: DateTime<Utc>,
    source: String,
    #[serde(flatten)]
    ranking: &'a MisfitRanking,
}

/// Write the ranking to a CSV file: `rank,iens,total,<key...>`.
///
/// Keys like `BPR:1,1,1` contain commas and are quoted by the writer. A key the
/// realization has no series for leaves its cell empty.
pub fn write_ranking_csv(path: &Path, ranking: &MisfitRanking) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    let mut header = vec!["rank".to_string(), "iens".to_string(), "total".to_string()];
    header.extend(ranking.keys.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for entry in &ranking.entries {
        let mut row = vec![
            entry.rank.to_string(),
            entry.iens.to_string(),
            format!("{:.10}", entry.total),
        ];
        for key in &ranking.keys {
            row.push(
                entry
                    .per_key
                    .get(key)
                    .map(|v| format!("{v:.10}"))
                    .unwrap_or_default(),
            );
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer.flush().map_err(|e| {
        AppError::new(2, format!("Failed to flush export CSV '{}': {e}", path.display()))
    })?;
    Ok(())
}

/// Write the ranking plus metadata to a JSON file.
pub fn write_ranking_json(
    path: &Path,
    ranking: &MisfitRanking,
    source: &Path,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display()))
    })?;

    let doc = RankingFile {
        tool: "misfit",
        generated_at: Utc::now(),
        source: source.display().to_string(),
        ranking,
    };
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;

    Ok(())
}
