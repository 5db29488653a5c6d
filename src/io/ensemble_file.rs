//! Read/write misfit ensemble files.
//!
//! An ensemble file is exactly one `MisfitEnsemble` buffer record. Trailing bytes
//! after the record are tolerated but logged.

use std::path::Path;

use tracing::{debug, warn};

use crate::buffer::Buffer;
use crate::ensemble::MisfitEnsemble;
use crate::error::AppError;

/// Write an ensemble file.
pub fn write_ensemble_file(path: &Path, ensemble: &MisfitEnsemble) -> Result<(), AppError> {
    let mut buffer = Buffer::new();
    ensemble.buffer_fwrite(&mut buffer);
    buffer.store(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to write misfit ensemble '{}': {e}", path.display()),
        )
    })?;
    debug!(path = %path.display(), bytes = buffer.len(), "misfit ensemble written");
    Ok(())
}

/// Read an ensemble file.
pub fn read_ensemble_file(path: &Path) -> Result<MisfitEnsemble, AppError> {
    let mut buffer = Buffer::load(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open misfit ensemble '{}': {e}", path.display()),
        )
    })?;

    let ensemble = MisfitEnsemble::buffer_fread_alloc(&mut buffer).map_err(|e| {
        AppError::new(
            3,
            format!("Invalid misfit ensemble '{}': {e}", path.display()),
        )
    })?;

    if buffer.remaining() > 0 {
        warn!(
            path = %path.display(),
            trailing = buffer.remaining(),
            "ignoring trailing bytes after misfit ensemble record"
        );
    }
    Ok(ensemble)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("misfit_ts_{}_{name}", std::process::id()))
    }

    #[test]
    fn ensemble_file_round_trip() {
        let path = temp_path("round_trip.bin");
        let mut ens = MisfitEnsemble::new(3);
        ens.update(1, "FOPR", 2, 6.5);

        write_ensemble_file(&path, &ens).unwrap();
        let back = read_ensemble_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(back.history_length(), 3);
        assert_eq!(back.member(1).unwrap().series("FOPR").unwrap().as_slice(), &[0.0, 0.0, 6.5]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_ensemble_file(&temp_path("does_not_exist.bin")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn truncated_file_is_a_decode_error() {
        let path = temp_path("truncated.bin");
        let mut ens = MisfitEnsemble::new(8);
        ens.update(0, "FOPR", 7, 1.0);
        let mut buffer = Buffer::new();
        ens.buffer_fwrite(&mut buffer);
        let mut bytes = buffer.into_bytes();
        bytes.truncate(bytes.len() - 5);
        fs::write(&path, bytes).unwrap();

        let err = read_ensemble_file(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert_eq!(err.exit_code(), 3);
    }
}
