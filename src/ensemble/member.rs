//! One realization's misfit record: observation key -> misfit series.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::buffer::{Buffer, BufferError};
use crate::series::MisfitSeries;
use crate::store::ErasedStore;

/// Misfit series for a single realization, keyed by observation key.
///
/// Series are held in an [`ErasedStore`] and allocated lazily on the first update
/// of a key, always with the member's history length.
#[derive(Debug)]
pub struct MisfitMember {
    iens: usize,
    history_length: usize,
    series: ErasedStore<String>,
}

impl MisfitMember {
    pub fn new(iens: usize, history_length: usize) -> Self {
        Self {
            iens,
            history_length,
            series: ErasedStore::new(),
        }
    }

    pub fn iens(&self) -> usize {
        self.iens
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// Set the misfit of `key` at `step`, allocating the key's series if needed.
    ///
    /// # Panics
    /// Panics if `step >= self.history_length()`.
    pub fn update(&mut self, key: &str, step: usize, value: f64) {
        self.series_mut(key).iset(step, value);
    }

    /// Series for `key`, allocating a zeroed one on first access.
    pub fn series_mut(&mut self, key: &str) -> &mut MisfitSeries {
        let key = key.to_string();
        if !self.series.contains_key(&key) {
            self.series
                .insert_owned(key.clone(), MisfitSeries::alloc(self.history_length));
        }
        self.series
            .get_mut::<MisfitSeries>(&key)
            .unwrap_or_else(|| unreachable!("member store only holds misfit series"))
    }

    pub fn series(&self, key: &str) -> Option<&MisfitSeries> {
        self.series.get::<MisfitSeries>(&key.to_string())
    }

    /// Observation keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn key_count(&self) -> usize {
        self.series.len()
    }

    /// Total misfit over `(step1, step2]` summed across `keys`.
    ///
    /// Each distinct key counts once, however often it is listed. Keys this
    /// member has no series for contribute nothing.
    ///
    /// # Panics
    /// Panics on an invalid window, like [`MisfitSeries::eval`].
    pub fn eval<S: AsRef<str>>(&self, keys: &[S], step1: usize, step2: usize) -> f64 {
        let distinct: BTreeSet<&str> = keys.iter().map(AsRef::as_ref).collect();
        distinct
            .into_iter()
            .filter_map(|key| self.series(key))
            .map(|s| s.eval(step1, step2))
            .sum()
    }

    /// Append `iens, history_length, n_keys` then `(key, series)` pairs.
    pub fn buffer_fwrite(&self, buffer: &mut Buffer) {
        buffer.fwrite_len(self.iens);
        buffer.fwrite_len(self.history_length);
        buffer.fwrite_len(self.series.len());
        for key in self.series.keys() {
            buffer.fwrite_string(key);
            if let Some(series) = self.series.get::<MisfitSeries>(key) {
                series.buffer_fwrite(buffer);
            }
        }
    }

    pub fn buffer_fread_alloc(buffer: &mut Buffer) -> Result<Self, BufferError> {
        let iens = buffer.fread_len()?;
        let history_length = buffer.fread_len()?;
        let n_keys = buffer.fread_len()?;

        let mut member = Self::new(iens, history_length);
        for _ in 0..n_keys {
            let key = buffer.fread_string()?;
            let series = MisfitSeries::buffer_fread_alloc(buffer)?;
            if series.len() != history_length {
                return Err(BufferError::LengthMismatch {
                    expected: history_length,
                    found: series.len(),
                });
            }
            if member.series.contains_key(&key) {
                warn!(iens, key = %key, "duplicate observation key in member record; keeping last");
            }
            member.series.insert_owned(key, series);
        }

        debug!(iens, keys = n_keys, "misfit member read");
        Ok(member)
    }
}
