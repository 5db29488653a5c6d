//! Per-realization misfit time series.
//!
//! A `MisfitSeries` holds one non-negative misfit value per report step. Its length
//! (the history length) is fixed when the series is created.
//!
//! Aggregation convention for [`MisfitSeries::eval`]: the sum covers the half-open
//! step range `(step1, step2]`, i.e. the misfit accrued *after* checkpoint `step1`
//! up to and including checkpoint `step2`. Windows that share an endpoint never
//! double count a step, and `eval(k, k)` is `0.0`.

use thiserror::Error;
use tracing::{debug, trace};

use crate::buffer::{Buffer, BufferError};
use crate::store::{Handle, Release};

/// An `eval` window that does not satisfy `step1 <= step2 < len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepRangeError {
    #[error("step1={step1} is after step2={step2}")]
    Reversed { step1: usize, step2: usize },

    #[error("step {step} is out of range for history length {len}")]
    OutOfRange { step: usize, len: usize },
}

/// Fixed-length sequence of per-step misfit values.
#[derive(Debug, Clone, PartialEq)]
pub struct MisfitSeries {
    data: Box<[f64]>,
}

impl MisfitSeries {
    /// A series of `history_length` steps, all zero.
    pub fn alloc(history_length: usize) -> Self {
        Self {
            data: vec![0.0; history_length].into_boxed_slice(),
        }
    }

    /// Read a series written by [`MisfitSeries::buffer_fwrite`] from the cursor.
    ///
    /// On success the cursor is left just past the record. On failure it is
    /// restored to where the record started and no series is produced.
    pub fn buffer_fread_alloc(buffer: &mut Buffer) -> Result<Self, BufferError> {
        let start = buffer.position();
        let result = buffer
            .fread_len()
            .and_then(|len| buffer.fread_doubles(len));

        match result {
            Ok(values) => {
                debug!(len = values.len(), offset = start, "misfit series read");
                Ok(Self {
                    data: values.into_boxed_slice(),
                })
            }
            Err(e) => {
                buffer.seek(start);
                Err(e)
            }
        }
    }

    /// Append the series as `len:i32` followed by `len` doubles.
    pub fn buffer_fwrite(&self, buffer: &mut Buffer) {
        buffer.fwrite_len(self.data.len());
        buffer.fwrite_doubles(&self.data);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Overwrite the value at `time_index`.
    ///
    /// # Panics
    /// Panics if `time_index >= self.len()`.
    pub fn iset(&mut self, time_index: usize, value: f64) {
        let len = self.data.len();
        assert!(
            time_index < len,
            "misfit series index {time_index} out of bounds for history length {len}"
        );
        self.data[time_index] = value;
    }

    /// # Panics
    /// Panics if `time_index >= self.len()`.
    pub fn iget(&self, time_index: usize) -> f64 {
        let len = self.data.len();
        assert!(
            time_index < len,
            "misfit series index {time_index} out of bounds for history length {len}"
        );
        self.data[time_index]
    }

    /// Validate an aggregation window against this series.
    pub fn check_range(&self, step1: usize, step2: usize) -> Result<(), StepRangeError> {
        check_step_range(step1, step2, self.data.len())
    }

    /// Sum of the misfit over `(step1, step2]`.
    ///
    /// # Panics
    /// Panics if `step1 > step2` or `step2 >= self.len()`. Use
    /// [`MisfitSeries::try_eval`] when the window comes from user input.
    pub fn eval(&self, step1: usize, step2: usize) -> f64 {
        match self.try_eval(step1, step2) {
            Ok(sum) => sum,
            Err(e) => panic!("invalid misfit window: {e}"),
        }
    }

    pub fn try_eval(&self, step1: usize, step2: usize) -> Result<f64, StepRangeError> {
        self.check_range(step1, step2)?;
        Ok(self.data[step1 + 1..=step2].iter().sum())
    }
}

/// Check `step1 <= step2 < len` without needing a series instance.
pub fn check_step_range(step1: usize, step2: usize, len: usize) -> Result<(), StepRangeError> {
    if step1 > step2 {
        return Err(StepRangeError::Reversed { step1, step2 });
    }
    if step2 >= len {
        return Err(StepRangeError::OutOfRange { step: step2, len });
    }
    Ok(())
}

impl Release for MisfitSeries {
    fn release(handle: Handle) {
        let series = handle
            .downcast::<MisfitSeries>()
            .unwrap_or_else(|_| panic!("MisfitSeries::release called with a foreign handle"));
        trace!(len = series.len(), "misfit series released");
        drop(series);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_zeroed_with_exact_length() {
        for n in [0, 1, 7] {
            let s = MisfitSeries::alloc(n);
            assert_eq!(s.len(), n);
            assert!(s.as_slice().iter().all(|v| *v == 0.0));
        }
        assert!(MisfitSeries::alloc(0).is_empty());
    }

    #[test]
    fn iset_overwrites_single_step() {
        let mut s = MisfitSeries::alloc(4);
        s.iset(2, 1.5);
        s.iset(2, 3.0);
        assert_eq!(s.as_slice(), &[0.0, 0.0, 3.0, 0.0]);
        assert_eq!(s.iget(2), 3.0);
    }

    #[test]
    fn eval_sums_half_open_window() {
        let mut s = MisfitSeries::alloc(5);
        s.iset(1, 2.0);
        s.iset(3, 5.0);
        assert_eq!(s.eval(0, 3), 7.0);
        assert_eq!(s.eval(3, 3), 0.0);
        assert_eq!(s.eval(1, 3), 5.0);
        assert_eq!(s.eval(0, 4), 7.0);
    }

    #[test]
    fn adjacent_windows_add_up() {
        let mut s = MisfitSeries::alloc(6);
        for (i, v) in [0.5, 1.0, 2.0, 4.0, 8.0, 16.0].into_iter().enumerate() {
            s.iset(i, v);
        }
        assert_eq!(s.eval(0, 2) + s.eval(2, 5), s.eval(0, 5));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn iset_past_end_panics() {
        let mut s = MisfitSeries::alloc(5);
        s.iset(10, 1.0);
    }

    #[test]
    #[should_panic(expected = "invalid misfit window")]
    fn eval_reversed_window_panics() {
        MisfitSeries::alloc(5).eval(3, 1);
    }

    #[test]
    fn try_eval_reports_bad_windows() {
        let s = MisfitSeries::alloc(5);
        assert_eq!(
            s.try_eval(3, 1),
            Err(StepRangeError::Reversed { step1: 3, step2: 1 })
        );
        assert_eq!(
            s.try_eval(0, 5),
            Err(StepRangeError::OutOfRange { step: 5, len: 5 })
        );
        assert!(MisfitSeries::alloc(0).try_eval(0, 0).is_err());
    }

    #[test]
    fn buffer_round_trip_leaves_cursor_after_record() {
        let mut s = MisfitSeries::alloc(3);
        s.iset(0, 0.25);
        s.iset(2, 9.0);

        let mut buffer = Buffer::new();
        s.buffer_fwrite(&mut buffer);
        buffer.fwrite_int(42);

        let back = MisfitSeries::buffer_fread_alloc(&mut buffer).unwrap();
        assert_eq!(back, s);
        assert_eq!(buffer.fread_int().unwrap(), 42);
    }

    #[test]
    fn truncated_value_array_is_an_error() {
        let mut s = MisfitSeries::alloc(4);
        s.iset(3, 1.0);
        let mut bytes = Buffer::new();
        s.buffer_fwrite(&mut bytes);

        let mut data = bytes.into_bytes();
        data.truncate(4 + 2 * 8 + 3);
        let mut buffer = Buffer::from_bytes(data);

        let err = MisfitSeries::buffer_fread_alloc(&mut buffer).unwrap_err();
        assert!(matches!(err, BufferError::Truncated { needed: 32, .. }));
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn negative_length_is_an_error() {
        let mut buffer = Buffer::new();
        buffer.fwrite_int(-3);
        let err = MisfitSeries::buffer_fread_alloc(&mut buffer).unwrap_err();
        assert!(matches!(err, BufferError::InvalidLength { length: -3, .. }));
    }

    #[test]
    fn release_consumes_erased_handle() {
        let (handle, free) = MisfitSeries::alloc(2).into_erased();
        free(handle);
    }

    #[test]
    #[should_panic(expected = "foreign handle")]
    fn release_rejects_foreign_handle() {
        MisfitSeries::release(Box::new(3u8));
    }
}
