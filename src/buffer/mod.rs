//! Growable byte buffer with a read cursor.
//!
//! This is the binary encoding every persisted record in the crate goes through:
//!
//! - writes always append to the end of the buffer
//! - reads start at the cursor and advance it
//! - all scalars are little-endian; integers are `i32`, floats are `f64`
//! - strings are an `i32` byte length followed by UTF-8 bytes
//!
//! A read that fails leaves the cursor where it was, so callers can report the
//! failing offset and the buffer stays usable.

use std::fs;
use std::path::Path;

use thiserror::Error;

const INT_SIZE: usize = std::mem::size_of::<i32>();
const DOUBLE_SIZE: usize = std::mem::size_of::<f64>();

/// Decode failures surfaced by [`Buffer`] reads and by record readers built on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("truncated buffer at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        needed: usize,
        available: usize,
        offset: usize,
    },

    #[error("invalid length field {length} at offset {offset}")]
    InvalidLength { length: i64, offset: usize },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("series length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("bad magic number {found:#x}")]
    BadMagic { found: i32 },

    #[error("realization {iens} appears more than once in the ensemble record")]
    DuplicateMember { iens: usize },
}

/// Byte buffer with an append-only write end and a read cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    pos: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing bytes; the cursor starts at 0.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Move the cursor to `pos`, clamped to the buffer length.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Read a whole file into a fresh buffer.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        fs::read(path).map(Self::from_bytes)
    }

    /// Write the full buffer contents (not just the unread tail) to `path`.
    pub fn store(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, &self.data)
    }

    pub fn fwrite_int(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn fwrite_double(&mut self, value: f64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn fwrite_doubles(&mut self, values: &[f64]) {
        self.data.reserve(values.len() * DOUBLE_SIZE);
        for v in values {
            self.fwrite_double(*v);
        }
    }

    /// Write a length prefix for a collection.
    ///
    /// # Panics
    /// Panics if `len` does not fit the `i32` length field.
    pub fn fwrite_len(&mut self, len: usize) {
        let len = i32::try_from(len)
            .unwrap_or_else(|_| panic!("length {len} does not fit an i32 length field"));
        self.fwrite_int(len);
    }

    pub fn fwrite_string(&mut self, value: &str) {
        self.fwrite_len(value.len());
        self.data.extend_from_slice(value.as_bytes());
    }

    pub fn fread_int(&mut self) -> Result<i32, BufferError> {
        let bytes = self.take::<INT_SIZE>()?;
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn fread_double(&mut self) -> Result<f64, BufferError> {
        let bytes = self.take::<DOUBLE_SIZE>()?;
        Ok(f64::from_le_bytes(bytes))
    }

    /// Read `n` consecutive doubles.
    ///
    /// The whole span is bounds-checked before anything is allocated, so a
    /// corrupt count cannot trigger a huge allocation.
    pub fn fread_doubles(&mut self, n: usize) -> Result<Vec<f64>, BufferError> {
        let needed = n.checked_mul(DOUBLE_SIZE).unwrap_or(usize::MAX);
        self.ensure(needed)?;

        let span = &self.data[self.pos..self.pos + needed];
        let out = span
            .chunks_exact(DOUBLE_SIZE)
            .map(|chunk| {
                let mut bytes = [0u8; DOUBLE_SIZE];
                bytes.copy_from_slice(chunk);
                f64::from_le_bytes(bytes)
            })
            .collect();
        self.pos += needed;
        Ok(out)
    }

    /// Read an `i32` length prefix and reject negative values.
    pub fn fread_len(&mut self) -> Result<usize, BufferError> {
        let offset = self.pos;
        let raw = self.fread_int()?;
        usize::try_from(raw).map_err(|_| {
            self.pos = offset;
            BufferError::InvalidLength {
                length: i64::from(raw),
                offset,
            }
        })
    }

    pub fn fread_string(&mut self) -> Result<String, BufferError> {
        let start = self.pos;
        let len = self.fread_len()?;
        if let Err(e) = self.ensure(len) {
            self.pos = start;
            return Err(e);
        }

        let bytes = self.data[self.pos..self.pos + len].to_vec();
        match String::from_utf8(bytes) {
            Ok(s) => {
                self.pos += len;
                Ok(s)
            }
            Err(_) => {
                self.pos = start;
                Err(BufferError::InvalidUtf8 { offset: start })
            }
        }
    }

    fn ensure(&self, needed: usize) -> Result<(), BufferError> {
        if needed > self.remaining() {
            return Err(BufferError::Truncated {
                needed,
                available: self.remaining(),
                offset: self.pos,
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_little_endian() {
        let mut buffer = Buffer::new();
        buffer.fwrite_int(1);
        buffer.fwrite_double(1.0);
        assert_eq!(&buffer.as_bytes()[..4], &[1, 0, 0, 0]);
        assert_eq!(&buffer.as_bytes()[4..], &1.0f64.to_le_bytes());
    }

    #[test]
    fn reads_follow_write_order() {
        let mut buffer = Buffer::new();
        buffer.fwrite_int(-7);
        buffer.fwrite_string("WOPR:OP_1");
        buffer.fwrite_doubles(&[0.5, 1.5]);

        assert_eq!(buffer.fread_int().unwrap(), -7);
        assert_eq!(buffer.fread_string().unwrap(), "WOPR:OP_1");
        assert_eq!(buffer.fread_doubles(2).unwrap(), vec![0.5, 1.5]);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn truncated_read_keeps_cursor() {
        let mut buffer = Buffer::from_bytes(vec![1, 2, 3]);
        let err = buffer.fread_int().unwrap_err();
        assert_eq!(
            err,
            BufferError::Truncated {
                needed: 4,
                available: 3,
                offset: 0
            }
        );
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn negative_length_is_rejected() {
        let mut buffer = Buffer::new();
        buffer.fwrite_int(-1);
        let err = buffer.fread_len().unwrap_err();
        assert_eq!(err, BufferError::InvalidLength { length: -1, offset: 0 });
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn invalid_utf8_string_is_rejected() {
        let mut buffer = Buffer::new();
        buffer.fwrite_int(2);
        buffer.fwrite_int(0x0000_ffff);
        let err = buffer.fread_string().unwrap_err();
        assert_eq!(err, BufferError::InvalidUtf8 { offset: 0 });
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn huge_double_count_fails_without_allocating() {
        let mut buffer = Buffer::from_bytes(vec![0; 16]);
        let err = buffer.fread_doubles(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, BufferError::Truncated { available: 16, .. }));
    }
}
