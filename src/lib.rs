//! `misfit-ts` library crate.
//!
//! Per-realization misfit time series for ensemble history matching, plus the
//! bookkeeping around them:
//!
//! - `series`: the fixed-length misfit series (`iset`, `eval`, binary I/O, release)
//! - `buffer`: the little-endian binary encoding records are read from/written to
//! - `store`: keyed container of type-erased values with per-value destructors
//! - `ensemble`: realization and ensemble-level collections of series
//! - `report`: ranking realizations by windowed misfit
//!
//! The binary (`misfit`) is a thin wrapper around this library.

pub mod app;
pub mod buffer;
pub mod cli;
pub mod data;
pub mod domain;
pub mod ensemble;
pub mod error;
pub mod io;
pub mod report;
pub mod series;
pub mod store;
