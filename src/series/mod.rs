//! Misfit time series: storage, windowed aggregation, and binary persistence.

pub mod misfit_ts;

pub use misfit_ts::*;
