//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`SampleConfig`, `RankConfig`)
//! - ranking outputs (`MisfitRanking`, `RankingEntry`)

pub mod types;

pub use types::*;
