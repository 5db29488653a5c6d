//! Input/output helpers.
//!
//! - misfit ensemble binary files (`ensemble_file`)
//! - ranking exports (CSV/JSON) (`export`)

pub mod ensemble_file;
pub mod export;

pub use ensemble_file::*;
pub use export::*;
