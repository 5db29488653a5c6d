//! Realization-level and ensemble-level misfit bookkeeping.
//!
//! - `MisfitMember`: observation key -> `MisfitSeries` for one realization
//! - `MisfitEnsemble`: realization id -> `MisfitMember`

pub mod misfit_ensemble;
pub mod member;

pub use misfit_ensemble::*;
pub use member::*;
