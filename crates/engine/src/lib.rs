//! `scorecard-engine` — Extraction-accuracy scoring engine.
//!
//! Pure engine crate: receives pre-loaded expected/actual records and a
//! normalized configuration, returns scored results and reports. No CLI or
//! IO dependencies.

pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod score;
pub mod suite;

pub use compare::compare_values;
pub use config::EvalConfig;
pub use diff::diff_fields;
pub use error::{EvalError, SourceError};
pub use model::{
    CasePair, CaseResult, FieldScoreMap, PackReport, PackSpec, RunMode, SuiteReport,
};
pub use score::score_case;
pub use suite::{run_pack, run_suite, CaseSource};
