use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::config::EvalConfig;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The (expected, actual) records for one case, supplied by an external
/// collaborator. Both trees are immutable once handed to the engine.
#[derive(Debug, Clone)]
pub struct CasePair {
    pub expected: Value,
    pub actual: Value,
}

/// A pack of cases sharing one comparison configuration.
///
/// `validation_errors` is populated by the external structural validator;
/// a pack with any is marked failed without being scored.
#[derive(Debug, Clone)]
pub struct PackSpec {
    pub name: String,
    pub version: String,
    pub config: EvalConfig,
    pub case_ids: Vec<String>,
    pub validation_errors: Vec<String>,
}

/// Pass rule applied at the pack level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Average score must clear the minimum AND every scored case must pass.
    Smoke,
    /// Average score alone decides; the per-case breakdown is still reported.
    Full,
}

// ---------------------------------------------------------------------------
// Case result
// ---------------------------------------------------------------------------

/// Per-field similarity scores for one case, keyed by top-level field name.
/// Nested structures contribute a single averaged entry under their
/// top-level key. Every value lies in [0.0, 1.0].
pub type FieldScoreMap = BTreeMap<String, f64>;

/// Scored outcome for a single case. Immutable once built; pass/fail is a
/// pure function of the score and required-presence rate against the
/// configured thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub case_id: String,
    pub score: f64,
    pub passed: bool,
    pub field_scores: FieldScoreMap,
    pub missing_fields: Vec<String>,
    pub extra_fields: Vec<String>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PackReport {
    pub name: String,
    pub version: String,
    pub generated_at: String,
    /// Cases actually scored. Skipped cases are excluded from the total and
    /// from the average.
    pub cases_total: usize,
    pub cases_passed: usize,
    pub cases_failed: usize,
    pub cases_skipped: usize,
    pub average_score: f64,
    pub minimum_score: f64,
    pub passed: bool,
    pub warnings: Vec<String>,
    pub results: Vec<CaseResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub generated_at: String,
    pub engine_version: String,
    pub overall_passed: bool,
    pub packs: Vec<PackReport>,
}
