use serde_json::Value;

use crate::config::EvalConfig;
use crate::diff::diff_fields;
use crate::model::CaseResult;

// ---------------------------------------------------------------------------
// Case scoring
// ---------------------------------------------------------------------------

/// Score one case: field-level diff, required-presence check, and the
/// weighted composite with its pass/fail verdict.
///
/// Pure and idempotent; identical inputs yield an identical result.
pub fn score_case(
    case_id: &str,
    expected: &Value,
    actual: &Value,
    config: &EvalConfig,
) -> CaseResult {
    let field_scores = diff_fields(expected, actual, config);

    // Required fields are checked at the top level of the actual record;
    // a null value counts as absent.
    let required_presence_rate = if config.required_fields.is_empty() {
        1.0
    } else {
        let present = config
            .required_fields
            .iter()
            .filter(|field| matches!(actual.get(field.as_str()), Some(v) if !v.is_null()))
            .count();
        present as f64 / config.required_fields.len() as f64
    };

    let (exact_match_rate, fuzzy_match_rate) = if field_scores.is_empty() {
        (0.0, 0.0)
    } else {
        let total = field_scores.len() as f64;
        let exact = field_scores.values().filter(|s| **s == 1.0).count();
        let fuzzy = field_scores
            .values()
            .filter(|s| **s >= config.fuzzy_threshold)
            .count();
        (exact as f64 / total, fuzzy as f64 / total)
    };

    let score = required_presence_rate * config.weights.required_presence
        + exact_match_rate * config.weights.exact_match
        + fuzzy_match_rate * config.weights.fuzzy_match;

    let passed = score >= config.minimum_score
        && required_presence_rate >= config.minimum_required_presence;

    // Top level only; nested differences are already folded into the scores.
    let missing_fields = top_level_keys(expected)
        .filter(|k| actual.get(k.as_str()).is_none())
        .cloned()
        .collect();
    let extra_fields = top_level_keys(actual)
        .filter(|k| expected.get(k.as_str()).is_none())
        .cloned()
        .collect();

    CaseResult {
        case_id: case_id.to_string(),
        score,
        passed,
        field_scores,
        missing_fields,
        extra_fields,
    }
}

fn top_level_keys(value: &Value) -> impl Iterator<Item = &String> {
    value.as_object().into_iter().flat_map(|map| map.keys())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
