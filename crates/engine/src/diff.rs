use serde_json::Value;

use crate::compare::compare_values;
use crate::config::EvalConfig;
use crate::model::FieldScoreMap;

// ---------------------------------------------------------------------------
// Structural diff
// ---------------------------------------------------------------------------

/// Walk the expected tree and score each top-level field against the actual
/// tree. Pure: every call level returns a fresh map.
///
/// Keys present only in `actual` are not scored here; the case scorer
/// surfaces them separately as extra fields.
pub fn diff_fields(expected: &Value, actual: &Value, config: &EvalConfig) -> FieldScoreMap {
    let mut scores = FieldScoreMap::new();

    let Value::Object(expected_map) = expected else {
        return scores;
    };
    let empty = serde_json::Map::new();
    let actual_map = actual.as_object().unwrap_or(&empty);

    for (key, expected_value) in expected_map {
        let actual_value = actual_map.get(key).unwrap_or(&Value::Null);

        let score = match (expected_value, actual_value) {
            (Value::Object(_), Value::Object(_)) => {
                average(&diff_fields(expected_value, actual_value, config))
            }
            (Value::Array(expected_items), Value::Array(actual_items)) => {
                score_sequence(key, expected_items, actual_items, config)
            }
            // An optional list that was expected empty is satisfied by an
            // absent field.
            (Value::Array(expected_items), Value::Null) if expected_items.is_empty() => 1.0,
            _ => compare_values(expected_value, actual_value, key, config),
        };

        scores.insert(key.clone(), score);
    }

    scores
}

/// Index-wise sequence comparison up to the expected length. Extra actual
/// items are ignored; missing actual items score 0.0.
fn score_sequence(
    key: &str,
    expected_items: &[Value],
    actual_items: &[Value],
    config: &EvalConfig,
) -> f64 {
    if expected_items.is_empty() {
        // Partial credit for an unexpectedly non-empty optional list.
        return if actual_items.is_empty() { 1.0 } else { 0.5 };
    }

    let mut item_scores = Vec::with_capacity(expected_items.len());
    for (i, expected_item) in expected_items.iter().enumerate() {
        let score = match actual_items.get(i) {
            None => 0.0,
            Some(actual_item) => match expected_item {
                Value::Object(_) => average(&diff_fields(expected_item, actual_item, config)),
                _ => compare_values(expected_item, actual_item, &format!("{key}[{i}]"), config),
            },
        };
        item_scores.push(score);
    }

    item_scores.iter().sum::<f64>() / item_scores.len() as f64
}

/// Mean of a nested score map's values; an empty map scores 0.0.
fn average(scores: &FieldScoreMap) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.values().sum::<f64>() / scores.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
