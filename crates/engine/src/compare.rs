use chrono::NaiveDate;
use serde_json::Value;

use crate::config::{EvalConfig, StringRules};

/// Punctuation stripped during string normalization.
const PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '-'];

/// Factor applied to similarities below the fuzzy threshold, so that
/// low-similarity near-misses score strictly less than borderline fuzzy
/// matches without being zeroed.
const SUB_THRESHOLD_FACTOR: f64 = 0.5;

// ---------------------------------------------------------------------------
// Value comparison
// ---------------------------------------------------------------------------

/// Compare an expected scalar against an actual value, returning a score in
/// [0,1].
///
/// Branch order matters and is part of the contract: a null/missing actual
/// scores 0.0 before the expected value is even inspected; numeric expected
/// values use relative-error tolerance; string expected values that parse as
/// dates use calendar equality; everything else falls through to normalized
/// string comparison with fuzzy partial credit.
pub fn compare_values(
    expected: &Value,
    actual: &Value,
    field_name: &str,
    config: &EvalConfig,
) -> f64 {
    if actual.is_null() {
        return 0.0;
    }
    if expected.is_null() {
        return if actual.is_null() { 1.0 } else { 0.0 };
    }

    // Numeric comparison
    if let Value::Number(n) = expected {
        if let Some(e) = n.as_f64() {
            let Some(a) = coerce_number(actual) else {
                return 0.0;
            };
            // Division-by-zero guard: zero expects an exact zero.
            if e == 0.0 {
                return if a == 0.0 { 1.0 } else { 0.0 };
            }
            let relative_error = (e - a).abs() / e.abs();
            if relative_error <= config.tolerance.for_field(field_name) {
                return 1.0;
            }
            return (1.0 - relative_error).max(0.0);
        }
    }

    // Date comparison
    if let Some(expected_date) = parse_date(expected, &config.date_formats) {
        if let Some(actual_date) = parse_date(actual, &config.date_formats) {
            return if expected_date == actual_date { 1.0 } else { 0.0 };
        }
    }

    // String comparison
    let expected_text = normalize_text(&value_to_text(expected), &config.strings);
    let actual_text = normalize_text(&value_to_text(actual), &config.strings);

    if expected_text == actual_text {
        return 1.0;
    }

    let similarity = strsim::normalized_levenshtein(&expected_text, &actual_text);
    if similarity >= config.fuzzy_threshold {
        similarity
    } else {
        similarity * SUB_THRESHOLD_FACTOR
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Try each configured format in order; first successful parse wins.
pub fn parse_date(value: &Value, formats: &[String]) -> Option<NaiveDate> {
    let text = value.as_str()?;
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Apply the configured normalization flags in order: collapse whitespace,
/// case-fold, strip punctuation, then trim.
pub fn normalize_text(input: &str, rules: &StringRules) -> String {
    let mut result = input.to_string();

    if rules.collapse_whitespace {
        result = result.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    if rules.case_insensitive {
        result = result.to_lowercase();
    }

    if rules.strip_punctuation {
        result.retain(|c| !PUNCTUATION.contains(&c));
    }

    result.trim().to_string()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // Composite values fall back to their compact JSON rendering.
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
