use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::EvalError;

const DEFAULT_NUMERIC_TOLERANCE: f64 = 0.01;
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
const DEFAULT_WEIGHT_REQUIRED_PRESENCE: f64 = 0.4;
const DEFAULT_WEIGHT_EXACT_MATCH: f64 = 0.4;
const DEFAULT_WEIGHT_FUZZY_MATCH: f64 = 0.2;
const DEFAULT_MINIMUM_SCORE: f64 = 0.80;
const DEFAULT_MINIMUM_REQUIRED_PRESENCE: f64 = 0.95;

// ---------------------------------------------------------------------------
// Raw (deserialized) config
// ---------------------------------------------------------------------------

/// Comparison configuration as written by pack authors. Every key is
/// optional; [`RawEvalConfig::normalize`] fills the gaps with documented
/// defaults exactly once, so the engine only ever sees a fully-populated
/// [`EvalConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvalConfig {
    #[serde(default)]
    pub tolerance: RawTolerance,
    #[serde(default)]
    pub dates: RawDates,
    #[serde(default)]
    pub strings: RawStrings,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub weights: RawWeights,
    #[serde(default)]
    pub minimum_score: Option<f64>,
    #[serde(default)]
    pub minimum_required_presence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTolerance {
    #[serde(default)]
    pub r#default: Option<f64>,
    #[serde(default)]
    pub fields: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDates {
    #[serde(default)]
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStrings {
    #[serde(default)]
    pub collapse_whitespace: Option<bool>,
    #[serde(default)]
    pub case_insensitive: Option<bool>,
    #[serde(default)]
    pub strip_punctuation: Option<bool>,
    #[serde(default)]
    pub fuzzy_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWeights {
    #[serde(default)]
    pub required_presence: Option<f64>,
    #[serde(default)]
    pub exact_match: Option<f64>,
    #[serde(default)]
    pub fuzzy_match: Option<f64>,
}

impl RawEvalConfig {
    /// Fill every absent key with its documented default. Runs once per
    /// evaluation run; comparator calls never consult raw configuration.
    pub fn normalize(self) -> EvalConfig {
        EvalConfig {
            tolerance: ToleranceConfig {
                default: self.tolerance.r#default.unwrap_or(DEFAULT_NUMERIC_TOLERANCE),
                fields: self.tolerance.fields,
            },
            date_formats: if self.dates.formats.is_empty() {
                vec![DEFAULT_DATE_FORMAT.to_string()]
            } else {
                self.dates.formats
            },
            strings: StringRules {
                collapse_whitespace: self.strings.collapse_whitespace.unwrap_or(true),
                case_insensitive: self.strings.case_insensitive.unwrap_or(true),
                strip_punctuation: self.strings.strip_punctuation.unwrap_or(true),
            },
            fuzzy_threshold: self
                .strings
                .fuzzy_threshold
                .unwrap_or(DEFAULT_FUZZY_THRESHOLD),
            required_fields: self.required_fields,
            weights: Weights {
                required_presence: self
                    .weights
                    .required_presence
                    .unwrap_or(DEFAULT_WEIGHT_REQUIRED_PRESENCE),
                exact_match: self
                    .weights
                    .exact_match
                    .unwrap_or(DEFAULT_WEIGHT_EXACT_MATCH),
                fuzzy_match: self
                    .weights
                    .fuzzy_match
                    .unwrap_or(DEFAULT_WEIGHT_FUZZY_MATCH),
            },
            minimum_score: self.minimum_score.unwrap_or(DEFAULT_MINIMUM_SCORE),
            minimum_required_presence: self
                .minimum_required_presence
                .unwrap_or(DEFAULT_MINIMUM_REQUIRED_PRESENCE),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized config
// ---------------------------------------------------------------------------

/// Fully-populated comparison configuration. Immutable for the duration of
/// a run and shared read-only by every comparator call.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub tolerance: ToleranceConfig,
    /// Accepted date formats, tried in order.
    pub date_formats: Vec<String>,
    pub strings: StringRules,
    /// Minimum normalized similarity at which a near-match still counts.
    pub fuzzy_threshold: f64,
    /// Fields whose presence (non-null) in actual output is mandatory.
    pub required_fields: Vec<String>,
    pub weights: Weights,
    pub minimum_score: f64,
    pub minimum_required_presence: f64,
}

#[derive(Debug, Clone)]
pub struct ToleranceConfig {
    pub default: f64,
    pub fields: BTreeMap<String, f64>,
}

impl ToleranceConfig {
    /// Relative-error tolerance for a field: override if configured, else
    /// the default.
    pub fn for_field(&self, field_name: &str) -> f64 {
        self.fields
            .get(field_name)
            .copied()
            .unwrap_or(self.default)
    }
}

/// String normalization flags, applied in declaration order before any
/// string comparison.
#[derive(Debug, Clone)]
pub struct StringRules {
    pub collapse_whitespace: bool,
    pub case_insensitive: bool,
    pub strip_punctuation: bool,
}

/// Composite-score weights. Each must lie in [0,1]; conventionally they sum
/// to 1.0 but the engine does not enforce the sum.
#[derive(Debug, Clone)]
pub struct Weights {
    pub required_presence: f64,
    pub exact_match: f64,
    pub fuzzy_match: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        RawEvalConfig::default().normalize()
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EvalConfig {
    pub fn from_toml(input: &str) -> Result<Self, EvalError> {
        let raw: RawEvalConfig =
            toml::from_str(input).map_err(|e| EvalError::ConfigParse(e.to_string()))?;
        let config = raw.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Range checks only. Missing keys never fail — normalization has
    /// already substituted defaults by the time this runs.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.tolerance.default < 0.0 {
            return Err(EvalError::ConfigValidation(format!(
                "default tolerance must be non-negative, got {}",
                self.tolerance.default
            )));
        }
        for (field, tol) in &self.tolerance.fields {
            if *tol < 0.0 {
                return Err(EvalError::ConfigValidation(format!(
                    "tolerance for field '{field}' must be non-negative, got {tol}"
                )));
            }
        }

        if self.date_formats.is_empty() {
            return Err(EvalError::ConfigValidation(
                "at least one date format is required".into(),
            ));
        }

        for (name, value) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("weights.required_presence", self.weights.required_presence),
            ("weights.exact_match", self.weights.exact_match),
            ("weights.fuzzy_match", self.weights.fuzzy_match),
            ("minimum_score", self.minimum_score),
            (
                "minimum_required_presence",
                self.minimum_required_presence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EvalError::ConfigValidation(format!(
                    "{name} must be in [0,1], got {value}"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
