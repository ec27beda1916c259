use std::fmt;

#[derive(Debug)]
pub enum EvalError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (out-of-range weight, negative tolerance, etc.).
    ConfigValidation(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Failure reported by an external collaborator (fixture store, live
/// extractor) when asked for a case's records. Never aborts a run; the
/// aggregator records it as a warning and skips the case.
#[derive(Debug, Clone)]
pub struct SourceError(pub String);

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SourceError {}
