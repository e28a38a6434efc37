//! Error types for Synheart UV

use thiserror::Error;

/// Errors that can occur at the crate boundary (parsing, persistence, sources).
///
/// The composition engine and the celestial calculator never return these;
/// they neutralise bad input instead.
#[derive(Debug, Error)]
pub enum UvError {
    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Environmental source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let error: UvError = parse.unwrap_err().into();
        assert!(matches!(error, UvError::JsonError(_)));
        assert!(error.to_string().starts_with("Invalid JSON"));
    }
}
