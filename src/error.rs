use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("{0}")]
    #[diagnostic(code(flyercal::input_missing))]
    InputMissing(String),

    #[error(transparent)]
    #[diagnostic(code(flyercal::io))]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(flyercal::extractor))]
    Extractor(String),

    #[error("Malformed extraction: {0}")]
    #[diagnostic(
        code(flyercal::malformed_extraction),
        help("the extractor did not return valid JSON; inspect the raw response text")
    )]
    MalformedExtraction(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(flyercal::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(flyercal::config))]
    Config(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(flyercal::template))]
    Template(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(flyercal::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedExtraction(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Extractor(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type FlyerResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing or invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create extractor errors
pub fn extractor_error(message: &str) -> Error {
    Error::Extractor(message.to_string())
}

/// Helper to create missing-input errors
pub fn input_missing(message: &str) -> Error {
    Error::InputMissing(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_become_malformed_extraction() {
        let err: Error = serde_json::from_str::<serde_json::Value>("not json at all")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::MalformedExtraction(_)));
        assert!(err.to_string().starts_with("Malformed extraction"));
    }

    #[test]
    fn test_input_missing_displays_message_verbatim() {
        let err = input_missing("Please upload an image first.");
        assert_eq!(err.to_string(), "Please upload an image first.");
    }

    #[test]
    fn test_env_error_names_variable() {
        let err = env_error("OPENAI_MAX_TOKENS");
        assert!(err.to_string().contains("OPENAI_MAX_TOKENS"));
    }
}
