//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Could not read an input file
    #[error("Cannot read {path}: {source}")]
    Read {
        /// File that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Formpilot library error
    #[error("{0}")]
    Formpilot(#[from] formpilot::FormpilotError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CliError::config("bad debounce").to_string(),
            "Configuration error: bad debounce"
        );
        assert_eq!(
            CliError::invalid_argument("no site").to_string(),
            "Invalid argument: no site"
        );
    }

    #[test]
    fn test_library_error_passes_through() {
        let err: CliError = formpilot::FormpilotError::malformed("rule 0: missing field").into();
        assert_eq!(err.to_string(), "Malformed rules: rule 0: missing field");
    }
}
