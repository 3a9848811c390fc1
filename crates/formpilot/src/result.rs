//! Result and error types for formpilot.

use thiserror::Error;

/// Result type for formpilot operations
pub type FormpilotResult<T> = Result<T, FormpilotError>;

/// Errors that can occur in formpilot
#[derive(Debug, Error)]
pub enum FormpilotError {
    /// Selector text could not be parsed
    #[error("Invalid selector: {selector}")]
    InvalidSelector {
        /// The offending selector
        selector: String,
    },

    /// Imported rule data was rejected
    #[error("Malformed rules: {message}")]
    MalformedRules {
        /// User-facing reason
        message: String,
    },

    /// A single-site file was given where a full backup was expected, or the reverse
    #[error("Wrong backup kind: expected {expected}")]
    WrongBackupKind {
        /// What the caller expected
        expected: &'static str,
    },

    /// Page fixture could not be built
    #[error("Invalid page fixture: {message}")]
    InvalidFixture {
        /// Error message
        message: String,
    },

    /// Persistence or messaging collaborator failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FormpilotError {
    /// Create a malformed rules error
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRules {
            message: message.into(),
        }
    }

    /// Create an invalid fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::InvalidFixture {
            message: message.into(),
        }
    }
}

/// Failure reported by a persistence or messaging collaborator.
///
/// Every variant is treated as a lost hosting context by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The hosting session is gone
    #[error("extension context invalidated")]
    ContextInvalidated,

    /// Storage backend failed
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Message could not be delivered
    #[error("message not delivered: {0}")]
    Delivery(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FormpilotError::malformed("rules file must be an array");
        assert_eq!(
            err.to_string(),
            "Malformed rules: rules file must be an array"
        );

        let err = FormpilotError::InvalidSelector {
            selector: "div[".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid selector: div[");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: FormpilotError = StoreError::Unavailable("quota".to_string()).into();
        assert!(matches!(err, FormpilotError::Store(_)));
        assert_eq!(err.to_string(), "Store error: storage unavailable: quota");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: FormpilotError = parse.unwrap_err().into();
        assert!(matches!(err, FormpilotError::Json(_)));
    }
}
