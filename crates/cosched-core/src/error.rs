// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for co-scheduling operations
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    /// Object reference could not be parsed
    #[error("Invalid object reference: {reference}")]
    #[diagnostic(
        code(cosched::core::invalid_object_key),
        help("Use the form <namespace>/<name>, or a bare <name> for the default namespace")
    )]
    InvalidObjectKey {
        #[allow(unused)]
        reference: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(cosched::core::invalid_config),
        help("{suggestion}")
    )]
    InvalidConfig {
        #[allow(unused)]
        message: String,
        #[allow(unused)]
        suggestion: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(cosched::core::serialization_error),
        help("Ensure the manifest is valid JSON or YAML")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an InvalidObjectKey error
    pub fn invalid_object_key(reference: impl Into<String>) -> Self {
        Self::InvalidObjectKey {
            reference: reference.into(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoreError::invalid_object_key("a/b/c");
        assert!(matches!(err, CoreError::InvalidObjectKey { .. }));
        assert_eq!(err.to_string(), "Invalid object reference: a/b/c");

        let err = CoreError::invalid_config("empty namespace", "Set --companion-namespace");
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
        assert_eq!(
            miette::Diagnostic::code(&err).map(|c| c.to_string()).as_deref(),
            Some("cosched::core::invalid_config")
        );
    }
}
