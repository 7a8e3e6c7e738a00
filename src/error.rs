//! Error types and handling for the HDO tariff service
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for tariff service operations
pub type Result<T> = std::result::Result<T, HdoError>;

/// Main error type for the tariff service
#[derive(Debug, Error)]
pub enum HdoError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request or value validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// External fetch process exited unsuccessfully
    #[error("Fetch process failed with exit code {code}")]
    Fetch { code: i32 },

    /// Fetch process produced a line that is not `<start> <end> <tariff>`
    #[error("Malformed fetch output: {message}")]
    MalformedOutput { message: String },

    /// Cache entry exists but does not hold a tariff record array
    #[error("Malformed cache entry: {message}")]
    MalformedCache { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl HdoError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new fetch error from the process exit code
    pub const fn fetch(code: i32) -> Self {
        Self::Fetch { code }
    }

    pub fn malformed_output<S: Into<String>>(message: S) -> Self {
        Self::MalformedOutput {
            message: message.into(),
        }
    }

    pub fn malformed_cache<S: Into<String>>(message: S) -> Self {
        Self::MalformedCache {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for HdoError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for HdoError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HdoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HdoError::config("test config error");
        assert!(matches!(err, HdoError::Config { .. }));

        let err = HdoError::fetch(2);
        assert!(matches!(err, HdoError::Fetch { code: 2 }));

        let err = HdoError::validation("command", "missing");
        assert!(matches!(err, HdoError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = HdoError::config("test error");
        assert_eq!(err.to_string(), "Configuration error: test error");

        let err = HdoError::validation("days", "Missing 'days' argument");
        assert_eq!(
            err.to_string(),
            "Validation error: days - Missing 'days' argument"
        );

        let err = HdoError::fetch(3);
        assert_eq!(err.to_string(), "Fetch process failed with exit code 3");
    }
}
