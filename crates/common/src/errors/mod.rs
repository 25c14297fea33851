//! Error types for importkit tools
//!
//! Provides:
//! - Distinct error types for configuration, filesystem and subprocess failures
//! - Machine-readable error codes attached to log events
//! - Conversion from the library errors the tools touch

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors (1xxx)
    FileNotFound,

    // External process errors (2xxx)
    CommandFailed,

    // Document errors (3xxx)
    DocumentError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
    IoError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self)
            .map(|s| s.trim_matches('"').to_string())
            .unwrap_or_else(|_| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::FileNotFound => 1001,

            ErrorCode::CommandFailed => 2001,

            ErrorCode::DocumentError => 3001,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::IoError => 9004,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Document error: {message}")]
    Document { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::FileNotFound { .. } => ErrorCode::FileNotFound,
            AppError::CommandFailed { .. } => ErrorCode::CommandFailed,
            AppError::Document { .. } => ErrorCode::DocumentError,
            AppError::Configuration { .. } | AppError::Config(_) => ErrorCode::ConfigurationError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Internal { .. } | AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the failure came from the user's input rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::FileNotFound | ErrorCode::ConfigurationError
        )
    }

    /// Log this error at the level its code calls for
    pub fn log(&self) {
        let code = self.code();
        if self.is_input_error() {
            tracing::warn!(error = %self, code = %code, numeric_code = code.as_code(), "Input error");
        } else {
            tracing::error!(error = %self, code = %code, numeric_code = code.as_code(), "Run failed");
        }
    }
}
