//! Importer error types

use importkit_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("SQL file not found: {path}")]
    MissingSqlFile { path: String },

    #[error("Could not execute {path} after {attempts} attempts: {last_stderr}")]
    AllVariantsFailed {
        path: String,
        attempts: u32,
        last_stderr: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::MissingSqlFile { path } => AppError::FileNotFound { path },
            ImportError::Config(message) => AppError::Configuration { message },
            failed @ ImportError::AllVariantsFailed { .. } => AppError::CommandFailed {
                message: failed.to_string(),
            },
        }
    }
}
