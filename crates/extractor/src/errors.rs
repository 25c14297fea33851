//! Extractor error types

use importkit_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF not found: {path}")]
    NotFound { path: String },

    #[error("Failed to open PDF {path}: {message}")]
    Open { path: String, message: String },

    #[error("Failed to extract text from page {page}: {message}")]
    Page { page: u32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::NotFound { path } => AppError::FileNotFound { path },
            ExtractionError::Io(e) => AppError::Io(e),
            other => AppError::Document {
                message: other.to_string(),
            },
        }
    }
}
