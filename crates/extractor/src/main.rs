//! importkit Extractor
//!
//! Extracts the text of the configured PDF:
//! 1. Confirms the file exists
//! 2. Reads it page by page
//! 3. Prints the pages joined under `--- PAGE N ---` headers
//!
//! Logs go to stderr; stdout carries only the extracted text.

mod errors;
mod pdf;
mod processor;

use crate::errors::ExtractionError;
use crate::pdf::LopdfOpener;
use crate::processor::Extractor;
use importkit_common::{config::AppConfig, errors::AppError, metrics, telemetry, VERSION};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    if let Err(e) = telemetry::init_tracing(&config.observability) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    metrics::register_metrics();

    info!(
        service = %config.observability.service_name,
        "Starting importkit extractor v{}", VERSION
    );

    let extractor = Extractor::new(Arc::new(LopdfOpener));

    match run(&extractor, &config) {
        Ok(text) => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let e = AppError::from(e);
            e.log();
            eprintln!("Extraction failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(extractor: &Extractor, config: &AppConfig) -> Result<String, ExtractionError> {
    let extracted = extractor.extract(&config.extractor.pdf_path)?;
    let text = extracted.render();

    if let Some(path) = &config.extractor.output_path {
        std::fs::write(path, &text)?;
        info!(path = %path.display(), bytes = text.len(), "Extracted text written");
    }

    Ok(text)
}
