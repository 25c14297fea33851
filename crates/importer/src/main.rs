//! importkit Importer
//!
//! Runs the configured SQL files against PostgreSQL:
//! 1. Checks every SQL file exists
//! 2. Tries the direct, timeout-wrapped and shell-loop client variants in order
//! 3. Stops at the first file that no variant could run
//!
//! Exits 0 when every file was imported, 1 otherwise.

mod errors;
mod processor;
mod runner;
mod variant;

use crate::errors::ImportError;
use crate::processor::{ImportReport, Importer};
use crate::runner::ShellCommandRunner;
use importkit_common::{config::AppConfig, errors::AppError, metrics, telemetry, VERSION};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
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
        "Starting importkit importer v{}", VERSION
    );

    match run(&config).await {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let e = AppError::from(e);
            e.log();
            eprintln!("Import failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &AppConfig) -> Result<ImportReport, ImportError> {
    let report = Importer::new(Arc::new(ShellCommandRunner), config).run().await?;

    // The import already happened; a missing report is not a failed run
    if let Some(path) = &config.importer.report_path {
        match write_report(&report, path) {
            Ok(()) => info!(path = %path.display(), "Run report written"),
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                code = %e.code(),
                "Run report not written"
            ),
        }
    }

    Ok(report)
}

fn write_report(report: &ImportReport, path: &Path) -> importkit_common::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn print_summary(report: &ImportReport) {
    println!("Import completed successfully");
    for outcome in &report.files {
        println!(
            "  {} -> {} (attempt {}, {}ms)",
            outcome.file.display(),
            outcome.variant,
            outcome.attempts,
            outcome.duration_ms
        );
    }
}
