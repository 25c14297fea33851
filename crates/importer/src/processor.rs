//! Import processor
//!
//! Core logic: verify the SQL files, then walk the variant ladder for each
//! file until one attempt succeeds.

use crate::errors::ImportError;
use crate::runner::CommandRunner;
use crate::variant::{CommandVariant, VariantSettings, DATABASE_URL_ENV};
use chrono::{DateTime, Utc};
use importkit_common::config::{AppConfig, DATABASE_URL_MISSING};
use importkit_common::{metrics, preview};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

/// Result of importing one SQL file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    /// Variant that succeeded
    pub variant: CommandVariant,
    /// Attempts used, including the successful one
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Summary of a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub files: Vec<FileOutcome>,
}

impl ImportReport {
    /// Total command invocations across all files
    pub fn total_attempts(&self) -> u32 {
        self.files.iter().map(|f| f.attempts).sum()
    }
}

/// Check every SQL file before anything is executed
pub fn verify_sql_files(files: &[PathBuf]) -> Result<(), ImportError> {
    for file in files {
        if !file.is_file() {
            return Err(ImportError::MissingSqlFile {
                path: file.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Import processor
pub struct Importer {
    runner: Arc<dyn CommandRunner>,
    sql_files: Vec<PathBuf>,
    /// Checked once the SQL files are known to exist
    database_url: Option<String>,
    settings: VariantSettings,
    retry_delay: Duration,
    stdout_preview_chars: usize,
    stderr_preview_chars: usize,
}

impl Importer {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &AppConfig) -> Self {
        Self {
            runner,
            sql_files: config.importer.sql_files.clone(),
            database_url: config.database_url().ok().map(str::to_string),
            settings: VariantSettings::from(config),
            retry_delay: config.retry_delay(),
            stdout_preview_chars: config.importer.stdout_preview_chars,
            stderr_preview_chars: config.importer.stderr_preview_chars,
        }
    }

    /// Import every configured file, stopping at the first file that cannot be run
    pub async fn run(&self) -> Result<ImportReport, ImportError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("import_run", run_id = %run_id);

        async {
            let started_at = Utc::now();
            info!(file_count = self.sql_files.len(), "Starting import");

            verify_sql_files(&self.sql_files)?;
            info!("SQL files found");

            let database_url = self
                .database_url
                .as_deref()
                .ok_or_else(|| ImportError::Config(DATABASE_URL_MISSING.to_string()))?;

            let mut files = Vec::with_capacity(self.sql_files.len());
            for file in &self.sql_files {
                files.push(self.import_file(file, database_url).await?);
            }

            let report = ImportReport {
                run_id,
                started_at,
                finished_at: Utc::now(),
                files,
            };

            info!(
                files = report.files.len(),
                attempts = report.total_attempts(),
                "Import complete"
            );

            Ok::<_, ImportError>(report)
        }
        .instrument(span)
        .await
    }

    /// Run one file through the variant ladder
    #[instrument(skip(self, database_url), fields(file = %file.display()))]
    async fn import_file(&self, file: &Path, database_url: &str) -> Result<FileOutcome, ImportError> {
        let file_start = Instant::now();
        let total = CommandVariant::ALL.len() as u32;
        let mut last_stderr = String::new();

        for (attempt, variant) in (1..=total).zip(CommandVariant::ALL) {
            info!(attempt, total, variant = %variant, "Running attempt");

            let spec = variant
                .render(file, &self.settings)
                .with_env(DATABASE_URL_ENV, database_url);

            let attempt_start = Instant::now();
            let output = self.runner.run(&spec).await;
            metrics::record_command_attempt(
                variant.name(),
                output.success,
                attempt_start.elapsed().as_secs_f64(),
            );

            if output.success {
                info!(
                    attempt,
                    variant = %variant,
                    stdout = %preview(&scrub(&output.stdout, database_url), self.stdout_preview_chars),
                    "SQL file executed"
                );
                metrics::record_file_imported(variant.name());

                return Ok(FileOutcome {
                    file: file.to_path_buf(),
                    variant,
                    attempts: attempt,
                    duration_ms: file_start.elapsed().as_millis() as u64,
                });
            }

            last_stderr = preview(&scrub(&output.stderr, database_url), self.stderr_preview_chars);
            warn!(
                attempt,
                variant = %variant,
                exit_code = ?output.exit_code,
                timed_out = output.timed_out,
                stderr = %last_stderr,
                "Attempt failed"
            );

            if attempt < total && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(ImportError::AllVariantsFailed {
            path: file.display().to_string(),
            attempts: total,
            last_stderr,
        })
    }
}

/// Mask the connection string if the client echoed it back
fn scrub(text: &str, database_url: &str) -> String {
    text.replace(database_url, "***")
}
