//! Configuration management for importkit tools
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SQL files imported when none are configured
pub const DEFAULT_SQL_FILES: &[&str] = &[
    "import_locatarios_rds_clientes.sql",
    "import_proprietarios_rds_fornecedores.sql",
];

/// Wall-clock limit for the timeout-wrapped variant
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

/// Reported when no connection string is configured
pub const DATABASE_URL_MISSING: &str = "database url not set (APP__IMPORTER__DATABASE_URL)";

/// Pause after a failed attempt, before the next variant
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// Iterations of the shell-loop variant's internal retry
pub const DEFAULT_SHELL_LOOP_ITERATIONS: u32 = 3;

/// Sleep between shell-loop iterations
pub const DEFAULT_SHELL_LOOP_BACKOFF_SECS: u64 = 5;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// SQL importer configuration
    #[serde(default)]
    pub importer: ImporterConfig,

    /// PDF extractor configuration
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImporterConfig {
    /// SQL files to run, in order
    #[serde(default = "default_sql_files")]
    pub sql_files: Vec<PathBuf>,

    /// PostgreSQL connection string. Never logged, never placed in command text.
    #[serde(default, skip_serializing)]
    pub database_url: Option<String>,

    /// Database client binary
    #[serde(default = "default_client_binary")]
    pub client_binary: String,

    /// Timeout applied by the timeout-wrapped variant
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    /// Delay after a failed attempt
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Internal iterations of the shell-loop variant
    #[serde(default = "default_shell_loop_iterations")]
    pub shell_loop_iterations: u32,

    /// Sleep between shell-loop iterations
    #[serde(default = "default_shell_loop_backoff")]
    pub shell_loop_backoff_secs: u64,

    /// Characters of stdout kept in success logs
    #[serde(default = "default_stdout_preview")]
    pub stdout_preview_chars: usize,

    /// Characters of stderr kept in failure logs
    #[serde(default = "default_stderr_preview")]
    pub stderr_preview_chars: usize,

    /// Optional path for a JSON run report
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractorConfig {
    /// PDF file to extract
    #[serde(default = "default_pdf_path")]
    pub pdf_path: PathBuf,

    /// Optional file the extracted text is also written to
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Service name attached to the root span
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_sql_files() -> Vec<PathBuf> { DEFAULT_SQL_FILES.iter().map(PathBuf::from).collect() }
fn default_client_binary() -> String { "psql".to_string() }
fn default_attempt_timeout() -> u64 { DEFAULT_ATTEMPT_TIMEOUT_SECS }
fn default_retry_delay() -> u64 { DEFAULT_RETRY_DELAY_SECS }
fn default_shell_loop_iterations() -> u32 { DEFAULT_SHELL_LOOP_ITERATIONS }
fn default_shell_loop_backoff() -> u64 { DEFAULT_SHELL_LOOP_BACKOFF_SECS }
fn default_stdout_preview() -> usize { 200 }
fn default_stderr_preview() -> usize { 100 }
fn default_pdf_path() -> PathBuf { PathBuf::from("documento.pdf") }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "importkit".to_string() }

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            sql_files: default_sql_files(),
            database_url: None,
            client_binary: default_client_binary(),
            attempt_timeout_secs: default_attempt_timeout(),
            retry_delay_secs: default_retry_delay(),
            shell_loop_iterations: default_shell_loop_iterations(),
            shell_loop_backoff_secs: default_shell_loop_backoff(),
            stdout_preview_chars: default_stdout_preview(),
            stderr_preview_chars: default_stderr_preview(),
            report_path: None,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            pdf_path: default_pdf_path(),
            output_path: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__IMPORTER__DATABASE_URL=postgresql://...
            .add_source(env_source())

            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from a specific file, still honouring APP__ overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path))
            .add_source(env_source())
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Timeout of the timeout-wrapped variant
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.importer.attempt_timeout_secs)
    }

    /// Delay between failed attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.importer.retry_delay_secs)
    }

    /// Connection string, or a configuration error naming the variable to set
    pub fn database_url(&self) -> Result<&str> {
        self.importer
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: DATABASE_URL_MISSING.to_string(),
            })
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("APP")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("importer.sql_files")
}
