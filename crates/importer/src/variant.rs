//! Command variants
//!
//! The fixed ladder of shell commands used to hand one SQL file to the
//! database client. The connection string is only ever referenced through
//! the `IMPORTKIT_DATABASE_URL` environment variable, so it never shows up
//! in command text, process listings or logs.

use importkit_common::config::AppConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Child environment variable carrying the connection string
pub const DATABASE_URL_ENV: &str = "IMPORTKIT_DATABASE_URL";

/// Shell used to run every variant
pub const SHELL: &str = "sh";

/// One of the predefined ways of invoking the database client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandVariant {
    /// Plain client invocation
    Direct,
    /// Client invocation killed after the attempt timeout
    Timeout,
    /// Client invocation retried inside a shell loop
    ShellLoop,
}

impl CommandVariant {
    /// Variants in the order they are attempted
    pub const ALL: [CommandVariant; 3] = [
        CommandVariant::Direct,
        CommandVariant::Timeout,
        CommandVariant::ShellLoop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CommandVariant::Direct => "direct",
            CommandVariant::Timeout => "timeout",
            CommandVariant::ShellLoop => "shell_loop",
        }
    }

    /// Build the command that runs `file` with this variant
    pub fn render(&self, file: &Path, settings: &VariantSettings) -> CommandSpec {
        let direct = format!(
            "{} \"${}\" -f {}",
            shell_quote(&settings.client_binary),
            DATABASE_URL_ENV,
            shell_quote(&file.to_string_lossy()),
        );

        match self {
            CommandVariant::Direct => CommandSpec::shell(*self, direct),
            CommandVariant::Timeout => {
                CommandSpec::shell(*self, direct).with_timeout(settings.attempt_timeout)
            }
            CommandVariant::ShellLoop => {
                let iterations = settings.shell_loop_iterations.max(1);
                let sequence = (1..=iterations)
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                // Exit status must reflect the client, not the trailing sleep.
                let script = format!(
                    "for i in {seq}; do if {direct}; then exit 0; fi; \
                     if [ \"$i\" -lt {last} ]; then sleep {backoff}; fi; done; exit 1",
                    seq = sequence,
                    direct = direct,
                    last = iterations,
                    backoff = settings.shell_loop_backoff.as_secs(),
                );
                CommandSpec::shell(*self, script)
            }
        }
    }
}

impl fmt::Display for CommandVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Knobs that shape the rendered commands
#[derive(Debug, Clone)]
pub struct VariantSettings {
    pub client_binary: String,
    pub attempt_timeout: Duration,
    pub shell_loop_iterations: u32,
    pub shell_loop_backoff: Duration,
}

impl From<&AppConfig> for VariantSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            client_binary: config.importer.client_binary.clone(),
            attempt_timeout: config.attempt_timeout(),
            shell_loop_iterations: config.importer.shell_loop_iterations,
            shell_loop_backoff: Duration::from_secs(config.importer.shell_loop_backoff_secs),
        }
    }
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// A fully specified external command
#[derive(Clone)]
pub struct CommandSpec {
    pub variant: CommandVariant,
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// `sh -c <script>`
    pub fn shell(variant: CommandVariant, script: String) -> Self {
        Self {
            variant,
            program: SHELL.to_string(),
            args: vec!["-c".to_string(), script],
            envs: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    /// The script passed to the shell
    pub fn script(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }
}

// Env values may hold credentials; only their names are printed.
impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_names: Vec<&str> = self.envs.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("CommandSpec")
            .field("variant", &self.variant)
            .field("program", &self.program)
            .field("args", &self.args)
            .field("envs", &env_names)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Quote a word for POSIX sh
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));

    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}
