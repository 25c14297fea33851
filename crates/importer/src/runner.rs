//! External command execution
//!
//! The importer talks to the database client only through [`CommandRunner`],
//! so tests can stand in for `psql`.

use crate::variant::CommandSpec;
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Outcome of one command attempt
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Zero exit status
    pub success: bool,
    /// Exit code, absent when killed by a signal or never started
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Killed for exceeding the attempt timeout
    pub timed_out: bool,
}

impl CommandOutput {
    /// A successful attempt
    #[cfg(test)]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// A failed attempt that never produced an exit status
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            stderr: reason.into(),
            ..Self::default()
        }
    }

    fn timed_out(limit: Duration) -> Self {
        Self {
            stderr: format!("command timed out after {}s", limit.as_secs_f64()),
            timed_out: true,
            ..Self::default()
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: false,
        }
    }
}

/// Trait for running external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion. Failures of any kind come back as an
    /// unsuccessful [`CommandOutput`], never as a panic.
    async fn run(&self, spec: &CommandSpec) -> CommandOutput;
}

/// Runs commands as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellCommandRunner;

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput {
        debug!(program = %spec.program, script = %spec.script(), "Spawning command");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a timeout also reaches whatever the shell forked
        #[cfg(unix)]
        command.process_group(0);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return CommandOutput::failed(format!("failed to start {}: {}", spec.program, e)),
        };
        let pid = child.id();

        let waiting = child.wait_with_output();
        tokio::pin!(waiting);

        let waited = match spec.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut waiting).await {
                Ok(result) => result,
                Err(_) => {
                    if let Some(pid) = pid {
                        kill_process_group(pid);
                    }
                    // Dropping the wait future drops the child, which kills the shell.
                    return CommandOutput::timed_out(limit);
                }
            },
            None => waiting.await,
        };

        match waited {
            Ok(output) => output.into(),
            Err(e) => CommandOutput::failed(format!("failed to wait for {}: {}", spec.program, e)),
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: kill(2) only signals; a negative pid targets the group.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "Process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::variant::{CommandVariant, VariantSettings, DATABASE_URL_ENV};
    use std::path::Path;

    fn script(body: &str) -> CommandSpec {
        CommandSpec::shell(CommandVariant::Direct, body.to_string())
    }

    #[tokio::test]
    async fn test_success_captures_stdout() {
        let output = ShellCommandRunner.run(&script("echo hello")).await;
        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let output = ShellCommandRunner.run(&script("echo boom >&2; exit 3")).await;
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "boom");
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let spec = script("sleep 5").with_timeout(Duration::from_millis(100));
        let output = ShellCommandRunner.run(&spec).await;
        assert!(!output.success);
        assert!(output.timed_out);
        assert!(output.stderr.contains("timed out"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_forked_children() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("child.pid");
        let spec = script(&format!("sleep 30 & echo $! > '{}'; wait", pid_file.display()))
            .with_timeout(Duration::from_millis(300));

        let output = ShellCommandRunner.run(&spec).await;
        assert!(output.timed_out);

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let mut alive = true;
        for _ in 0..40 {
            alive = is_running(&pid);
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!alive, "forked child {pid} outlived the timeout");
    }

    /// Present in /proc and not a zombie
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat"))
            .ok()
            .and_then(|stat| stat.rsplit(')').next().map(|rest| rest.trim_start().to_string()))
            .map(|state| !state.starts_with('Z') && !state.starts_with('X'))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_missing_program_is_failure() {
        let mut spec = script("true");
        spec.program = "importkit-no-such-shell".to_string();
        let output = ShellCommandRunner.run(&spec).await;
        assert!(!output.success);
        assert!(output.exit_code.is_none());
        assert!(output.stderr.contains("failed to start"));
    }

    #[tokio::test]
    async fn test_env_reaches_child() {
        let spec = script("printf '%s' \"$IMPORTKIT_DATABASE_URL\"")
            .with_env(DATABASE_URL_ENV, "postgresql://db/app");
        let output = ShellCommandRunner.run(&spec).await;
        assert_eq!(output.stdout, "postgresql://db/app");
    }

    #[tokio::test]
    async fn test_shell_loop_reports_client_status() {
        let settings = |client: &str| VariantSettings {
            client_binary: client.to_string(),
            attempt_timeout: Duration::from_secs(5),
            shell_loop_iterations: 2,
            shell_loop_backoff: Duration::ZERO,
        };

        let failing = CommandVariant::ShellLoop.render(Path::new("a.sql"), &settings("false"));
        let output = ShellCommandRunner.run(&failing).await;
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(1));

        let passing = CommandVariant::ShellLoop.render(Path::new("a.sql"), &settings("true"));
        assert!(ShellCommandRunner.run(&passing).await.success);
    }
}
