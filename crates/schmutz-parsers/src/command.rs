//! Command execution for scheduler queries.
//!
//! Every scheduler query goes through a [`CommandExecutor`]. Failures never
//! surface as errors: they come back as a [`CommandOutput`] with exit code `-1`
//! and a diagnostic on stderr.

use camino::Utf8Path;
use std::future::Future;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Exit code reported when the process could not be run to completion.
pub const EXECUTION_FAILED: i32 = -1;

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {command}")]
    NotFound { command: String },
    #[error("Command timed out after {}s: {command}", timeout.as_secs_f64())]
    TimedOut { command: String, timeout: Duration },
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
}

/// Captured result of a command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Output of a command that exited cleanly.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Output of a command that could not be executed.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: EXECUTION_FAILED,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Trimmed stdout, if the command succeeded and printed anything.
    pub fn data(&self) -> Option<&str> {
        let out = self.stdout.trim();
        (self.success() && !out.is_empty()).then_some(out)
    }
}

impl From<CommandError> for CommandOutput {
    fn from(err: CommandError) -> Self {
        Self::failed(err.to_string())
    }
}

/// Runs external scheduler tools.
pub trait CommandExecutor {
    /// Run `program` with `args`, using the executor's default timeout unless
    /// `timeout` overrides it.
    fn execute(
        &self,
        program: &Utf8Path,
        args: &[String],
        timeout: Option<Duration>,
    ) -> impl Future<Output = CommandOutput>;
}

/// Executor that spawns real processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    default_timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

impl CommandExecutor for ProcessExecutor {
    async fn execute(
        &self,
        program: &Utf8Path,
        args: &[String],
        timeout: Option<Duration>,
    ) -> CommandOutput {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!("Running {} {}", program, args.join(" "));

        match run_command(&mut cmd, program.as_str(), timeout).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("{}", e);
                e.into()
            }
        }
    }
}

/// Execute a command with a timeout and capture its output.
///
/// A non-zero exit is not an error here; it is reported through
/// [`CommandOutput::exit_code`].
pub async fn run_command(
    cmd: &mut Command,
    name: &str,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            return Err(CommandError::TimedOut {
                command: name.to_string(),
                timeout,
            });
        }
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            return Err(CommandError::NotFound {
                command: name.to_string(),
            });
        }
        Ok(Err(e)) => {
            return Err(CommandError::Execution {
                command: name.to_string(),
                error: e.to_string(),
            });
        }
        Ok(Ok(output)) => output,
    };

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        // Killed by a signal
        exit_code: output.status.code().unwrap_or(EXECUTION_FAILED),
    })
}
