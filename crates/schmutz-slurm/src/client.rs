//! Handle for running SLURM introspection tools.

use camino::Utf8Path;
use schmutz_core::SlurmConfig;
use schmutz_parsers::{CommandExecutor, CommandOutput, ProcessExecutor};

/// Runs squeue, sstat and sacct through a [`CommandExecutor`].
///
/// Holds no job state: every query builds and returns fresh values.
pub struct SlurmClient<E = ProcessExecutor> {
    config: SlurmConfig,
    executor: E,
}

impl SlurmClient<ProcessExecutor> {
    /// Client that spawns the configured tools with the configured timeout.
    pub fn new(config: &SlurmConfig) -> Self {
        Self::with_executor(config, ProcessExecutor::new(config.timeout()))
    }
}

impl<E: CommandExecutor> SlurmClient<E> {
    pub fn with_executor(config: &SlurmConfig, executor: E) -> Self {
        Self {
            config: config.clone(),
            executor,
        }
    }

    pub fn config(&self) -> &SlurmConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub(crate) async fn squeue(&self, args: &[String]) -> CommandOutput {
        self.run(&self.config.squeue_path, args).await
    }

    pub(crate) async fn sstat(&self, args: &[String]) -> CommandOutput {
        self.run(&self.config.sstat_path, args).await
    }

    pub(crate) async fn sacct(&self, args: &[String]) -> CommandOutput {
        self.run(&self.config.sacct_path, args).await
    }

    async fn run(&self, program: &Utf8Path, args: &[String]) -> CommandOutput {
        let output = self.executor.execute(program, args, None).await;
        if !output.success() {
            tracing::debug!(
                "{} exited with {}: {}",
                program,
                output.exit_code,
                output.stderr.trim()
            );
        }
        output
    }
}

/// Build an owned argument list.
pub(crate) fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
