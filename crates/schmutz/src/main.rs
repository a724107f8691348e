//! Schmutz - SLURM job efficiency metrics.

mod commands;
mod logging;

use clap::{CommandFactory, Parser};
use miette::{IntoDiagnostic, Result};
use schmutz_cli::Args;
use schmutz_core::{ConfigSource, load_config};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let Some(command) = args.action() else {
        Args::command().print_help().into_diagnostic()?;
        return Ok(ExitCode::SUCCESS);
    };

    let (config, source) = load_config(args.config.as_deref()).into_diagnostic()?;
    logging::init(&config, args.verbose, args.debug)?;

    match &source {
        ConfigSource::File(path) => tracing::info!("Loaded config from {}", path),
        ConfigSource::Missing(path) => {
            tracing::warn!("Config file not found: {}, using defaults", path)
        }
        ConfigSource::Defaults => tracing::info!("No config file found, using defaults"),
    }

    commands::App::new(config).run(command).await
}
