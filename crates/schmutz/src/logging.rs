//! Tracing subscriber setup.

use miette::{IntoDiagnostic, Result, WrapErr};
use schmutz_core::Config;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directive: `--debug`, then `--verbose`, then `RUST_LOG`, then the config.
fn directive(config_level: &str, verbose: bool, debug: bool, env: Option<String>) -> String {
    if debug {
        "debug".to_string()
    } else if verbose {
        "info".to_string()
    } else if let Some(env) = env.filter(|e| !e.trim().is_empty()) {
        env
    } else {
        config_level.to_string()
    }
}

/// Parse the directive, falling back to `warn` with a message describing the bad input.
fn build_filter(directive: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(e) => (
            EnvFilter::new("warn"),
            Some(format!(
                "Invalid log filter '{}' ({}), falling back to 'warn'",
                directive, e
            )),
        ),
    }
}

/// Install the global subscriber: stderr, plus the configured log file if any.
pub fn init(config: &Config, verbose: bool, debug: bool) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = directive(&config.log_level, verbose, debug, env);
    let (filter, fallback) = build_filter(&directive);

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to open log file {}", path))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(message) = fallback {
        tracing::warn!("{}", message);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_take_precedence() {
        let env = Some("trace".to_string());
        assert_eq!(directive("warn", true, true, env.clone()), "debug");
        assert_eq!(directive("warn", true, false, env), "info");
    }

    #[test]
    fn test_env_over_config() {
        assert_eq!(
            directive("warn", false, false, Some("schmutz_slurm=debug".to_string())),
            "schmutz_slurm=debug"
        );
        assert_eq!(directive("error", false, false, Some(" ".to_string())), "error");
        assert_eq!(directive("error", false, false, None), "error");
    }

    #[test]
    fn test_build_filter_valid() {
        let (_, fallback) = build_filter("schmutz_slurm=debug,warn");
        assert!(fallback.is_none());
    }

    #[test]
    fn test_build_filter_invalid_falls_back() {
        let (_, fallback) = build_filter("schmutz=notalevel");
        let message = fallback.expect("invalid directive should report a fallback");
        assert!(message.contains("schmutz=notalevel"));
        assert!(message.contains("'warn'"));
    }
}
