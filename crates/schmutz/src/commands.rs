//! Sub-command handlers.

use camino::{Utf8Path, Utf8PathBuf};
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use schmutz_card::SessionCard;
use schmutz_cli::{Command, JobSummary, SessionRow, format_report, format_sessions};
use schmutz_core::{Config, SessionLocator};
use schmutz_slurm::{JobMetrics, SlurmClient};
use std::fs;
use std::process::ExitCode;

pub struct App {
    config: Config,
    slurm: SlurmClient,
    card: SessionCard,
    sessions: SessionLocator,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            slurm: SlurmClient::new(&config.slurm),
            card: SessionCard::new(&config),
            sessions: SessionLocator::new(&config),
            config,
        }
    }

    pub async fn run(&self, command: Command) -> Result<ExitCode> {
        match command {
            Command::Status { job_id, json } => self.status(&job_id, json).await,
            Command::Update {
                job_id,
                session_path,
                user,
            } => self.update(&job_id, session_path, user).await,
            Command::List { user } => self.list(user).await,
            Command::Html { job_id, output } => self.html(&job_id, output.as_deref()).await,
        }
    }

    async fn status(&self, job_id: &str, json: bool) -> Result<ExitCode> {
        let Some(metrics) = self.slurm.job_stats(job_id).await else {
            eprintln!("Error: Could not get status for job {}", job_id);
            return Ok(ExitCode::FAILURE);
        };

        println!("{}", format_report(&metrics, &self.config.thresholds));

        if json {
            let summary = serde_json::to_string_pretty(&JobSummary::from(&metrics))
                .into_diagnostic()?;
            println!("JSON:");
            println!("{}", summary);
        }

        Ok(ExitCode::SUCCESS)
    }

    async fn update(
        &self,
        job_id: &str,
        session_path: Option<Utf8PathBuf>,
        user: Option<String>,
    ) -> Result<ExitCode> {
        let Some(metrics) = self.metrics(job_id).await else {
            return Ok(ExitCode::FAILURE);
        };

        let session_dir = match session_path {
            Some(path) => path,
            None => {
                let user = user.unwrap_or_else(|| metrics.user.clone());
                match self.sessions.find_session_for_job(&user, job_id) {
                    Some(path) => path,
                    None => {
                        eprintln!("Error: Could not find OOD session for job {}", job_id);
                        eprintln!("Use --session-path to specify the session directory");
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        };

        match self.card.write_session_card(&session_dir, &metrics) {
            Ok(path) => {
                println!("Updated session card: {}", path);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                tracing::error!("{}", e);
                eprintln!("Error: Failed to update session card");
                Ok(ExitCode::FAILURE)
            }
        }
    }

    async fn list(&self, user: Option<String>) -> Result<ExitCode> {
        let user = match user {
            Some(user) => user,
            None => current_user()?,
        };

        let mut rows = Vec::new();
        for session in self.sessions.list_active_sessions(&user) {
            let metrics = self.slurm.job_stats(&session.job_id).await;
            rows.push(SessionRow::new(
                &session.job_id,
                session.name(),
                metrics.as_ref(),
            ));
        }

        print!("{}", format_sessions(&user, &rows));
        Ok(ExitCode::SUCCESS)
    }

    async fn html(&self, job_id: &str, output: Option<&Utf8Path>) -> Result<ExitCode> {
        let Some(metrics) = self.metrics(job_id).await else {
            return Ok(ExitCode::FAILURE);
        };

        let html = self.card.render(&metrics);
        match output {
            Some(path) => {
                fs::write(path, html)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to write {}", path))?;
                println!("HTML written to {}", path);
            }
            None => println!("{}", html),
        }

        Ok(ExitCode::SUCCESS)
    }

    async fn metrics(&self, job_id: &str) -> Option<JobMetrics> {
        let metrics = self.slurm.job_stats(job_id).await;
        if metrics.is_none() {
            eprintln!("Error: Could not get metrics for job {}", job_id);
        }
        metrics
    }
}

/// Login name of the invoking user.
fn current_user() -> Result<String> {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| miette!("Could not determine the current user; pass --user"))
}
