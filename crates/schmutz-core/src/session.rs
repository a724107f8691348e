//! Open OnDemand session discovery.
//!
//! Each interactive session lives in its own directory under the user's
//! session path and records its SLURM job in a `job_id` file.

use crate::config::Config;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File inside a session directory holding the SLURM job ID.
pub const JOB_ID_FILE: &str = "job_id";

/// An active session and the job backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub path: Utf8PathBuf,
    pub job_id: String,
}

impl Session {
    /// Directory name, used as the session label.
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }
}

/// Locates session directories for users.
pub struct SessionLocator {
    config: Config,
}

impl SessionLocator {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Find the session directory for a job.
    pub fn find_session_for_job(&self, user: &str, job_id: &str) -> Option<Utf8PathBuf> {
        let found = self
            .list_active_sessions(user)
            .into_iter()
            .find(|s| s.job_id == job_id)
            .map(|s| s.path);

        if found.is_none() {
            tracing::debug!("No session found for job {}", job_id);
        }
        found
    }

    /// List every session directory of a user that records a job ID.
    ///
    /// Sorted by directory name.
    pub fn list_active_sessions(&self, user: &str) -> Vec<Session> {
        let root = self.config.user_session_path(user);
        let entries = match root.read_dir_utf8() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Cannot read session path {}: {}", root, e);
                return Vec::new();
            }
        };

        let mut sessions: Vec<Session> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let path = entry.path().to_path_buf();
                read_job_id(&path).map(|job_id| Session { path, job_id })
            })
            .collect();

        sessions.sort_by(|a, b| a.path.cmp(&b.path));
        sessions
    }
}

fn read_job_id(session_dir: &Utf8Path) -> Option<String> {
    let file = session_dir.join(JOB_ID_FILE);
    if !file.exists() {
        return None;
    }
    match fs::read_to_string(&file) {
        Ok(content) => Some(content.trim().to_string()),
        Err(e) => {
            tracing::debug!("Error reading {}: {}", file, e);
            None
        }
    }
}
