//! Configuration for schmutz.
//!
//! Configuration is read from a TOML file. Every key is optional; missing keys
//! fall back to the defaults below.

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config from {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: toml::de::Error,
    },
}

/// Thresholds for color-coded efficiency indicators (percentages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyThresholds {
    pub cpu_good: f64,
    pub cpu_warning: f64,
    pub memory_good: f64,
    pub memory_warning: f64,
    pub gpu_good: f64,
    pub gpu_warning: f64,
    pub gpu_memory_good: f64,
    pub gpu_memory_warning: f64,
}

impl Default for EfficiencyThresholds {
    fn default() -> Self {
        Self {
            cpu_good: 80.0,
            cpu_warning: 50.0,
            memory_good: 70.0,
            memory_warning: 40.0,
            gpu_good: 70.0,
            gpu_warning: 40.0,
            gpu_memory_good: 50.0,
            gpu_memory_warning: 25.0,
        }
    }
}

/// SLURM tool locations and the shared command timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlurmConfig {
    pub squeue_path: Utf8PathBuf,
    pub sacct_path: Utf8PathBuf,
    pub sstat_path: Utf8PathBuf,
    /// Per-command timeout in seconds.
    pub command_timeout: u64,
}

impl SlurmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            squeue_path: "/usr/bin/squeue".into(),
            sacct_path: "/usr/bin/sacct".into(),
            sstat_path: "/usr/bin/sstat".into(),
            command_timeout: 30,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the per-user Open OnDemand data directories.
    pub ood_data_root: Utf8PathBuf,
    /// Session directory, relative to a user's data directory.
    pub session_data_dir: Utf8PathBuf,

    pub log_level: String,
    pub log_file: Option<Utf8PathBuf>,

    pub card_title: String,
    pub show_recommendations: bool,
    pub compact_mode: bool,

    pub thresholds: EfficiencyThresholds,
    pub slurm: SlurmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ood_data_root: "/var/lib/ondemand-nginx".into(),
            session_data_dir: "data/sys/dashboard/batch_connect/db".into(),
            log_level: "warn".to_string(),
            log_file: None,
            card_title: "Job Efficiency".to_string(),
            show_recommendations: true,
            compact_mode: false,
            thresholds: EfficiencyThresholds::default(),
            slurm: SlurmConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Session data path for a user.
    pub fn user_session_path(&self, user: &str) -> Utf8PathBuf {
        self.ood_data_root.join(user).join(&self.session_data_dir)
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file.
    File(Utf8PathBuf),
    /// The requested file does not exist; defaults are in use.
    Missing(Utf8PathBuf),
    /// No file found in the search path; defaults are in use.
    Defaults,
}

/// Configuration files checked when no explicit path is given, in order.
pub fn default_config_paths() -> Vec<Utf8PathBuf> {
    let mut paths = vec![Utf8PathBuf::from("/etc/schmutz/config.toml")];

    if let Some(dirs) = ProjectDirs::from("", "", "schmutz") {
        if let Ok(dir) = Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()) {
            paths.push(dir.join("config.toml"));
        }
    }

    paths.push("config/config.toml".into());
    paths.push("config.toml".into());
    paths
}

/// Load configuration from `path`, or from the first file in the search path.
pub fn load_config(path: Option<&Utf8Path>) -> Result<(Config, ConfigSource), ConfigError> {
    match path {
        Some(path) => load_if_present(path),
        None => load_first(&default_config_paths()),
    }
}

fn load_if_present(path: &Utf8Path) -> Result<(Config, ConfigSource), ConfigError> {
    if !path.exists() {
        return Ok((Config::default(), ConfigSource::Missing(path.to_path_buf())));
    }
    let config = Config::load_from(path)?;
    Ok((config, ConfigSource::File(path.to_path_buf())))
}

fn load_first(candidates: &[Utf8PathBuf]) -> Result<(Config, ConfigSource), ConfigError> {
    match candidates.iter().find(|p| p.exists()) {
        Some(path) => load_if_present(path),
        None => Ok((Config::default(), ConfigSource::Defaults)),
    }
}
