//! Configuration and Open OnDemand session discovery for schmutz.

pub mod config;
pub mod session;

pub use config::{
    Config, ConfigError, ConfigSource, EfficiencyThresholds, SlurmConfig, default_config_paths,
    load_config,
};
pub use session::{JOB_ID_FILE, Session, SessionLocator};
