//! Engine configuration
//!
//! Loaded from YAML. Lookup order for the file:
//! 1. an explicit path (`--config`)
//! 2. `$TCHAINS_CONFIG`
//! 3. `<config dir>/transmission-chains/config.yaml`
//!
//! A missing file at the default location means defaults; an explicit path
//! that does not exist is an error. Environment overrides are applied last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "TCHAINS_CONFIG";
pub const FOLLOW_UP_PERIOD_ENV: &str = "TCHAINS_FOLLOW_UP_PERIOD";
pub const WORKER_TIMEOUT_ENV: &str = "TCHAINS_WORKER_TIMEOUT_SECS";
pub const LOG_ENV: &str = "TCHAINS_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    Env { var: String, value: String },

    #[error("Worker timeout must be greater than zero")]
    ZeroTimeout,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Days a contact keeps its chain active
    pub follow_up_period: u32,
    pub worker: WorkerConfig,
    /// `tracing-subscriber` env-filter directive
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            follow_up_period: 28,
            worker: WorkerConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

/// Settings for the worker that hosts builds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

impl WorkerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default config location (~/.config/transmission-chains/config.yaml on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("transmission-chains").join("config.yaml"))
}

impl EngineConfig {
    /// Resolve, read and validate the configuration.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(FOLLOW_UP_PERIOD_ENV) {
            self.follow_up_period = parse_env(FOLLOW_UP_PERIOD_ENV, &value)?;
        }
        if let Some(value) = lookup(WORKER_TIMEOUT_ENV) {
            self.worker.timeout_secs = parse_env(WORKER_TIMEOUT_ENV, &value)?;
        }
        if let Some(value) = lookup(LOG_ENV) {
            self.log_filter = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.worker.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: var.to_string(),
        value: value.to_string(),
    })
}
