//! Process configuration.
//!
//! Precedence: CLI flags > environment > config files > defaults. Config files are
//! read in order (explicit path, `SERIESQUERY_CONFIG`, `~/.config/seriesquery.toml`,
//! `./seriesquery.toml`) and the first file that sets a key wins.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::service::EmptyFilterPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// NDJSON file the store is loaded from at startup.
    pub data_path: Option<PathBuf>,
    /// log4rs config file; when set it replaces the programmatic setup.
    pub log_config: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_retention: Option<usize>,
    pub empty_filter_policy: Option<EmptyFilterPolicy>,
}

impl ServiceConfig {
    /// # Errors
    /// Returns [`ConfigError::Toml`] on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&s)
    }

    /// Builds the configuration from files and the process environment.
    ///
    /// # Errors
    /// An explicitly named file that is missing or malformed is an error; implicit
    /// locations are skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(p) = explicit {
            cfg.fill_from(Self::from_file(p)?);
        }
        for p in implicit_config_paths() {
            if p.exists() {
                cfg.fill_from(Self::from_file(&p)?);
            }
        }
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Sets every key that is still unset from `other`.
    pub fn fill_from(&mut self, other: Self) {
        if self.data_path.is_none() {
            self.data_path = other.data_path;
        }
        if self.log_config.is_none() {
            self.log_config = other.log_config;
        }
        if self.log_dir.is_none() {
            self.log_dir = other.log_dir;
        }
        if self.log_level.is_none() {
            self.log_level = other.log_level;
        }
        if self.log_retention.is_none() {
            self.log_retention = other.log_retention;
        }
        if self.empty_filter_policy.is_none() {
            self.empty_filter_policy = other.empty_filter_policy;
        }
    }

    /// Overrides keys from environment variables, read through `lookup`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when a variable holds an unusable value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(s) = lookup("SERIESQUERY_DATA") {
            self.data_path = Some(PathBuf::from(s));
        }
        if let Some(s) = lookup("SERIESQUERY_LOG_CONFIG") {
            self.log_config = Some(PathBuf::from(s));
        }
        if let Some(s) = lookup("SERIESQUERY_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(s));
        }
        if let Some(s) = lookup("SERIESQUERY_LOG_LEVEL") {
            self.log_level = Some(s);
        }
        if let Some(s) = lookup("SERIESQUERY_LOG_RETENTION") {
            let n = s.parse::<usize>().map_err(|e| ConfigError::Invalid {
                key: "SERIESQUERY_LOG_RETENTION".into(),
                message: e.to_string(),
            })?;
            self.log_retention = Some(n);
        }
        if let Some(s) = lookup("SERIESQUERY_EMPTY_FILTER") {
            let p = s.parse::<EmptyFilterPolicy>().map_err(|message| ConfigError::Invalid {
                key: "SERIESQUERY_EMPTY_FILTER".into(),
                message,
            })?;
            self.empty_filter_policy = Some(p);
        }
        Ok(())
    }

    #[must_use]
    pub fn empty_filter_policy(&self) -> EmptyFilterPolicy {
        self.empty_filter_policy.unwrap_or_default()
    }
}

fn implicit_config_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = vec![];
    if let Ok(p) = std::env::var("SERIESQUERY_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(home) = std::env::var("USERPROFILE").or_else(|_| std::env::var("HOME")) {
        paths.push(PathBuf::from(home).join(".config").join("seriesquery.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("seriesquery.toml"));
    }
    paths
}
