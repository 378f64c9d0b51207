//! Client configuration.

use anyhow::{Context, Result};
use basket_core::{
    ColumnVocabulary, DEFAULT_SERVICE_URL, OperationsConfig, ServiceClientConfig, SessionConfig,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the service base URL.
pub const API_URL_ENV: &str = "BASKET_API_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,
    #[serde(default = "default_status_revert")]
    pub status_revert_secs: u64,
    #[serde(default)]
    pub guard_running_jobs: bool,
    #[serde(default)]
    pub debug_queries: bool,
    /// Extra column labels, e.g. `min_price = "Lowest"`.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Columns formatted as prices in addition to the built-in ones.
    #[serde(default)]
    pub price_columns: Vec<String>,
    /// Columns formatted as timestamps in addition to the built-in ones.
    #[serde(default)]
    pub timestamp_columns: Vec<String>,
}

fn default_api_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_health_interval() -> u64 {
    10
}

fn default_status_revert() -> u64 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
            health_interval_secs: default_health_interval(),
            status_revert_secs: default_status_revert(),
            guard_running_jobs: false,
            debug_queries: false,
            labels: HashMap::new(),
            price_columns: Vec::new(),
            timestamp_columns: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `config/basket.toml`, else the user config file, else defaults.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config/basket.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("basket").join("config.toml"));
        }
        paths
    }

    /// Override the base URL from the environment. Blank values are ignored.
    pub fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
    }

    pub fn vocabulary(&self) -> ColumnVocabulary {
        let mut vocabulary = ColumnVocabulary::default();
        for column in &self.price_columns {
            vocabulary.add_price_column(column);
        }
        for column in &self.timestamp_columns {
            vocabulary.add_timestamp_column(column);
        }
        for (column, label) in &self.labels {
            vocabulary.add_label(column, label);
        }
        vocabulary
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            client: ServiceClientConfig {
                base_url: self.api_url.clone(),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                debug_queries: self.debug_queries,
            },
            operations: OperationsConfig {
                revert_delay: Duration::from_secs(self.status_revert_secs),
                health_interval: Duration::from_secs(self.health_interval_secs),
                guard_running_jobs: self.guard_running_jobs,
            },
            vocabulary: self.vocabulary(),
        }
    }
}
