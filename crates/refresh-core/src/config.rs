use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RefreshError;

/// Environment variable that overrides the configured API base URL.
pub const API_URL_ENV: &str = "SNYK_API";

/// Top-level refresh configuration, stored at `~/.refresh/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Base URL of the scanning platform API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Maximum number of accounts processed in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Default manifest output path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient HTTP failures (network, 429, 5xx).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_url() -> String {
    "https://api.snyk.io".to_string()
}

fn default_concurrency() -> usize {
    5
}

fn default_output() -> PathBuf {
    PathBuf::from("refresh-import-targets.json")
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            concurrency: default_concurrency(),
            output: default_output(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl RefreshConfig {
    /// Returns the refresh home directory (`~/.refresh/`).
    pub fn home_dir() -> Result<PathBuf, RefreshError> {
        let base = dirs::home_dir().ok_or_else(|| RefreshError::Config {
            message: "could not determine home directory".into(),
        })?;
        Ok(base.join(".refresh"))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Result<PathBuf, RefreshError> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load config from the default location, or return defaults if not found.
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self, RefreshError> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, RefreshError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| RefreshError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(api_url = %url, "using API URL from environment");
            self.api_url = url.trim().trim_end_matches('/').to_string();
        }
    }

    /// Reject values the orchestrator and client cannot work with.
    pub fn validate(&self) -> Result<(), RefreshError> {
        if self.concurrency == 0 {
            return Err(RefreshError::Config {
                message: "concurrency must be at least 1".into(),
            });
        }
        let parsed = url::Url::parse(&self.api_url).map_err(|e| RefreshError::Config {
            message: format!("invalid api_url {}: {e}", self.api_url),
        })?;
        if parsed.host_str().is_none() {
            return Err(RefreshError::Config {
                message: format!("api_url {} has no host", self.api_url),
            });
        }
        Ok(())
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), RefreshError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RefreshError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Initialize the refresh home directory with default config.
    pub fn init() -> Result<PathBuf, RefreshError> {
        let home = Self::home_dir()?;
        std::fs::create_dir_all(&home)?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            Self::default().save_to(&config_path)?;
        }

        Ok(home)
    }
}
