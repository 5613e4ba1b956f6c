use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1/";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

const ENV_API_BASE: &str = "KANBAN_API_BASE";
const ENV_DATA_DIR: &str = "KANBAN_DATA_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_route")]
    pub login_route: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Unset means requests wait for the server indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_route: default_login_route(),
            tick_interval_ms: default_tick_interval_ms(),
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Reads `config.json` from `data_dir`; a missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Applies `KANBAN_API_BASE` on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(base) = non_empty_env(ENV_API_BASE) {
            self.base_url = base;
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Resolves the directory for config, credentials and logs.
pub fn data_directory() -> PathBuf {
    if let Some(dir) = non_empty_env(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".kanban-client")
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(dir.path()).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "base_url": "https://boards.example/api/", "request_timeout_secs": 30 }"#,
        )
        .unwrap();

        let config = ClientConfig::load(dir.path()).unwrap();
        assert_eq!(config.base_url, "https://boards.example/api/");
        assert_eq!(config.login_route, DEFAULT_LOGIN_ROUTE);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), b"{ nope").unwrap();
        assert!(matches!(
            ClientConfig::load(dir.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn zero_tick_interval_is_clamped() {
        let config = ClientConfig {
            tick_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }
}
