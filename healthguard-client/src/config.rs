//! Client configuration
//!
//! Handles:
//! - Backend origin, optional proxy prefix and request timeout
//! - Live monitor polling interval and rolling history size
//! - Where the session credentials are persisted
//!
//! Every endpoint (auth, prediction, chat, monitor...) is resolved against the
//! single `backend.origin`, so pointing the client at another backend is one
//! setting.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "HEALTHGUARD_CONFIG";
pub const ENV_BACKEND_URL: &str = "HEALTHGUARD_BACKEND_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not find config directory")]
    NoConfigDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub monitor: MonitorConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub origin: String,
    /// Path prefix when the backend sits behind a proxy (e.g. `/api`)
    pub api_prefix: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_ms: u64,
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub storage: StorageKind,
    /// Session file, defaults to `<config dir>/healthguard/session.json`
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:5000".to_string(),
            api_prefix: None,
            timeout_secs: 100,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            history_capacity: 20,
        }
    }
}

impl BackendConfig {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Origin plus normalised prefix, without trailing slash
    pub fn base_url(&self) -> String {
        let origin = self.origin.trim_end_matches('/');
        match self.api_prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(prefix) if !prefix.is_empty() => format!("{}/{}", origin, prefix),
            _ => origin.to_string(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl ClientConfig {
    /// Load config from `HEALTHGUARD_CONFIG` or the OS-specific location,
    /// then apply environment overrides
    pub async fn load() -> Result<Self, ConfigError> {
        let path = Self::config_file_path()?;
        let mut config = Self::load_from(&path).await?;
        config.apply_overrides(std::env::var(ENV_BACKEND_URL).ok());
        Ok(config)
    }

    /// A missing or empty file yields the defaults
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(&content)?)
    }

    pub fn apply_overrides(&mut self, backend_url: Option<String>) {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!("backend origin overridden to {}", url);
            self.backend.origin = url;
        }
    }

    pub async fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_file_path()?;
        self.save_to(&path).await?;
        Ok(path)
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Get config file path
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::app_dir()?.join("config.toml"))
    }

    /// Session file location: explicit setting first, then the app directory
    pub fn session_file_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.session.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::app_dir()?.join("session.json")),
        }
    }

    fn app_dir() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push("healthguard");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.backend.timeout(), Duration::from_secs(100));
        assert_eq!(config.monitor.interval(), Duration::from_secs(2));
        assert_eq!(config.monitor.history_capacity, 20);
        assert_eq!(config.session.storage, StorageKind::File);
    }

    #[test]
    fn test_base_url_joins_prefix() {
        let mut backend = BackendConfig::with_origin("http://localhost:5000/");
        assert_eq!(backend.base_url(), "http://localhost:5000");

        backend.api_prefix = Some("/api/".to_string());
        assert_eq!(backend.base_url(), "http://localhost:5000/api");

        backend.api_prefix = Some(String::new());
        assert_eq!(backend.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [backend]
            origin = "http://10.0.0.2:8000"

            [session]
            storage = "keyring"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.origin, "http://10.0.0.2:8000");
        assert_eq!(config.backend.timeout_secs, 100);
        assert_eq!(config.monitor, MonitorConfig::default());
        assert_eq!(config.session.storage, StorageKind::Keyring);
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut config = ClientConfig::default();
        config.apply_overrides(Some("   ".to_string()));
        assert_eq!(config.backend.origin, "http://127.0.0.1:5000");

        config.apply_overrides(Some("http://backend:5000".to_string()));
        assert_eq!(config.backend.origin, "http://backend:5000");
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ClientConfig::default();
        config.monitor.history_capacity = 50;
        config.backend.api_prefix = Some("/api".to_string());
        config.save_to(&path).await.unwrap();

        let loaded = ClientConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ClientConfig::load_from(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(loaded, ClientConfig::default());
    }
}
