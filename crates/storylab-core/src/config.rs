use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";
pub const ENDPOINT_ENV: &str = "STORYLAB_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the generation service
    pub endpoint: String,
    /// Answer from canned replies instead of calling the service
    pub demo_mode: bool,
    pub request_timeout_secs: u64,
    /// Where exported stories go; the documents folder when unset
    pub export_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            demo_mode: false,
            request_timeout_secs: 60,
            export_dir: None,
        }
    }

    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn export_dir(&self) -> Option<PathBuf> {
        self.export_dir.as_ref().map(PathBuf::from)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("storylab").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.endpoint, "http://localhost:5000");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "demo_mode": true }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.demo_mode);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.export_dir(), None);
    }

    #[test]
    fn test_export_dir_and_timeout_floor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "export_dir": "/tmp/stories", "request_timeout_secs": 0 }"#,
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.export_dir(), Some(PathBuf::from("/tmp/stories")));
        assert_eq!(loaded.request_timeout(), Duration::from_secs(1));
    }
}
