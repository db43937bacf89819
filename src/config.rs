//! Configuration management for the star registry

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Maximum age of an ownership challenge, in seconds.
    #[serde(default = "default_challenge_window")]
    pub challenge_window_secs: u64,
    /// Last field of every challenge message.
    #[serde(default = "default_message_suffix")]
    pub message_suffix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            challenge_window_secs: default_challenge_window(),
            message_suffix: default_message_suffix(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_challenge_window() -> u64 {
    300
}

fn default_message_suffix() -> String {
    "starRegistry".to_string()
}

impl Config {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.server.api_port == 0 {
            return Err(ChainError::Config("server.api_port must be non-zero".into()));
        }
        if self.registry.challenge_window_secs == 0 {
            return Err(ChainError::Config(
                "registry.challenge_window_secs must be non-zero".into(),
            ));
        }
        let suffix = &self.registry.message_suffix;
        if suffix.is_empty() || suffix.contains(':') {
            return Err(ChainError::Config(
                "registry.message_suffix must be non-empty and must not contain ':'".into(),
            ));
        }
        Ok(())
    }
}

/// Loads `path`, falling back to defaults when the file does not exist.
/// The `PORT` environment variable overrides `server.api_port`.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    let mut config: Config = if path.exists() {
        let config_str = fs::read_to_string(path)
            .map_err(|e| ChainError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&config_str)
            .map_err(|e| ChainError::Config(format!("{}: {}", path.display(), e)))?
    } else {
        Config::default()
    };

    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        config.server.api_port = port;
    }

    config.validate()?;
    Ok(config)
}

pub fn load_config() -> Result<Config, ChainError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.registry.challenge_window_secs, 300);
        assert_eq!(config.registry.message_suffix, "starRegistry");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[registry]\nchallenge_window_secs = 60").unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.registry.challenge_window_secs, 60);
        assert_eq!(config.registry.message_suffix, "starRegistry");
    }

    #[test]
    fn test_rejects_suffix_with_separator() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[registry]\nmessage_suffix = \"a:b\"").unwrap();

        let err = load_config_from(file.path()).unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
    }

    #[test]
    fn test_rejects_unparseable_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[registry\nchallenge_window_secs = ").unwrap();

        assert!(load_config_from(file.path()).is_err());
    }
}
