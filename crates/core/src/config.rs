//! Client configuration via `conduit.toml`
//!
//! Settings consumed by the HTTP transfer engine. A commented default file
//! can be written next to the application; missing fields fall back to
//! their defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "conduit.toml";

fn default_user_agent() -> String {
    concat!("conduit/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_redirects() -> usize {
    10
}

fn default_worker_threads() -> usize {
    2
}

/// Transfer engine configuration loaded from `conduit.toml`.
///
/// # Example
///
/// ```toml
/// user_agent = "conduit/0.1.0"
/// # default_timeout_ms = 30000
/// connect_timeout_ms = 5000
/// max_redirects = 10
/// worker_threads = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Timeout applied to requests that do not set their own.
    /// Absent means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_ms: Option<u64>,
    /// Connect-phase timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
    /// Redirects followed before giving up; 0 disables redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// I/O worker threads owned by the engine.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            default_timeout_ms: None,
            connect_timeout_ms: None,
            max_redirects: default_max_redirects(),
            worker_threads: default_worker_threads(),
        }
    }
}

impl ClientConfig {
    /// Default request timeout as a `Duration`
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for zero worker threads, an empty
    /// user agent, or zero-valued timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(Error::configuration("worker_threads must be at least 1"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::configuration("user_agent must not be empty"));
        }
        if self.default_timeout_ms == Some(0) || self.connect_timeout_ms == Some(0) {
            return Err(Error::configuration("timeouts must be greater than zero"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# conduit client configuration
#
# User-Agent header sent with every request.
# user_agent = "conduit/0.1.0"

# Timeout for requests that do not set their own, in milliseconds.
# Leave unset to wait indefinitely.
# default_timeout_ms = 30000

# Connect-phase timeout in milliseconds.
# connect_timeout_ms = 5000

# Redirects followed before giving up (0 disables redirects).
max_redirects = 10

# I/O worker threads driving transfers.
worker_threads = 2
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_has_no_timeout() {
        let config = ClientConfig::default();
        assert!(config.default_timeout().is_none());
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("conduit/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_parses_correctly() {
        let config: ClientConfig = toml::from_str(ClientConfig::default_toml()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config: ClientConfig = toml::from_str("worker_threads = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: ClientConfig = toml::from_str("default_timeout_ms = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeouts_convert_to_durations() {
        let config: ClientConfig =
            toml::from_str("default_timeout_ms = 1500\nconnect_timeout_ms = 200").unwrap();
        assert_eq!(config.default_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        ClientConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.worker_threads, 2);
    }

    #[test]
    fn test_write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "worker_threads = 4\n").unwrap();
        ClientConfig::write_default_if_missing(&path).unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.worker_threads, 4);
    }

    #[test]
    fn test_from_file_reports_parse_errors_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "worker_threads = \"many\"\n").unwrap();

        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_from_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ClientConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = ClientConfig {
            user_agent: "probe/1".to_string(),
            default_timeout_ms: Some(2500),
            connect_timeout_ms: None,
            max_redirects: 0,
            worker_threads: 1,
        };
        config.write_to_file(&path).unwrap();

        let loaded = ClientConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("connect_timeout_ms"));
    }
}
