//! TOML-based configuration for the client application.
//!
//! ```toml
//! [client]
//! host = "127.0.0.1"
//! port = 12321
//! worker_threads = 2
//! max_line_len = 16777216
//! log_level = "info"
//! ```
//!
//! Every field is optional; a missing file means "all defaults".

use std::path::{Path, PathBuf};

use flyt_core::protocol::stream::DEFAULT_MAX_LINE_LEN;
use flyt_core::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::network::service::DEFAULT_WORKER_THREADS;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "flyt-client.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,
}

/// Connection and runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Server hostname or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker threads of the network runtime.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Longest response line accepted, in bytes.
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_worker_threads() -> usize {
    DEFAULT_WORKER_THREADS
}
fn default_max_line_len() -> usize {
    DEFAULT_MAX_LINE_LEN
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: default_worker_threads(),
            max_line_len: default_max_line_len(),
            log_level: default_log_level(),
        }
    }
}

/// Loads the config at `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 12321);
        assert_eq!(cfg.worker_threads, 2);
        assert_eq!(cfg.max_line_len, 16 * 1024 * 1024);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let text = "[client]\nhost = \"10.0.0.7\"\nworker_threads = 4\n";

        // Act
        let cfg: AppConfig = toml::from_str(text).expect("deserialize");

        // Assert
        assert_eq!(cfg.client.host, "10.0.0.7");
        assert_eq!(cfg.client.worker_threads, 4);
        assert_eq!(cfg.client.port, 12321);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = AppConfig::default();
        cfg.client.port = 4000;
        cfg.client.log_level = "debug".to_string();

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&text).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("flyt-client-config-that-does-not-exist.toml");
        let cfg = load_config(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!("flyt-client-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[client]\nport = \"not a number\"\n").unwrap();

        let result = load_config(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
