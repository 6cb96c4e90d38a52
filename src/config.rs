//! Configuration management for support-desk.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::menu::SupportContacts;
use crate::session::SessionStore;
use crate::sweeper::TimeoutSweeper;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Session lifecycle configuration.
    pub sessions: SessionsSection,
    /// Contact details quoted in replies.
    pub support: SupportContacts,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Session lifecycle section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    /// JSON file holding the session collection. Empty keeps it in memory.
    pub store_path: String,
    /// Inactivity timeout in seconds.
    pub timeout_secs: u64,
    /// Seconds between timeout sweeps.
    pub sweep_interval_secs: u64,
    /// Clear the collection when the process starts.
    pub reset_on_start: bool,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            store_path: "contacts.json".to_string(),
            timeout_secs: 300,
            sweep_interval_secs: 60,
            reset_on_start: true,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SUPPORT_DESK_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("SUPPORT_DESK_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(path) = std::env::var("SUPPORT_DESK_STORE") {
            self.sessions.store_path = path;
        }

        if let Ok(secs) = std::env::var("SUPPORT_DESK_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.sessions.timeout_secs = secs;
            }
        }

        if let Ok(level) = std::env::var("SUPPORT_DESK_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    ///
    /// Only options actually given on the command line override lower layers.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref path) = args.store {
            self.sessions.store_path = path.to_string_lossy().into_owned();
        }

        if args.memory {
            self.sessions.store_path.clear();
        }

        if let Some(secs) = args.timeout_secs {
            self.sessions.timeout_secs = secs;
        }

        if let Some(secs) = args.sweep_interval_secs {
            self.sessions.sweep_interval_secs = secs;
        }

        if args.keep_sessions {
            self.sessions.reset_on_start = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sessions.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("timeout_secs", "0".to_string()));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "sweep_interval_secs",
                "0".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Session file path, or `None` for an in-memory store.
    pub fn store_path(&self) -> Option<PathBuf> {
        let path = self.sessions.store_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// Build the session store this configuration describes.
    pub fn build_store(&self) -> SessionStore {
        match self.store_path() {
            Some(path) => SessionStore::file(path),
            None => SessionStore::in_memory(),
        }
    }

    /// Build the timeout sweeper this configuration describes.
    pub fn sweeper(&self) -> TimeoutSweeper {
        TimeoutSweeper::new(
            Duration::from_secs(self.sessions.timeout_secs),
            Duration::from_secs(self.sessions.sweep_interval_secs),
        )
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Setting out of range.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.sessions.timeout_secs, 300);
        assert_eq!(config.sessions.sweep_interval_secs, 60);
        assert!(config.sessions.reset_on_start);
        assert_eq!(config.store_path(), Some(PathBuf::from("contacts.json")));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "server": {
                "host": "0.0.0.0",
                "port": 8080
            },
            "sessions": {
                "store_path": "/var/lib/support-desk/contacts.json",
                "timeout_secs": 600
            },
            "support": {
                "email": "help@acme.test"
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sessions.timeout_secs, 600);
        assert_eq!(config.sessions.sweep_interval_secs, 60); // Default
        assert_eq!(config.support.email, "help@acme.test");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{
            "server": {
                "port": 9000
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1"); // Default
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            host: Some("192.168.1.1".parse().unwrap()),
            port: Some(5000),
            timeout_secs: Some(120),
            keep_sessions: true,
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.sessions.timeout_secs, 120);
        assert!(!config.sessions.reset_on_start);
    }

    #[test]
    fn test_unset_args_keep_file_values() {
        let mut config = Config::default();
        config.server.port = 7000;

        config.apply_args(&Args::default());
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_memory_flag_clears_store_path() {
        let mut config = Config::default();
        let args = Args {
            memory: true,
            ..Args::default()
        };

        config.apply_args(&args);
        assert!(config.store_path().is_none());
    }

    #[test]
    fn test_to_server_config() {
        let config = Config::default();
        let server_config = config.to_server_config().unwrap();

        assert_eq!(server_config.host, "127.0.0.1");
        assert_eq!(server_config.port, 3000);
        assert!(server_config.graceful_shutdown);
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();

        let result = config.to_server_config();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.sessions.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue("timeout_secs", _))
        ));
    }

    #[test]
    fn test_sweeper_from_config() {
        let mut config = Config::default();
        config.sessions.timeout_secs = 30;
        config.sessions.sweep_interval_secs = 5;

        let sweeper = config.sweeper();
        assert_eq!(sweeper.timeout(), Duration::from_secs(30));
        assert_eq!(sweeper.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"store_path\""));
        assert!(json.contains("\"timeout_secs\""));
        assert!(json.contains("\"chat_url\""));
    }
}
