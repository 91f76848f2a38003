//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on restart)
    Memory,
    /// Single JSON document on disk
    File,
}

impl StorageProvider {
    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("file") || s.eq_ignore_ascii_case("json") {
            Some(Self::File)
        } else if s.eq_ignore_ascii_case("memory") {
            Some(Self::Memory)
        } else {
            None
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8000)
    pub port: u16,
    /// Storage provider (default: file)
    pub storage_provider: StorageProvider,
    /// Link document path (default: ./data/data.json)
    pub data_file: PathBuf,
    /// Log format
    pub log_format: LogFormat,
    /// Public base URL for generated short links; derived from the request
    /// when unset
    pub shortlink_domain: Option<String>,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Port
        let port = match get("PORT").filter(|s| !s.is_empty()) {
            Some(s) => s.parse().map_err(|e| ConfigError {
                field: "PORT",
                message: format!("Invalid port '{}': {}", s, e),
            })?,
            None => 8000,
        };

        // Storage provider
        let storage_provider = match get("STORAGE_PROVIDER").filter(|s| !s.is_empty()) {
            Some(s) => StorageProvider::parse(&s).ok_or_else(|| ConfigError {
                field: "STORAGE_PROVIDER",
                message: format!("Unknown provider '{}', expected file or memory", s),
            })?,
            None => StorageProvider::File,
        };

        // Data file
        let data_file = get("DATA_FILE")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(json_store::DEFAULT_DATA_FILE));

        // Log format
        let log_format =
            LogFormat::from_str(&get("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        // Shortlink domain
        let shortlink_domain = get("SHORTLINK_DOMAIN").filter(|s| !s.is_empty());
        if let Some(dom) = &shortlink_domain {
            let lower = dom.to_ascii_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(ConfigError {
                    field: "SHORTLINK_DOMAIN",
                    message: format!("'{}' must start with http:// or https://", dom),
                });
            }
        }

        Ok(Self {
            port,
            storage_provider,
            data_file,
            log_format,
            shortlink_domain,
        })
    }

    /// Log warnings about configurations that lose data.
    pub fn warn_if_volatile(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "STORAGE_PROVIDER=memory: links are kept in memory and lost on restart."
            );
        }
    }
}
