//! Configuration module for the WebCraft backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of all persisted editor state
    pub data_dir: PathBuf,
    /// Directory holding the static template HTML (`<id>/index.html`)
    pub templates_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// URL prefix the template assets are served under
    pub preview_prefix: String,
    /// Coalescing window for preview content updates
    pub preview_debounce: Duration,
}

/// Invalid environment value.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("WEBCRAFT_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let templates_dir = env::var("WEBCRAFT_TEMPLATES_DIR")
            .unwrap_or_else(|_| "./templates".to_string())
            .into();

        let bind_addr = env::var("WEBCRAFT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| ConfigError(format!("WEBCRAFT_BIND_ADDR: {}", e)))?;

        let log_level = env::var("WEBCRAFT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let preview_prefix = env::var("WEBCRAFT_PREVIEW_PREFIX")
            .unwrap_or_else(|_| "/templates".to_string())
            .trim_end_matches('/')
            .to_string();

        let debounce_ms: u64 = env::var("WEBCRAFT_PREVIEW_DEBOUNCE_MS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|e| ConfigError(format!("WEBCRAFT_PREVIEW_DEBOUNCE_MS: {}", e)))?;

        Ok(Self {
            data_dir,
            templates_dir,
            bind_addr,
            log_level,
            preview_prefix,
            preview_debounce: Duration::from_millis(debounce_ms),
        })
    }
}
