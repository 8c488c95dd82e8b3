//! Qryti Configuration System
//!
//! TOML-based configuration with `QRYTI_*` environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub list: ListConfig,
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// HTTP request timeout in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Path of the access token refresh endpoint
    pub refresh_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 30_000,
            user_agent: format!("qryti-console/{}", env!("CARGO_PKG_VERSION")),
            refresh_path: "/api/auth/refresh".to_string(),
        }
    }
}

/// Persisted session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file holding the access token, refresh token and cached profile
    pub store_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: "./data/session.json".to_string(),
        }
    }
}

/// List view defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: u32,
    /// Quiet period before a free-text filter triggers a fetch
    pub text_debounce_ms: u64,
    /// Window in which dropdown filter changes coalesce into one fetch
    pub discrete_debounce_ms: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            text_debounce_ms: 300,
            discrete_debounce_ms: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::ValidationError("api.base_url must not be empty".into()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL, got {}",
                base_url
            )));
        }
        if !self.api.refresh_path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "api.refresh_path must start with '/'".into(),
            ));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::ValidationError("api.timeout_ms must be positive".into()));
        }
        if self.list.page_size == 0 {
            return Err(ConfigError::ValidationError("list.page_size must be positive".into()));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Qryti console configuration
# Environment variables (QRYTI_*) override these settings

[api]
base_url = "http://localhost:5000"
timeout_ms = 30000
refresh_path = "/api/auth/refresh"

[session]
store_path = "./data/session.json"

[list]
page_size = 10
text_debounce_ms = 300
discrete_debounce_ms = 10

[logging]
level = "info"
format = "text"  # text or json
"#
        .to_string()
    }
}
