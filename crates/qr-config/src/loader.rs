//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "qryti.toml",
    "config.toml",
    "./config/qryti.toml",
    "./config/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Load using a custom variable lookup instead of the process environment
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup);
        config.validate()?;

        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("QRYTI_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    // API
    if let Some(val) = lookup("QRYTI_API_BASE_URL") {
        config.api.base_url = val.trim_end_matches('/').to_string();
    }
    if let Some(val) = lookup("QRYTI_API_TIMEOUT_MS") {
        if let Ok(timeout) = val.parse() {
            config.api.timeout_ms = timeout;
        }
    }
    if let Some(val) = lookup("QRYTI_API_USER_AGENT") {
        config.api.user_agent = val;
    }
    if let Some(val) = lookup("QRYTI_API_REFRESH_PATH") {
        config.api.refresh_path = val;
    }

    // Session
    if let Some(val) = lookup("QRYTI_SESSION_STORE_PATH") {
        config.session.store_path = val;
    }

    // List
    if let Some(val) = lookup("QRYTI_LIST_PAGE_SIZE") {
        if let Ok(size) = val.parse() {
            config.list.page_size = size;
        }
    }
    if let Some(val) = lookup("QRYTI_LIST_TEXT_DEBOUNCE_MS") {
        if let Ok(delay) = val.parse() {
            config.list.text_debounce_ms = delay;
        }
    }
    if let Some(val) = lookup("QRYTI_LIST_DISCRETE_DEBOUNCE_MS") {
        if let Ok(delay) = val.parse() {
            config.list.discrete_debounce_ms = delay;
        }
    }

    // Logging
    if let Some(val) = lookup("QRYTI_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = lookup("QRYTI_LOG_FORMAT") {
        config.logging.format = val;
    }
}
