//! Client configuration

use crate::error::{Error, Result};
use std::time::Duration;

/// Configuration for the request gateway
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the compliance platform API
    pub base_url: String,

    /// Path of the refresh endpoint (defaults to /api/auth/refresh)
    pub refresh_path: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("Qryti-Rust-Client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set a custom refresh endpoint path
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set custom user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Absolute URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn refresh_url(&self) -> String {
        self.url(&self.refresh_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base URL must not be empty".into()));
        }
        if !self.refresh_path.starts_with('/') {
            return Err(Error::Config(format!(
                "refresh path must start with '/', got {}",
                self.refresh_path
            )));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}
