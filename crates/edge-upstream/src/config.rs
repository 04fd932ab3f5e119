//! # Service Configuration
//!
//! Configuration for the upstream payment service.
//! Values are loaded from environment variables.

use edge_core::EdgeError;
use std::env;

/// Default upstream payment service
pub const DEFAULT_SERVICE_URL: &str = "https://api.zpaynow.com";

/// Upstream payment service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the payment service (no trailing slash)
    pub base_url: String,

    /// API key, forwarded as the `apikey` query parameter
    pub api_key: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SERVICE` (optional, defaults to [`DEFAULT_SERVICE_URL`])
    /// - `APIKEY` (required)
    pub fn from_env() -> Result<Self, EdgeError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let base_url = env::var("SERVICE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        let api_key = env::var("APIKEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(EdgeError::MissingBinding("APIKEY"))?;

        Ok(Self::new(base_url, api_key))
    }

    /// Create config with explicit values
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Full URL of an upstream endpoint, without the api key
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
