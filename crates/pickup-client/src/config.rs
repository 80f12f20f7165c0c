//! Configuration for PickupClient.

use std::env;
use std::time::Duration;

use pickup_core::ApiError;

/// API root used when `PICKUP_API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Requests that take longer than this fail with [`ApiError::Timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to the pickup line backend.
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, e.g. "http://localhost:5000/api".
    pub base_url: String,
    /// Bearer token attached to every request when set.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the given base URL and no token.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `PICKUP_API_URL` - API root (default: http://localhost:5000/api)
    /// - `PICKUP_API_TOKEN` - Bearer token from a previous login
    /// - `PICKUP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url =
            env::var("PICKUP_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let token = env::var("PICKUP_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let timeout = env::var("PICKUP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let mut config = Self::new(base_url);
        config.token = token;
        config.timeout = timeout;
        config.validate()?;
        Ok(config)
    }

    /// Create a new config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check that the base URL is usable.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::Config("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Absolute URL for an API path such as "/history/".
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
