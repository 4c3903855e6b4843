//! Pooled HTTP client construction for the workspace's REST clients.

use crate::error::PlatformError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Whole-request deadline applied when callers do not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// TCP connect deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_USER_AGENT: &str = concat!("terraform-provider-vault/", env!("CARGO_PKG_VERSION"));

/// Settings for [`build_http_client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Request timeout, 30s unless overridden
    pub timeout: Duration,
    /// Connect timeout, 10s unless overridden
    pub connect_timeout: Duration,
    /// Idle connections kept per host
    pub max_idle_per_host: usize,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_idle_per_host: 4,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Build a JSON-speaking client using rustls.
///
/// The returned client is cheap to clone and shares its connection pool.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidInput`] for a user agent that is not a valid
/// header value and [`PlatformError::Http`] if the TLS backend fails to start.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, PlatformError> {
    if config.timeout.is_zero() {
        return Err(PlatformError::invalid_input("request timeout must be non-zero"));
    }

    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| PlatformError::invalid_input(format!("user agent: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(config.max_idle_per_host)
        .user_agent(user_agent)
        .default_headers(headers)
        .use_rustls_tls()
        .build()?;

    Ok(client)
}
