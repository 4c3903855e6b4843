//! Vault client configuration.

use crate::error::{VaultError, VaultResult};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Default request timeout applied to every Vault call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Vault client configuration.
///
/// The token is kept in a [`SecretString`], so `Debug` output never contains it.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address, e.g. `https://vault.example.com:8200`
    pub address: String,
    /// Static token sent as `X-Vault-Token`
    pub token: SecretString,
    /// Default namespace sent as `X-Vault-Namespace` (Vault Enterprise)
    pub namespace: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl VaultConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: SecretString::from(token.into()),
            namespace: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the default namespace. Blank namespaces are ignored.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.trim().is_empty()).then_some(namespace);
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Address without trailing slashes, ready for `/v1/...` to be appended.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.address.trim_end_matches('/')
    }

    /// Check that the configuration can produce a working client.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] when the token is blank or the
    /// address is not an absolute `http`/`https` URL.
    pub fn validate(&self) -> VaultResult<()> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(VaultError::InvalidConfig("token must not be empty".to_string()));
        }
        validate_address(&self.address)
    }
}

/// Check that `address` is an absolute `http` or `https` URL with a host.
///
/// # Errors
///
/// Returns [`VaultError::InvalidConfig`] describing the problem.
pub fn validate_address(address: &str) -> VaultResult<()> {
    let url = Url::parse(address)
        .map_err(|e| VaultError::InvalidConfig(format!("invalid address {address:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(VaultError::InvalidConfig(format!(
                "unsupported scheme {other:?} in address {address:?}, expected http or https"
            )));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(VaultError::InvalidConfig(format!(
            "address {address:?} has no host"
        )));
    }

    Ok(())
}
