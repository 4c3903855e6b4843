//! Provider configuration as declared in the `provider "vault"` block.
//!
//! Null attributes fall back to the environment variables the Vault CLI
//! reads. Resolution takes the environment lookup as a closure so it can be
//! exercised without touching the process environment.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tf_provider::value::{Value, ValueString};
use vault_kv_client::{VaultConfig, VaultError, config::validate_address};

/// Environment fallback for `address`.
pub const ENV_ADDRESS: &str = "VAULT_ADDR";
/// Environment fallback for `token`.
pub const ENV_TOKEN: &str = "VAULT_TOKEN";
/// Environment fallback for `namespace`.
pub const ENV_NAMESPACE: &str = "VAULT_NAMESPACE";

/// Provider block attributes.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    /// Vault server address
    pub address: ValueString<'a>,
    /// Static token, sensitive
    pub token: ValueString<'a>,
    /// Default namespace for every request
    pub namespace: ValueString<'a>,
}

impl<'a> ProviderConfig<'a> {
    /// Build a fully known configuration.
    #[must_use]
    pub fn new(
        address: impl Into<Cow<'a, str>>,
        token: impl Into<Cow<'a, str>>,
        namespace: Option<Cow<'a, str>>,
    ) -> Self {
        Self {
            address: Value::Value(address.into()),
            token: Value::Value(token.into()),
            namespace: namespace.into(),
        }
    }

    /// Check the values already known at validation time.
    ///
    /// Unknown and null values are accepted here; [`Self::resolve`] decides
    /// about them once the environment is consulted.
    #[must_use]
    pub fn check_known(&self) -> Vec<ProviderError> {
        let mut errors = Vec::new();

        if let Value::Value(address) = &self.address {
            if address.trim().is_empty() {
                errors.push(ProviderError::MissingAddress);
            } else if let Err(e) = validate_address(address) {
                errors.push(invalid_address(e));
            }
        }

        if let Value::Value(token) = &self.token {
            if token.trim().is_empty() {
                errors.push(ProviderError::MissingToken);
            }
        }

        errors
    }

    /// Resolve attributes and environment into a client configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an unknown value, a missing or
    /// invalid address, or a missing token.
    pub fn resolve<F>(&self, env: F) -> Result<VaultConfig, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = resolve_attribute(&self.address, "address", ENV_ADDRESS, &env)?
            .ok_or(ProviderError::MissingAddress)?;
        let token = resolve_attribute(&self.token, "token", ENV_TOKEN, &env)?
            .ok_or(ProviderError::MissingToken)?;
        let namespace = resolve_attribute(&self.namespace, "namespace", ENV_NAMESPACE, &env)?;

        validate_address(&address).map_err(invalid_address)?;

        let mut config = VaultConfig::new(address, token);
        if let Some(namespace) = namespace {
            config = config.with_namespace(namespace);
        }
        Ok(config)
    }
}

/// Attribute value, else a non-blank environment value, else `None`.
fn resolve_attribute<F>(
    value: &ValueString<'_>,
    attribute: &'static str,
    env_var: &str,
    env: &F,
) -> Result<Option<String>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    let resolved = match value {
        Value::Unknown => return Err(ProviderError::UnknownValue(attribute)),
        Value::Value(v) => Some(v.to_string()),
        Value::Null => env(env_var),
    };
    Ok(resolved.filter(|v| !v.trim().is_empty()))
}

fn invalid_address(err: VaultError) -> ProviderError {
    match err {
        VaultError::InvalidConfig(msg) => ProviderError::InvalidAddress(msg),
        other => ProviderError::Vault(other),
    }
}

impl fmt::Debug for ProviderConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match &self.token {
            Value::Value(_) => "[REDACTED]",
            Value::Null => "null",
            Value::Unknown => "unknown",
        };
        f.debug_struct("ProviderConfig")
            .field("address", &self.address)
            .field("token", &token)
            .field("namespace", &self.namespace)
            .finish()
    }
}
