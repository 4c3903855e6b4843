//! Provider errors and their mapping onto Terraform diagnostics.

use thiserror::Error;
use tf_provider::{AttributePath, Diagnostics};
use vault_kv_client::VaultError;

/// Errors raised while configuring the provider or serving a data source.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No address in configuration or `VAULT_ADDR`
    #[error("Vault address is not set. Set the `address` attribute or the VAULT_ADDR environment variable.")]
    MissingAddress,

    /// No token in configuration or `VAULT_TOKEN`
    #[error("Vault token is not set. Set the `token` attribute or the VAULT_TOKEN environment variable.")]
    MissingToken,

    /// Attribute depends on a value only known after apply
    #[error("The `{0}` attribute depends on a value that is not known yet. Set it statically or use -target to apply its dependencies first.")]
    UnknownValue(&'static str),

    /// Address is not an http/https URL
    #[error("{0}")]
    InvalidAddress(String),

    /// A data source ran before `configure` installed a client
    #[error("The provider has not been configured with a Vault client.")]
    NotConfigured,

    /// `configure` ran twice in the same process
    #[error("The provider was already configured in this process.")]
    AlreadyConfigured,

    /// Vault client failure
    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl ProviderError {
    /// Short diagnostic title.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::MissingAddress | Self::InvalidAddress(_) => "Invalid Vault address",
            Self::MissingToken => "Missing Vault token",
            Self::UnknownValue(_) => "Unknown provider configuration value",
            Self::NotConfigured => "Provider not configured",
            Self::AlreadyConfigured => "Provider already configured",
            Self::Vault(VaultError::AuthenticationFailed(_) | VaultError::PermissionDenied(_)) => {
                "Vault authentication failed"
            }
            Self::Vault(_) => "Unable to create Vault client",
        }
    }

    /// Configuration attribute the error points at, if any.
    #[must_use]
    pub const fn attribute(&self) -> Option<&'static str> {
        match self {
            Self::MissingAddress | Self::InvalidAddress(_) => Some("address"),
            Self::MissingToken | Self::Vault(VaultError::AuthenticationFailed(_)) => Some("token"),
            Self::UnknownValue(attribute) => Some(*attribute),
            _ => None,
        }
    }

    /// Append this error to `diags` under its own summary.
    pub fn report(&self, diags: &mut Diagnostics) {
        self.report_as(diags, self.summary());
    }

    /// Append this error to `diags` under `summary`.
    pub fn report_as(&self, diags: &mut Diagnostics, summary: &'static str) {
        let detail = self.to_string();
        match self.attribute() {
            Some(attribute) => diags.error(summary, detail, AttributePath::new(attribute)),
            None => diags.root_error(summary, detail),
        }
    }
}
