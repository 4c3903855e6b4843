//! Client session shared between the provider and its data sources.

use crate::error::ProviderError;
use std::fmt;
use std::sync::{Arc, OnceLock};
use vault_kv_client::KvReader;

/// Write-once slot holding the Vault client.
///
/// The provider installs the client during `configure`; data sources hold
/// clones of the session and read the client lock-free afterwards.
#[derive(Clone, Default)]
pub struct ClientSession {
    client: Arc<OnceLock<Arc<dyn KvReader>>>,
}

impl ClientSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AlreadyConfigured`] if a client is already installed.
    pub fn install(&self, client: Arc<dyn KvReader>) -> Result<(), ProviderError> {
        self.client
            .set(client)
            .map_err(|_| ProviderError::AlreadyConfigured)
    }

    /// Installed client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] before [`Self::install`].
    pub fn client(&self) -> Result<Arc<dyn KvReader>, ProviderError> {
        self.client.get().cloned().ok_or(ProviderError::NotConfigured)
    }

    /// Whether a client has been installed.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client.get().is_some()
    }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("configured", &self.is_configured())
            .finish()
    }
}
