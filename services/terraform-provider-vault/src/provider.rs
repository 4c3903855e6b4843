//! The `vault` provider.

use crate::config::ProviderConfig;
use crate::data_source::kv_secret::KvSecretDataSource;
use crate::error::ProviderError;
use crate::session::ClientSession;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::ValueEmpty;
use tf_provider::{Diagnostics, DynamicDataSource, Provider, map};
use tracing::{info, instrument, warn};
use vault_kv_client::VaultClient;

/// Provider type name; the host prefixes data source names with it.
pub const PROVIDER_NAME: &str = "vault";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Vault provider holding the client session handed to every data source.
#[derive(Clone)]
pub struct VaultProvider {
    version: String,
    session: ClientSession,
    env: EnvLookup,
}

impl VaultProvider {
    /// Provider reading fallbacks from the process environment.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            session: ClientSession::new(),
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the environment lookup used for attribute fallbacks.
    #[must_use]
    pub fn with_env_lookup<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    /// Provider build version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Session shared with the data sources.
    #[must_use]
    pub const fn session(&self) -> &ClientSession {
        &self.session
    }

    async fn connect(&self, config: &ProviderConfig<'_>) -> Result<(), ProviderError> {
        let vault_config = config.resolve(|key| (self.env)(key))?;
        let client = VaultClient::new(vault_config)?;

        let token = client.lookup_self().await?;
        info!(
            address = %client.config().base_url(),
            namespace = ?client.config().namespace,
            display_name = %token.display_name,
            accessor = %token.accessor,
            policies = ?token.policies,
            ttl_secs = token.ttl,
            renewable = token.renewable,
            "Vault token verified"
        );

        self.session.install(Arc::new(client))
    }
}

impl fmt::Debug for VaultProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultProvider")
            .field("version", &self.version)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for VaultProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                description: Description::plain("HashiCorp Vault KV version 2 secrets"),
                attributes: map! {
                    "address" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "URL of the Vault server, defaults to VAULT_ADDR",
                        ),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "token" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "Token used to authenticate with Vault, defaults to VAULT_TOKEN",
                        ),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "namespace" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "Vault namespace used by default, defaults to VAULT_NAMESPACE",
                        ),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        for err in config.check_known() {
            err.report(diags);
        }
        Some(())
    }

    #[instrument(skip_all, fields(terraform_version = %terraform_version))]
    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        match self.connect(&config).await {
            Ok(()) => {
                info!(provider_version = %self.version, "Provider configured");
                Some(())
            }
            Err(err) => {
                warn!(error = %err, "Provider configuration failed");
                err.report(diags);
                None
            }
        }
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {
            "kv_secret" => KvSecretDataSource::new(self.session.clone()),
        })
    }
}
