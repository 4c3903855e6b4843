//! Vault provider plugin binary.

use anyhow::Result;
use rust_common::{LogFormat, TracingConfig, init_tracing};
use terraform_provider_vault::{PROVIDER_NAME, VaultProvider};
use tracing::info;

/// When set, `tf_provider::serve` installs its own subscriber writing there.
const PLUGIN_LOG_FILE: &str = "PLUGIN_LOG_FILE";
const LOG_JSON: &str = "TF_PROVIDER_VAULT_LOG_JSON";

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var_os(PLUGIN_LOG_FILE).is_none() {
        let format = LogFormat::from_flag(std::env::var(LOG_JSON).ok().as_deref());
        init_tracing(&TracingConfig::new(env!("CARGO_PKG_NAME")).with_format(format))?;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Vault provider");

    tf_provider::serve(PROVIDER_NAME, VaultProvider::new(env!("CARGO_PKG_VERSION"))).await
}
