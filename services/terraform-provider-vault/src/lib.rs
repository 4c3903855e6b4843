//! Terraform provider for HashiCorp Vault KV version 2 secrets.
//!
//! Registers one data source, `vault_kv_secret`, backed by a single
//! static-token client session opened when the host configures the provider.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod data_source;
pub mod error;
pub mod provider;
pub mod session;

pub use config::ProviderConfig;
pub use data_source::kv_secret::{KvSecretDataSource, KvSecretMetadata, KvSecretState};
pub use error::ProviderError;
pub use provider::{PROVIDER_NAME, VaultProvider};
pub use session::ClientSession;
