//! HashiCorp Vault KV version 2 client.
//!
//! Provides a static-token client session, secret reads by mount and name,
//! and the [`KvReader`] trait consumers depend on instead of the concrete
//! HTTP client.

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod secrets;

pub use client::VaultClient;
pub use config::VaultConfig;
pub use error::{VaultError, VaultResult};
pub use provider::{KvReader, KvSecret, KvSecretRequest, KvVersionMetadata, kv_v2_data_path};
pub use secrets::TokenInfo;
