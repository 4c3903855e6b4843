//! Data sources registered by the provider.

pub mod kv_secret;
