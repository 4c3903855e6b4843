//! Shared library for cross-cutting concerns in the Vault provider workspace.
//!
//! This crate provides centralized implementations for:
//! - Error types shared by the client libraries
//! - HTTP client configuration and building
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
