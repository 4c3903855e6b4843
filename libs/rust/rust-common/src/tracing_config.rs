//! Tracing subscriber initialisation.
//!
//! Plugin binaries own stdout for the host handshake, so every layer built
//! here writes to stderr.

use crate::error::PlatformError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Event rendering on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines without ANSI colours
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// `Json` when `flag` is `"1"` or `"true"`, `Text` otherwise.
    #[must_use]
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some("1" | "true") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Recorded on the initialisation event
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset
    pub default_directive: String,
    /// Output format
    pub format: LogFormat,
}

impl TracingConfig {
    /// Text output at `info` for `service_name`.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            default_directive: "info".to_string(),
            format: LogFormat::Text,
        }
    }

    /// Replace the fallback filter directive.
    #[must_use]
    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    /// Select the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn filter(&self) -> Result<EnvFilter, PlatformError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive).map_err(|e| {
                PlatformError::invalid_input(format!("log filter `{}`: {e}", self.default_directive))
            }),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidInput`] for an unparsable fallback directive
/// and [`PlatformError::Internal`] if a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), PlatformError> {
    let registry = tracing_subscriber::registry().with(config.filter()?);
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Text => registry.with(layer).try_init(),
    }
    .map_err(|e| PlatformError::internal(e.to_string()))?;

    tracing::debug!(service = %config.service_name, format = ?config.format, "Tracing initialised");
    Ok(())
}
