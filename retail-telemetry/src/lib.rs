//! Observability setup for retail operations binaries.
//!
//! Libraries in this workspace only emit `tracing` spans and events; a
//! binary calls [`init_tracing`] once at startup to install a subscriber.

#![warn(missing_docs, clippy::pedantic)]

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Output layout of the fmt subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-field default layout.
    #[default]
    Full,
    /// Single-line layout.
    Compact,
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TelemetryConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// Whether events print their target module.
    pub with_target: bool,
    /// Output layout.
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            with_target: false,
            format: LogFormat::Full,
        }
    }
}

impl TelemetryConfig {
    /// Replaces the filter directives.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Toggles target display.
    #[must_use]
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directives could not be parsed.
    #[error("invalid log filter `{directives}`: {source}")]
    InvalidFilter {
        /// Directives as supplied.
        directives: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },

    /// A global subscriber was already set.
    #[error("tracing subscriber already installed: {reason}")]
    AlreadyInstalled {
        /// Underlying error text.
        reason: String,
    },
}

/// Installs the global fmt subscriber.
///
/// `RUST_LOG`, when set and non-blank, takes precedence over
/// [`TelemetryConfig::filter`].
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for unparsable directives and
/// [`TelemetryError::AlreadyInstalled`] when called more than once.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let from_env = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, from_env.as_deref())?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);
    let installed = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|err| TelemetryError::AlreadyInstalled {
        reason: err.to_string(),
    })?;

    debug!(filter = %config.filter, "tracing initialised");
    Ok(())
}

fn build_filter(
    config: &TelemetryConfig,
    env_override: Option<&str>,
) -> Result<EnvFilter, TelemetryError> {
    let directives = env_override
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(&config.filter);
    EnvFilter::try_new(directives).map_err(|source| TelemetryError::InvalidFilter {
        directives: directives.to_owned(),
        source,
    })
}
