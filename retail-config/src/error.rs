use std::path::PathBuf;

use retail_adapters::traits::AdapterError;
use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading configuration or building a backend.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::AppConfig`].
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment override carried an unusable value.
    #[error("invalid value `{value}` for {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A loaded setting is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Description of the problem.
        reason: String,
    },

    /// The backend adapter rejected the configuration.
    #[error("backend configuration rejected: {source}")]
    Adapter {
        /// Adapter error.
        #[from]
        source: AdapterError,
    },
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}
