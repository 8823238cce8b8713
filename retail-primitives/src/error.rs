//! Shared error definitions for retail primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used by the primitive types.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive values.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided invocation identifier could not be parsed.
    #[error("invalid invocation id: {source}")]
    InvalidInvocationId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// A `data:` URI failed structural validation.
    #[error("invalid data uri: {reason}")]
    InvalidDataUri {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A disposition string was outside the closed set.
    #[error("unknown disposition `{value}` (expected resale, donation, or liquidation)")]
    UnknownDisposition {
        /// The rejected value.
        value: String,
    },
}
