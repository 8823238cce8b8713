//! Configuration management for retail operations.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! environment variables. The resulting [`AppConfig`] selects and builds the
//! generative backend used by every flow.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE};
pub use schema::{AppConfig, BackendConfig, DEFAULT_OLLAMA_MODEL, Provider};
