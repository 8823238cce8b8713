//! Generative retail operations SDK facade.
//!
//! Bundles the workspace crates behind feature flags. Most callers only need
//! [`flows`] plus a backend from [`adapters`] or [`config`].

#![warn(missing_docs, clippy::pedantic)]

/// Shared primitives: dispositions, image data URIs, field violations.
pub use retail_primitives as primitives;

/// The structured prompt invoker and the three retail flows (enabled by `flows` feature).
#[cfg(feature = "flows")]
pub use retail_flows as flows;

/// Generative backends (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use retail_adapters as adapters;

/// Prompt templates (enabled by `prompts` feature).
#[cfg(feature = "prompts")]
pub use retail_prompts as prompts;

/// Layered configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use retail_config as config;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use retail_telemetry as telemetry;
