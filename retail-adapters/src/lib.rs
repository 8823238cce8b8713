//! Generative text backends used by the prompt layer.
//!
//! Each module exposes an implementation for a specific provider while sharing
//! the [`traits::ModelAdapter`] seam. Adapters return raw response text; turning
//! that text into typed records is the caller's job.

#![warn(missing_docs, clippy::pedantic)]

pub mod gemini;
pub mod ollama;
pub mod traits;

mod http_client;
