//! Shared backend traits and request/response types.

use std::time::Duration;

use async_trait::async_trait;
use retail_primitives::ImageDataUri;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result alias used by model adapters.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Error type shared by adapter implementations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Adapter is misconfigured or missing credentials.
    #[error("adapter not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// The supplied request was invalid for the target model.
    #[error("invalid generation request: {reason}")]
    InvalidRequest {
        /// Reason describing why the request could not be processed.
        reason: String,
    },

    /// Transport-level failures (network, protocol, timeouts).
    #[error("adapter transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The provider rejected the request due to rate limiting.
    #[error("adapter rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Suggested delay before retrying, when the provider sent one.
        retry_after: Option<Duration>,
    },

    /// The provider returned a non-success status or an undecodable envelope.
    #[error("adapter response error: {reason}")]
    Response {
        /// Additional context about the response failure.
        reason: String,
    },
}

impl AdapterError {
    /// Convenience constructor for invalid requests.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for response failures.
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }
}

/// Minimal metadata describing a model adapter instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterMetadata {
    provider: &'static str,
    model: String,
}

impl AdapterMetadata {
    /// Creates metadata for the supplied provider and model identifier.
    #[must_use]
    pub fn new(provider: &'static str, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Returns the provider identifier (e.g., "gemini").
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Binary media attached to a prompt, carried as base64.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MediaPart {
    mime_type: String,
    data: String,
}

impl MediaPart {
    /// Creates a media part from a MIME type and base64 data.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Declared MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 encoded bytes.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl From<&ImageDataUri> for MediaPart {
    fn from(uri: &ImageDataUri) -> Self {
        Self::new(uri.mime_type(), uri.base64_payload())
    }
}

/// JSON schema the backend is instructed to conform its response to.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct OutputContract {
    name: String,
    schema: Value,
}

impl OutputContract {
    /// Creates a named contract.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Contract name, used in logs and provider payloads that want one.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The JSON schema document.
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

/// Request submitted to a model adapter.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    media: Vec<MediaPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contract: Option<OutputContract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl GenerationRequest {
    /// Creates a request for the rendered prompt text.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRequest`] if the prompt is blank.
    pub fn new(prompt: impl Into<String>) -> AdapterResult<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(AdapterError::invalid_request(
                "generation request requires a non-empty prompt",
            ));
        }

        Ok(Self {
            prompt,
            media: Vec::new(),
            contract: None,
            max_output_tokens: None,
            temperature: None,
        })
    }

    /// Attaches a media part.
    #[must_use]
    pub fn with_media(mut self, part: MediaPart) -> Self {
        self.media.push(part);
        self
    }

    /// Sets the structured-output contract.
    #[must_use]
    pub fn with_contract(mut self, contract: OutputContract) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Sets the maximum output token budget.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Returns the prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the attached media parts.
    #[must_use]
    pub fn media(&self) -> &[MediaPart] {
        &self.media
    }

    /// Returns the structured-output contract, if any.
    #[must_use]
    pub fn contract(&self) -> Option<&OutputContract> {
        self.contract.as_ref()
    }

    /// Returns the configured maximum output tokens.
    #[must_use]
    pub const fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }

    /// Returns the configured sampling temperature.
    #[must_use]
    pub const fn temperature(&self) -> Option<f32> {
        self.temperature
    }
}

/// Response returned by an adapter.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GenerationResponse {
    text: Option<String>,
}

impl GenerationResponse {
    /// Response carrying generated text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Response where the backend produced no candidate output.
    #[must_use]
    pub const fn empty() -> Self {
        Self { text: None }
    }

    /// Generated text, if the backend produced any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Consumes the response, returning the generated text.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        self.text
    }
}

/// Trait implemented by all generative text backends.
///
/// Calls are independent: implementations must not carry per-request state
/// between invocations.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Returns basic metadata describing the adapter instance.
    fn metadata(&self) -> &AdapterMetadata;

    /// Sends one prompt and returns the backend's answer.
    async fn generate(&self, request: GenerationRequest) -> AdapterResult<GenerationResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_blank_prompt() {
        let err = GenerationRequest::new("   ").expect_err("prompt required");
        assert!(matches!(err, AdapterError::InvalidRequest { .. }));
    }

    #[test]
    fn builds_request() {
        let request = GenerationRequest::new("price this")
            .unwrap()
            .with_media(MediaPart::new("image/png", "AAAA"))
            .with_contract(OutputContract::new("pricing", json!({"type": "object"})))
            .with_max_output_tokens(256)
            .with_temperature(0.2);

        assert_eq!(request.prompt(), "price this");
        assert_eq!(request.media().len(), 1);
        assert_eq!(request.contract().map(OutputContract::name), Some("pricing"));
        assert_eq!(request.max_output_tokens(), Some(256));
        assert_eq!(request.temperature(), Some(0.2));
    }

    #[test]
    fn media_part_from_data_uri() {
        let uri = ImageDataUri::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        let part = MediaPart::from(&uri);
        assert_eq!(part.mime_type(), "image/jpeg");
        assert_eq!(part.data(), "/9j/4AAQ");
    }

    #[test]
    fn empty_response_has_no_text() {
        assert_eq!(GenerationResponse::empty().as_text(), None);
        assert_eq!(GenerationResponse::text("{}").into_text().as_deref(), Some("{}"));
    }
}
