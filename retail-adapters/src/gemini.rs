//! Google Gemini adapter with JSON-mode structured output.

use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use hyper::Uri;
use hyper::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::http_client::{HyperClient, JsonPost, build_https_client, sanitize_base_url};
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, GenerationRequest, GenerationResponse,
    MediaPart, ModelAdapter,
};

/// Environment variable checked first for the API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Fallback environment variable for the API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Model used when the configuration does not name one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Schema keywords Gemini's `responseSchema` understands.
const SCHEMA_KEYWORDS: &[&str] = &[
    "type",
    "format",
    "description",
    "nullable",
    "enum",
    "properties",
    "required",
    "items",
    "minimum",
    "maximum",
];

/// Configuration for the Gemini adapter.
///
/// `Debug` output never includes the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Option<Duration>,
    default_temperature: Option<f32>,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("default_temperature", &self.default_temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GeminiConfig {
    /// Creates a configuration using the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com/".to_owned(),
            timeout: None,
            default_temperature: None,
        }
    }

    /// Loads the API key from `GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`.
    #[must_use]
    pub fn from_env(model: impl Into<String>) -> Self {
        let mut cfg = Self::new(model);
        cfg.api_key = env::var(GEMINI_API_KEY_ENV)
            .or_else(|_| env::var(GOOGLE_API_KEY_ENV))
            .ok();
        cfg
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        self.base_url = sanitize_base_url("Gemini", base_url.as_ref())?;
        Ok(self)
    }

    /// Sets the default sampling temperature used when requests omit it.
    #[must_use]
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = Some(temperature);
        self
    }

    /// Bounds each HTTP call. Unset means the call may wait indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Gemini adapter that calls the `generateContent` API over HTTPS.
pub struct GeminiAdapter {
    client: HyperClient,
    endpoint: Uri,
    metadata: AdapterMetadata,
    api_key: HeaderValue,
    timeout: Option<Duration>,
    default_temperature: Option<f32>,
}

impl fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiAdapter {
    /// Constructs a new adapter with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the API key is missing or
    /// the endpoint cannot be formed.
    pub fn new(config: GeminiConfig) -> AdapterResult<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| AdapterError::configuration("Gemini adapter requires an API key"))?;
        let mut api_key = HeaderValue::from_str(&api_key).map_err(|_| {
            AdapterError::configuration("Gemini API key contains invalid header characters")
        })?;
        api_key.set_sensitive(true);

        let endpoint = format!(
            "{}v1beta/models/{}:generateContent",
            config.base_url, config.model
        )
        .parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid Gemini endpoint: {err}")))?;

        Ok(Self {
            client: build_https_client(),
            endpoint,
            metadata: AdapterMetadata::new("gemini", config.model),
            api_key,
            timeout: config.timeout,
            default_temperature: config.default_temperature,
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::Text {
            text: request.prompt().to_owned(),
        }];
        parts.extend(request.media().iter().map(map_media_part));

        let contract = request.contract();
        let generation_config = GenerationConfig {
            temperature: request.temperature().or(self.default_temperature),
            max_output_tokens: request.max_output_tokens(),
            response_mime_type: contract.map(|_| "application/json".to_owned()),
            response_schema: contract.map(|c| to_gemini_schema(c.schema())),
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_owned(),
                parts,
            }],
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
        }
    }
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn generate(&self, request: GenerationRequest) -> AdapterResult<GenerationResponse> {
        let payload = self.build_request(&request);

        let bytes = JsonPost {
            provider: "Gemini",
            endpoint: &self.endpoint,
            headers: vec![(HeaderName::from_static(API_KEY_HEADER), self.api_key.clone())],
            timeout: self.timeout,
        }
        .send(&self.client, &payload)
        .await?;

        let response: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|err| AdapterError::response(format!("failed to decode Gemini response: {err}")))?;

        extract_text(response)
    }
}

fn extract_text(response: GenerateContentResponse) -> AdapterResult<GenerationResponse> {
    if response.candidates.is_empty() {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AdapterError::response(format!(
                "Gemini blocked the prompt: {reason}"
            )));
        }
        return Ok(GenerationResponse::empty());
    }

    let text: Vec<String> = response
        .candidates
        .into_iter()
        .take(1)
        .filter_map(|candidate| {
            if candidate.content.is_none() {
                warn!(finish_reason = ?candidate.finish_reason, "Gemini candidate has no content");
            }
            candidate.content
        })
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        Ok(GenerationResponse::empty())
    } else {
        Ok(GenerationResponse::text(text.concat()))
    }
}

/// Rewrites a JSON schema into the OpenAPI subset Gemini accepts: type names
/// are upper-cased and unsupported keywords are dropped.
fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                if !SCHEMA_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                let converted = match (key.as_str(), value) {
                    ("type", Value::String(kind)) => Value::String(kind.to_ascii_uppercase()),
                    ("properties", Value::Object(props)) => Value::Object(
                        props
                            .iter()
                            .map(|(name, prop)| (name.clone(), to_gemini_schema(prop)))
                            .collect(),
                    ),
                    ("items", items) => to_gemini_schema(items),
                    _ => value.clone(),
                };
                out.insert(key.clone(), converted);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.max_output_tokens.is_none()
            && self.response_mime_type.is_none()
            && self.response_schema.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn map_media_part(part: &MediaPart) -> Part {
    Part::Inline {
        inline_data: Blob {
            mime_type: part.mime_type().to_owned(),
            data: part.data().to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::OutputContract;
    use serde_json::json;

    fn adapter() -> GeminiAdapter {
        GeminiAdapter::new(GeminiConfig::new(DEFAULT_GEMINI_MODEL).with_api_key("test_key"))
            .expect("adapter")
    }

    #[test]
    fn config_debug_redacts_api_key() {
        let config = GeminiConfig::new(DEFAULT_GEMINI_MODEL).with_api_key("sk-secret-123");
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret-123"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains(DEFAULT_GEMINI_MODEL));
    }

    #[test]
    fn requires_api_key() {
        let err = GeminiAdapter::new(GeminiConfig::new(DEFAULT_GEMINI_MODEL)).expect_err("key");
        assert!(matches!(err, AdapterError::Configuration { .. }));
    }

    #[test]
    fn sanitize_allows_trailing_slash() {
        let cfg = GeminiConfig::new(DEFAULT_GEMINI_MODEL)
            .with_base_url("https://example.com/gemini")
            .expect("valid URL");
        assert_eq!(cfg.base_url, "https://example.com/gemini/");
    }

    #[test]
    fn endpoint_names_model() {
        let adapter = adapter();
        assert!(
            adapter
                .endpoint
                .to_string()
                .ends_with("v1beta/models/gemini-2.0-flash:generateContent")
        );
    }

    #[test]
    fn build_request_attaches_media_after_text() {
        let request = GenerationRequest::new("route this return")
            .unwrap()
            .with_media(MediaPart::new("image/png", "AAAA"));

        let payload = serde_json::to_value(adapter().build_request(&request)).unwrap();
        let parts = &payload["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "route this return");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "AAAA");
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn build_request_sets_json_mode_for_contract() {
        let schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "disposition": {"type": "string", "enum": ["resale", "donation", "liquidation"]}
            },
            "required": ["disposition"]
        });
        let request = GenerationRequest::new("route")
            .unwrap()
            .with_contract(OutputContract::new("returnRouter", schema))
            .with_temperature(0.1);

        let payload = serde_json::to_value(adapter().build_request(&request)).unwrap();
        let config = &payload["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        assert!(config["responseSchema"].get("additionalProperties").is_none());
        assert_eq!(
            config["responseSchema"]["properties"]["disposition"]["type"],
            "STRING"
        );
        assert_eq!(config["temperature"], json!(0.1_f32));
    }

    #[test]
    fn schema_conversion_recurses_into_items() {
        let converted = to_gemini_schema(&json!({
            "type": "array",
            "items": {"type": "number", "$comment": "dropped"}
        }));
        assert_eq!(converted, json!({"type": "ARRAY", "items": {"type": "NUMBER"}}));
    }

    #[test]
    fn extracts_first_candidate_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();

        let text = extract_text(response).unwrap();
        assert_eq!(text.as_text(), Some("{\"a\":1}"));
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        let err = extract_text(response).expect_err("blocked");
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn candidate_without_content_is_empty() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), GenerationResponse::empty());
    }
}
