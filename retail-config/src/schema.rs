//! Strongly typed configuration schemas.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use retail_adapters::gemini::{DEFAULT_GEMINI_MODEL, GeminiAdapter, GeminiConfig};
use retail_adapters::ollama::{OllamaAdapter, OllamaConfig};
use retail_adapters::traits::ModelAdapter;
use retail_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, ConfigResult};

/// Model used with [`Provider::Ollama`] when none is configured.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generative backend selection.
    pub backend: BackendConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad setting.
    pub fn validate(&self) -> ConfigResult<()> {
        self.backend.validate()
    }
}

/// Supported generative backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini over HTTPS.
    #[default]
    Gemini,
    /// A local Ollama daemon.
    Ollama,
}

impl Provider {
    /// Lowercase provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    /// Model used when the configuration names none.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_GEMINI_MODEL,
            Self::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "googleai" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown provider `{other}` (expected gemini or ollama)")),
        }
    }
}

/// Backend connection settings.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackendConfig {
    /// Which backend to call.
    pub provider: Provider,
    /// Model identifier; falls back to [`Provider::default_model`].
    pub model: Option<String>,
    /// Overrides the provider's base URL.
    pub base_url: Option<String>,
    /// Per-call transport timeout. Unset means no timeout.
    pub timeout_secs: Option<u64>,
    /// Default sampling temperature.
    pub temperature: Option<f32>,
    /// Gemini API key. Never serialised.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl BackendConfig {
    /// The configured model, or the provider default.
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Transport timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero timeout, a temperature
    /// outside `[0, 2]` or a blank model name.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::invalid("timeout-secs must be greater than zero"));
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::invalid(format!(
                    "temperature must be within [0, 2] (got {temperature})"
                )));
            }
        }
        if self.model.as_deref().is_some_and(|model| model.trim().is_empty()) {
            return Err(ConfigError::invalid("model must not be blank"));
        }
        Ok(())
    }

    /// Builds the adapter described by this configuration.
    ///
    /// For Gemini without an explicit key, `GEMINI_API_KEY` and then
    /// `GOOGLE_API_KEY` are consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when [`Self::validate`] fails and
    /// [`ConfigError::Adapter`] when the adapter rejects the settings, for
    /// instance a missing API key or malformed base URL.
    pub fn build_adapter(&self) -> ConfigResult<Arc<dyn ModelAdapter>> {
        self.validate()?;
        let model = self.model();

        let adapter: Arc<dyn ModelAdapter> = match self.provider {
            Provider::Gemini => {
                let mut config = GeminiConfig::from_env(model);
                if let Some(key) = &self.api_key {
                    config = config.with_api_key(key.clone());
                }
                if let Some(url) = &self.base_url {
                    config = config.with_base_url(url)?;
                }
                if let Some(temperature) = self.temperature {
                    config = config.with_default_temperature(temperature);
                }
                if let Some(timeout) = self.timeout() {
                    config = config.with_timeout(timeout);
                }
                Arc::new(GeminiAdapter::new(config)?)
            }
            Provider::Ollama => {
                let mut config = OllamaConfig::new(model);
                if let Some(url) = &self.base_url {
                    config = config.with_base_url(url)?;
                }
                if let Some(temperature) = self.temperature {
                    config = config.with_default_temperature(temperature);
                }
                if let Some(timeout) = self.timeout() {
                    config = config.with_timeout(timeout);
                }
                Arc::new(OllamaAdapter::new(config)?)
            }
        };

        info!(provider = %self.provider, model, "backend adapter ready");
        Ok(adapter)
    }
}
