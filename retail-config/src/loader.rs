//! Configuration loader implementations.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::AppConfig;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "retail-ops.yml";

const ENV_BACKEND: &str = "RETAIL_BACKEND";
const ENV_MODEL: &str = "RETAIL_MODEL";
const ENV_BASE_URL: &str = "RETAIL_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "RETAIL_TIMEOUT_SECS";
const ENV_TEMPERATURE: &str = "RETAIL_TEMPERATURE";
const ENV_LOG: &str = "RETAIL_LOG";
const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

#[derive(Debug)]
enum EnvSource {
    Process,
    Fixed(HashMap<String, String>),
}

/// Builds an [`AppConfig`] from defaults, a YAML file and the environment.
///
/// Later layers win. Recognised variables are `RETAIL_BACKEND`,
/// `RETAIL_MODEL`, `RETAIL_BASE_URL`, `RETAIL_TIMEOUT_SECS`,
/// `RETAIL_TEMPERATURE`, `RETAIL_LOG` and `GEMINI_API_KEY`. Blank values are
/// ignored.
#[derive(Debug)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    discover: bool,
    env: EnvSource,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment and `./retail-ops.yml` if present.
    #[must_use]
    pub fn new() -> Self {
        Self {
            file: None,
            discover: true,
            env: EnvSource::Process,
        }
    }

    /// Reads settings from `path`, which must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skips looking for [`DEFAULT_CONFIG_FILE`] in the working directory.
    #[must_use]
    pub fn without_discovery(mut self) -> Self {
        self.discover = false;
        self
    }

    /// Replaces the process environment with a fixed set of variables.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = EnvSource::Fixed(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Resolves every layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] for file
    /// problems, [`ConfigError::InvalidEnv`] for malformed overrides and
    /// [`ConfigError::Invalid`] when the merged result is out of range.
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let mut config = match self.config_file() {
            Some(path) => read_file(&path)?,
            None => {
                debug!("no config file found, using defaults");
                AppConfig::default()
            }
        };
        self.apply_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.file {
            return Some(path.clone());
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        (self.discover && local.is_file()).then_some(local)
    }

    fn apply_env(&self, config: &mut AppConfig) -> ConfigResult<()> {
        let backend = &mut config.backend;
        if let Some(provider) = self.parsed(ENV_BACKEND)? {
            backend.provider = provider;
        }
        if let Some(model) = self.var(ENV_MODEL) {
            backend.model = Some(model);
        }
        if let Some(url) = self.var(ENV_BASE_URL) {
            backend.base_url = Some(url);
        }
        if let Some(secs) = self.parsed(ENV_TIMEOUT_SECS)? {
            backend.timeout_secs = Some(secs);
        }
        if let Some(temperature) = self.parsed(ENV_TEMPERATURE)? {
            backend.temperature = Some(temperature);
        }
        if let Some(key) = self.var(ENV_GEMINI_API_KEY) {
            backend.api_key = Some(key);
        }
        if let Some(filter) = self.var(ENV_LOG) {
            config.telemetry.filter = filter;
        }
        Ok(())
    }

    fn var(&self, name: &str) -> Option<String> {
        let value = match &self.env {
            EnvSource::Process => env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        };
        value.filter(|value| !value.trim().is_empty())
    }

    fn parsed<T>(&self, name: &'static str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: ToString,
    {
        let Some(raw) = self.var(name) else {
            return Ok(None);
        };
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigError::InvalidEnv {
                var: name,
                reason: err.to_string(),
                value: raw,
            })
    }
}

fn read_file(path: &Path) -> ConfigResult<AppConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })?;
    info!(path = %path.display(), "loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::schema::Provider;

    fn yaml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn isolated() -> ConfigLoader {
        ConfigLoader::new()
            .without_discovery()
            .with_env_vars(Vec::<(String, String)>::new())
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = isolated().load().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend.provider, Provider::Gemini);
        assert_eq!(config.backend.timeout(), None);
    }

    #[test]
    fn file_then_env_layering() {
        let file = yaml(
            "backend:\n  provider: ollama\n  model: llama3.1\n  timeout-secs: 20\ntelemetry:\n  filter: warn\n",
        );
        let config = isolated()
            .with_file(file.path())
            .with_env_vars([("RETAIL_MODEL", "mistral"), ("RETAIL_TEMPERATURE", "0.3")])
            .load()
            .unwrap();

        assert_eq!(config.backend.provider, Provider::Ollama);
        assert_eq!(config.backend.model(), "mistral");
        assert_eq!(config.backend.timeout_secs, Some(20));
        assert_eq!(config.backend.temperature, Some(0.3));
        assert_eq!(config.telemetry.filter, "warn");
    }

    #[test]
    fn env_selects_backend_and_key() {
        let config = isolated()
            .with_env_vars([
                ("RETAIL_BACKEND", "ollama"),
                ("RETAIL_BASE_URL", "http://10.0.0.5:11434"),
                ("GEMINI_API_KEY", "abc"),
                ("RETAIL_LOG", "retail_flows=debug"),
            ])
            .load()
            .unwrap();
        assert_eq!(config.backend.provider, Provider::Ollama);
        assert_eq!(config.backend.base_url.as_deref(), Some("http://10.0.0.5:11434"));
        assert_eq!(config.backend.api_key.as_deref(), Some("abc"));
        assert_eq!(config.telemetry.filter, "retail_flows=debug");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = isolated()
            .with_env_vars([("RETAIL_MODEL", "  ")])
            .load()
            .unwrap();
        assert!(config.backend.model.is_none());
    }

    #[test]
    fn malformed_env_value_names_the_variable() {
        let err = isolated()
            .with_env_vars([("RETAIL_TIMEOUT_SECS", "soon")])
            .load()
            .unwrap_err();
        match err {
            ConfigError::InvalidEnv { var, value, .. } => {
                assert_eq!(var, "RETAIL_TIMEOUT_SECS");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = isolated()
            .with_env_vars([("RETAIL_BACKEND", "openai")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "RETAIL_BACKEND", .. }));
    }

    #[test]
    fn out_of_range_temperature_fails_validation() {
        let file = yaml("backend:\n  temperature: 4.0\n");
        let err = isolated().with_file(file.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let err = isolated()
            .with_file("/definitely/not/here/retail-ops.yml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = yaml("backend:\n  provider: [gemini\n");
        let err = isolated().with_file(file.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = yaml("\n");
        let config = isolated().with_file(file.path()).load().unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
